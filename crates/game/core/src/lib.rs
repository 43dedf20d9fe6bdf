//! Deterministic content rules shared by the runtime and the client.
//!
//! `game-core` defines the content definitions loaded from disk, the affix
//! variant generator, and the combat bookkeeping used by encounters. Every API
//! here is pure: randomness is injected through [`rand::Rng`] (normally a
//! seeded [`PcgRng`]), and nothing in this crate performs I/O or logging.
pub mod combat;
pub mod config;
pub mod defs;
pub mod error;
pub mod rng;
pub mod stats;
pub mod variant;

pub use combat::{
    ActiveEffect, CombatError, Combatant, CombatantId, EffectTick, Encounter, Outcome,
    RoundSummary, Side, StrikeResult, initiative_order,
};
pub use config::{GameConfig, RarityWeights, VariantConfig};
pub use defs::{
    AbilityCost, AbilityDef, AbilityEffects, AbilityKind, AffixSlot, BuffDef, BuffKind,
    EntityKind, EntityTemplate, ModifierRecord, Rarity, StatusEffectDef, Targeting,
};
pub use error::{ErrorSeverity, GameError};
pub use rng::{PcgRng, compute_seed};
pub use stats::StatBlock;
pub use variant::{BaseSubject, GeneratedVariant, VariantGenerator};
