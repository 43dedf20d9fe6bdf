//! Turn-based combat bookkeeping.
//!
//! # Architecture
//!
//! - [`Combatant`]: HP/mana meters, active effects, and immunities
//! - [`initiative_order`]: speed-descending order with random tie-breaks
//! - [`Encounter`]: two sides, sequential turns, round-boundary effect ticks
//!
//! Everything here is deterministic given the injected RNG. Signal emission
//! and registry lookups are layered on top by the runtime.

mod combatant;
mod encounter;
mod error;
mod initiative;

pub use combatant::{ActiveEffect, Combatant, CombatantId, EffectTick, Side};
pub use encounter::{Encounter, Outcome, RoundSummary, StrikeResult};
pub use error::CombatError;
pub use initiative::initiative_order;
