//! Content definitions loaded from data files.
//!
//! Each definition is an immutable record keyed by `id`. Loading, schema
//! checks, and normalization live in `game-content`; this module only holds the
//! typed records and the rules that read them.

pub mod ability;
pub mod buff;
pub mod entity;
pub mod modifier;
pub mod status;

pub use ability::{AbilityCost, AbilityDef, AbilityEffects, AbilityKind, Targeting};
pub use buff::{BuffDef, BuffKind};
pub use entity::{EntityKind, EntityTemplate};
pub use modifier::{AffixSlot, ModifierRecord, Rarity};
pub use status::StatusEffectDef;

/// Title-cases a snake_case or space separated name (`"deep_wound"` -> `"Deep Wound"`).
pub fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
