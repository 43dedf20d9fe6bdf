//! Prefix and suffix modifier records.
//!
//! A modifier changes a subject's name, adds stat deltas, and grants effect
//! tags. Its weight in random selection comes from its rarity unless the record
//! declares an explicit `weight`.

use crate::config::RarityWeights;
use crate::stats::StatBlock;

/// Where a modifier's name goes relative to the base name.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AffixSlot {
    /// Rendered before the base name ("Brave Imp").
    Prefix,
    /// Rendered after the base name ("Imp of Blight").
    Suffix,
}

/// Rarity tier controlling a modifier's default selection weight.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// A prefix or suffix definition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierRecord {
    pub id: String,

    /// Text inserted into the variant name. Suffix names carry their own
    /// leading "of".
    #[cfg_attr(feature = "serde", serde(rename = "name"))]
    pub display_name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,

    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    slot: AffixSlot,

    #[cfg_attr(feature = "serde", serde(default))]
    pub rarity: Rarity,

    #[cfg_attr(feature = "serde", serde(default))]
    pub stat_modifiers: StatBlock,

    #[cfg_attr(feature = "serde", serde(default))]
    pub special_effects: Vec<String>,

    /// Target kinds this modifier may be applied to. Empty means any target.
    #[cfg_attr(feature = "serde", serde(rename = "restrictions", default))]
    pub applicable_targets: Vec<String>,

    /// Explicit selection weight overriding the rarity default.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "weight", default, skip_serializing_if = "Option::is_none")
    )]
    pub selection_weight: Option<u32>,
}

impl ModifierRecord {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        slot: AffixSlot,
        rarity: Rarity,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            slot,
            rarity,
            stat_modifiers: StatBlock::new(),
            special_effects: Vec::new(),
            applicable_targets: Vec::new(),
            selection_weight: None,
        }
    }

    pub fn with_stat(mut self, stat: &str, delta: i32) -> Self {
        self.stat_modifiers.add(stat, delta);
        self
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.special_effects.push(effect.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.applicable_targets.push(target.into());
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.selection_weight = Some(weight);
        self
    }

    /// Slot is fixed once the record is built.
    pub fn slot(&self) -> AffixSlot {
        self.slot
    }

    pub fn is_prefix(&self) -> bool {
        self.slot == AffixSlot::Prefix
    }

    pub fn is_suffix(&self) -> bool {
        self.slot == AffixSlot::Suffix
    }

    pub fn can_apply_to(&self, target: &str) -> bool {
        self.applicable_targets.is_empty() || self.applicable_targets.iter().any(|t| t == target)
    }

    /// Selection weight: the explicit `weight` if set, else the rarity default.
    pub fn weight(&self, table: &RarityWeights) -> u32 {
        self.selection_weight
            .unwrap_or_else(|| table.weight(self.rarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_targets_apply_everywhere() {
        let universal = ModifierRecord::new("brave", "Brave", AffixSlot::Prefix, Rarity::Common);
        assert!(universal.can_apply_to("entity"));
        assert!(universal.can_apply_to("weapon"));

        let restricted = universal.clone().with_target("weapon");
        assert!(restricted.can_apply_to("weapon"));
        assert!(!restricted.can_apply_to("entity"));
    }

    #[test]
    fn explicit_weight_overrides_rarity() {
        let table = RarityWeights::default();
        let record = ModifierRecord::new("of_blight", "of Blight", AffixSlot::Suffix, Rarity::Uncommon);
        assert_eq!(record.weight(&table), 60);
        assert_eq!(record.with_weight(7).weight(&table), 7);
    }

    #[test]
    fn rarity_parses_case_insensitively() {
        assert_eq!("LEGENDARY".parse::<Rarity>().ok(), Some(Rarity::Legendary));
        assert_eq!(AffixSlot::Suffix.to_string(), "suffix");
    }
}
