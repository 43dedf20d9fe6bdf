//! Tunable parameters for content generation and runtime services.
//!
//! Every field carries a default so a partial `config.toml` only overrides what
//! it names.

use crate::defs::Rarity;

/// Top-level game configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Parameters for entity variant generation.
    pub variants: VariantConfig,

    /// Default selection weight for each modifier rarity.
    pub rarity_weights: RarityWeights,

    /// Number of published signals retained for diagnostics.
    pub signal_history: usize,

    /// Whether registry directory scans descend into sub-directories.
    pub recursive_scan: bool,
}

impl GameConfig {
    pub const DEFAULT_SIGNAL_HISTORY: usize = 1000;

    pub fn new() -> Self {
        Self {
            variants: VariantConfig::entity(),
            rarity_weights: RarityWeights::default(),
            signal_history: Self::DEFAULT_SIGNAL_HISTORY,
            recursive_scan: true,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Controls how many modifiers a generated variant receives.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VariantConfig {
    /// Probability in `[0, 1]` that any modifier is applied at all.
    pub base_chance: f64,

    /// Upper bound on modifiers drawn per slot (prefix or suffix).
    pub max_suffixes: u32,
}

impl VariantConfig {
    pub const DEFAULT_BASE_CHANCE: f64 = 0.70;
    pub const DEFAULT_MAX_SUFFIXES: u32 = 2;

    pub const fn new(base_chance: f64, max_suffixes: u32) -> Self {
        Self {
            base_chance,
            max_suffixes,
        }
    }

    /// Preset used for enemies: a 70% chance of up to two modifiers per slot.
    pub const fn entity() -> Self {
        Self::new(Self::DEFAULT_BASE_CHANCE, Self::DEFAULT_MAX_SUFFIXES)
    }

    /// Preset used for weapons: always modified, up to three modifiers per slot.
    pub const fn weapon() -> Self {
        Self::new(1.0, 3)
    }

    /// Base chance clamped into a valid probability.
    pub fn clamped_chance(&self) -> f64 {
        if self.base_chance.is_nan() {
            return 0.0;
        }
        self.base_chance.clamp(0.0, 1.0)
    }
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::entity()
    }
}

/// Rarity to selection weight table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RarityWeights {
    pub common: u32,
    pub uncommon: u32,
    pub rare: u32,
    pub legendary: u32,
}

impl RarityWeights {
    pub const fn new(common: u32, uncommon: u32, rare: u32, legendary: u32) -> Self {
        Self {
            common,
            uncommon,
            rare,
            legendary,
        }
    }

    pub const fn weight(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Legendary => self.legendary,
        }
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self::new(100, 60, 25, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GameConfig::default();
        assert_eq!(config.variants.base_chance, 0.70);
        assert_eq!(config.variants.max_suffixes, 2);
        assert_eq!(config.rarity_weights.weight(Rarity::Common), 100);
        assert_eq!(config.rarity_weights.weight(Rarity::Legendary), 5);
        assert_eq!(config.signal_history, 1000);
        assert!(config.recursive_scan);
    }

    #[test]
    fn chance_is_clamped() {
        assert_eq!(VariantConfig::new(1.5, 1).clamped_chance(), 1.0);
        assert_eq!(VariantConfig::new(-0.2, 1).clamped_chance(), 0.0);
        assert_eq!(VariantConfig::new(f64::NAN, 1).clamped_chance(), 0.0);
        assert_eq!(VariantConfig::weapon().clamped_chance(), 1.0);
    }
}
