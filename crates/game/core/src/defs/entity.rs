//! Entity templates: the player, ordinary enemies, elites, and bosses.

use crate::stats::StatBlock;
use crate::variant::BaseSubject;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    Player,
    #[default]
    Normal,
    Elite,
    Boss,
}

/// Base definition of a creature or character.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub entity_type: EntityKind,

    #[cfg_attr(feature = "serde", serde(default = "defaults::health"))]
    pub base_health: i32,
    #[cfg_attr(feature = "serde", serde(default = "defaults::attack"))]
    pub base_attack: i32,
    #[cfg_attr(feature = "serde", serde(default = "defaults::defense"))]
    pub base_defense: i32,
    #[cfg_attr(feature = "serde", serde(default = "defaults::speed"))]
    pub base_speed: i32,
    #[cfg_attr(feature = "serde", serde(default = "defaults::mana"))]
    pub base_mana: i32,

    /// Chance to flee while above half health.
    #[cfg_attr(feature = "serde", serde(default))]
    pub flee_chance: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub is_boss: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub is_elite: bool,

    /// Status effect ids this entity ignores.
    #[cfg_attr(feature = "serde", serde(default))]
    pub immunities: Vec<String>,
}

#[cfg(feature = "serde")]
mod defaults {
    use super::EntityTemplate;

    pub fn health() -> i32 {
        EntityTemplate::DEFAULT_HEALTH
    }
    pub fn attack() -> i32 {
        EntityTemplate::DEFAULT_ATTACK
    }
    pub fn defense() -> i32 {
        EntityTemplate::DEFAULT_DEFENSE
    }
    pub fn speed() -> i32 {
        EntityTemplate::DEFAULT_SPEED
    }
    pub fn mana() -> i32 {
        EntityTemplate::DEFAULT_MANA
    }
}

impl EntityTemplate {
    pub const DEFAULT_HEALTH: i32 = 100;
    pub const DEFAULT_ATTACK: i32 = 10;
    pub const DEFAULT_DEFENSE: i32 = 10;
    pub const DEFAULT_SPEED: i32 = 10;
    pub const DEFAULT_MANA: i32 = 50;

    /// Stat names produced by [`Self::calculate_stats`].
    pub const STAT_NAMES: [&'static str; 5] = ["health", "attack", "defense", "speed", "mana"];

    pub fn new(id: impl Into<String>, name: impl Into<String>, entity_type: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            entity_type,
            base_health: Self::DEFAULT_HEALTH,
            base_attack: Self::DEFAULT_ATTACK,
            base_defense: Self::DEFAULT_DEFENSE,
            base_speed: Self::DEFAULT_SPEED,
            base_mana: Self::DEFAULT_MANA,
            flee_chance: 0.0,
            is_boss: entity_type == EntityKind::Boss,
            is_elite: entity_type == EntityKind::Elite,
            immunities: Vec::new(),
        }
    }

    pub fn base_stats(&self) -> StatBlock {
        StatBlock::from([
            ("health", self.base_health),
            ("attack", self.base_attack),
            ("defense", self.base_defense),
            ("speed", self.base_speed),
            ("mana", self.base_mana),
        ])
    }

    /// Base stats with `modifiers` applied to the five core stats, floored at 0.
    ///
    /// Modifier keys outside the core stats are ignored.
    pub fn calculate_stats(&self, modifiers: &StatBlock) -> StatBlock {
        let mut stats = self.base_stats();
        for (stat, delta) in modifiers.iter() {
            if stats.contains(stat) {
                let value = stats.get(stat).saturating_add(delta).max(0);
                stats.set(stat, value);
            }
        }
        stats
    }

    /// Chance to flee at the given health.
    ///
    /// Bosses never flee. Above half health the base chance applies; below it
    /// the chance rises linearly by up to 0.4 at zero health, capped at 1.0.
    pub fn flee_chance_at(&self, health: i32, max_health: i32) -> f64 {
        if self.is_boss {
            return 0.0;
        }
        let fraction = if max_health > 0 {
            f64::from(health) / f64::from(max_health)
        } else {
            0.0
        };
        if fraction > 0.5 {
            return self.flee_chance;
        }
        let low_health = (0.5 - fraction) * 2.0;
        (self.flee_chance + low_health * 0.4).min(1.0)
    }

    pub fn is_immune_to(&self, effect: &str) -> bool {
        self.immunities.iter().any(|i| i == effect)
    }

    pub fn is_enemy(&self) -> bool {
        self.entity_type != EntityKind::Player
    }

    /// Subject for variant generation: the template name plus its base stats.
    pub fn as_subject(&self) -> BaseSubject {
        BaseSubject::new(self.name.clone(), self.base_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_stats_floors_and_ignores_unknown_keys() {
        let imp = EntityTemplate::new("imp", "Imp", EntityKind::Normal);
        let stats = imp.calculate_stats(&StatBlock::from([("attack", -50), ("corruption", 4)]));
        assert_eq!(stats.get("attack"), 0);
        assert_eq!(stats.get("health"), 100);
        assert!(!stats.contains("corruption"));
    }

    #[test]
    fn flee_chance_rises_below_half_health() {
        let mut imp = EntityTemplate::new("imp", "Imp", EntityKind::Normal);
        imp.flee_chance = 0.1;
        assert_eq!(imp.flee_chance_at(80, 100), 0.1);
        assert!((imp.flee_chance_at(25, 100) - 0.3).abs() < 1e-9);
        assert!((imp.flee_chance_at(0, 100) - 0.5).abs() < 1e-9);

        imp.flee_chance = 0.9;
        assert_eq!(imp.flee_chance_at(0, 100), 1.0);
    }

    #[test]
    fn bosses_never_flee() {
        let boss = EntityTemplate::new("cardinal", "The Cardinal", EntityKind::Boss);
        assert!(boss.is_boss);
        assert_eq!(boss.flee_chance_at(1, 500), 0.0);
    }
}
