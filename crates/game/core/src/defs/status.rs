//! Status effect definitions (bleeding, poisoned, hungover, ...).

use crate::stats::StatBlock;

/// A status effect that can be applied to a combatant or character.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffectDef {
    pub id: String,
    pub name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,

    /// Duration in combat rounds. Zero or negative means it lasts until removed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_duration: i32,

    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub max_stacks: u32,

    /// Ids of effects that cannot coexist with this one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub conflicts: Vec<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub stat_changes: StatBlock,

    /// Out-of-combat duration, in game time.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_hours: u32,

    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_minutes: u32,

    /// Free-form category: "positive", "negative", "neutral".
    #[cfg_attr(feature = "serde", serde(default = "neutral"))]
    pub effect_type: String,

    /// Health lost per round while active. Negative values heal.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_over_time: i32,

    #[cfg_attr(feature = "serde", serde(default = "yes"))]
    pub removable: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub display_name: String,
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn neutral() -> String {
    "neutral".to_owned()
}

#[cfg(feature = "serde")]
fn yes() -> bool {
    true
}

impl StatusEffectDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            default_duration: 0,
            max_stacks: 1,
            conflicts: Vec::new(),
            stat_changes: StatBlock::new(),
            duration_hours: 0,
            duration_minutes: 0,
            effect_type: "neutral".to_owned(),
            damage_over_time: 0,
            removable: true,
            display_name: String::new(),
        }
    }

    /// Combat duration, or `None` when the effect does not expire on its own.
    pub fn round_duration(&self) -> Option<u32> {
        u32::try_from(self.default_duration)
            .ok()
            .filter(|rounds| *rounds > 0)
    }

    /// Display name, falling back to the title-cased name.
    pub fn label(&self) -> String {
        if self.display_name.is_empty() {
            super::title_case(&self.name)
        } else {
            self.display_name.clone()
        }
    }

    pub fn conflicts_with(&self, other: &str) -> bool {
        self.conflicts.iter().any(|c| c == other)
    }

    /// Total out-of-combat duration in minutes.
    pub fn total_minutes(&self) -> u32 {
        self.duration_hours
            .saturating_mul(60)
            .saturating_add(self.duration_minutes)
    }
}
