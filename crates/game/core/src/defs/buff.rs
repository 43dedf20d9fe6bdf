//! Buff definitions: stacking stat bonuses, temporary or permanent.

use crate::stats::StatBlock;

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
pub enum BuffKind {
    #[default]
    Temporary,
    Permanent,
}

/// A buff that modifies stats while active.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffDef {
    pub id: String,
    pub name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,

    pub stat_modifiers: StatBlock,

    /// Duration in rounds; `-1` marks a permanent buff.
    #[cfg_attr(feature = "serde", serde(default = "one_i32"))]
    pub default_duration: i32,

    #[cfg_attr(feature = "serde", serde(default = "one_u32"))]
    pub max_stacks: u32,

    #[cfg_attr(feature = "serde", serde(default))]
    pub buff_type: BuffKind,

    #[cfg_attr(feature = "serde", serde(default))]
    pub is_permanent: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub display_name: String,

    #[cfg_attr(feature = "serde", serde(default = "buff"))]
    pub effect_type: String,

    /// Whether repeated applications stack.
    #[cfg_attr(feature = "serde", serde(default = "yes"))]
    pub stacks: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub conflicts: Vec<String>,

    /// Icon or glyph shown next to the buff.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visual_indicator: String,
}

#[cfg(feature = "serde")]
fn one_i32() -> i32 {
    1
}

#[cfg(feature = "serde")]
fn one_u32() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn buff() -> String {
    "buff".to_owned()
}

#[cfg(feature = "serde")]
fn yes() -> bool {
    true
}

impl BuffDef {
    pub const PERMANENT_DURATION: i32 = -1;
    pub const PERMANENT_MAX_STACKS: u32 = 999;

    pub fn new(id: impl Into<String>, name: impl Into<String>, stat_modifiers: StatBlock) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            stat_modifiers,
            default_duration: 1,
            max_stacks: 1,
            buff_type: BuffKind::Temporary,
            is_permanent: false,
            display_name: String::new(),
            effect_type: "buff".to_owned(),
            stacks: true,
            conflicts: Vec::new(),
            visual_indicator: String::new(),
        }
    }

    /// Reconciles `is_permanent` with `buff_type`.
    ///
    /// A buff marked permanent either way becomes permanent in both fields.
    /// Fields still at their defaults are widened: duration to
    /// [`Self::PERMANENT_DURATION`] and stacks to [`Self::PERMANENT_MAX_STACKS`].
    pub fn normalize(&mut self) {
        if !(self.is_permanent || self.buff_type == BuffKind::Permanent) {
            return;
        }
        self.is_permanent = true;
        self.buff_type = BuffKind::Permanent;
        if self.default_duration == 1 {
            self.default_duration = Self::PERMANENT_DURATION;
        }
        if self.max_stacks == 1 {
            self.max_stacks = Self::PERMANENT_MAX_STACKS;
        }
    }

    /// Total stat deltas for `stacks` applications, capped at `max_stacks`.
    pub fn total_modifiers(&self, stacks: u32) -> StatBlock {
        let effective = stacks.min(self.max_stacks);
        self.stat_modifiers
            .scaled(i32::try_from(effective).unwrap_or(i32::MAX))
    }

    pub fn can_stack_to(&self, stacks: u32) -> bool {
        stacks <= self.max_stacks
    }

    pub fn modifies(&self, stat: &str) -> bool {
        self.stat_modifiers.contains(stat)
    }
}
