//! Combat ability definitions.

/// Broad category of an ability.
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
pub enum AbilityKind {
    #[default]
    Attack,
    Heal,
    Defense,
    Utility,
}

/// Who an ability may be aimed at.
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
pub enum Targeting {
    #[default]
    Single,
    Area,
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    #[strum(serialize = "self")]
    SelfOnly,
}

/// Resources consumed by one use of an ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityCost {
    pub ammo: u32,
    pub mana: u32,
    pub health: u32,
}

impl AbilityCost {
    /// Health must stay strictly above the health cost; paying may not kill.
    pub fn can_afford(&self, ammo: u32, mana: u32, health: u32) -> bool {
        ammo >= self.ammo && mana >= self.mana && health > self.health
    }
}

/// Numeric parameters of an ability.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityEffects {
    /// Inclusive `[min, max]` damage roll.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub base_damage: Option<[i32; 2]>,

    /// Inclusive `[min, max]` healing roll.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub heal_amount: Option<[i32; 2]>,

    pub accuracy_modifier: i32,
    pub defense_bonus: i32,
    pub critical_chance: f64,
    pub duration: u32,
    pub removes_bleeding: bool,
    pub blocks_movement: bool,

    /// Status effect ids applied to the target on use.
    pub status_effects: Vec<String>,
}

impl AbilityEffects {
    pub fn damage_range(&self) -> (i32, i32) {
        Self::ordered(self.base_damage)
    }

    pub fn heal_range(&self) -> (i32, i32) {
        Self::ordered(self.heal_amount)
    }

    fn ordered(range: Option<[i32; 2]>) -> (i32, i32) {
        match range {
            Some([a, b]) => (a.min(b), a.max(b)),
            None => (0, 0),
        }
    }
}

/// A combat ability.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDef {
    pub id: String,
    pub name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,

    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: AbilityKind,

    /// Flavour category such as "ballistic" or "holy".
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: AbilityCost,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: u32,

    #[cfg_attr(feature = "serde", serde(default))]
    pub range: u32,

    pub targeting: Targeting,

    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: AbilityEffects,

    #[cfg_attr(feature = "serde", serde(default))]
    pub animation: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub sound: String,
}

impl AbilityDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AbilityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            damage_type: String::new(),
            cost: AbilityCost::default(),
            cooldown: 0,
            range: 0,
            targeting: Targeting::default(),
            effects: AbilityEffects::default(),
            animation: String::new(),
            sound: String::new(),
        }
    }

    pub fn is_attack(&self) -> bool {
        self.kind == AbilityKind::Attack
    }

    pub fn is_heal(&self) -> bool {
        self.kind == AbilityKind::Heal
    }

    pub fn is_self_targeting(&self) -> bool {
        self.targeting == Targeting::SelfOnly
    }

    /// Heal and utility abilities aimed at others may target allies.
    pub fn can_target_allies(&self) -> bool {
        matches!(self.kind, AbilityKind::Heal | AbilityKind::Utility) && !self.is_self_targeting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_cost_must_leave_the_user_alive() {
        let cost = AbilityCost {
            ammo: 1,
            mana: 0,
            health: 5,
        };
        assert!(cost.can_afford(1, 0, 6));
        assert!(!cost.can_afford(1, 0, 5));
        assert!(!cost.can_afford(0, 0, 50));
    }

    #[test]
    fn ranges_are_ordered() {
        let effects = AbilityEffects {
            base_damage: Some([12, 8]),
            ..AbilityEffects::default()
        };
        assert_eq!(effects.damage_range(), (8, 12));
        assert_eq!(effects.heal_range(), (0, 0));
    }

    #[test]
    fn ally_targeting() {
        let mut ability = AbilityDef::new("field_dressing", "Field Dressing", AbilityKind::Heal);
        assert!(ability.can_target_allies());
        ability.targeting = Targeting::SelfOnly;
        assert!(!ability.can_target_allies());
        assert_eq!("self".parse::<Targeting>().ok(), Some(Targeting::SelfOnly));
    }
}
