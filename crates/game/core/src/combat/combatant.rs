use std::collections::BTreeSet;
use std::fmt;

use super::CombatError;
use crate::defs::AbilityCost;
use crate::stats::StatBlock;

/// Identifier of a combatant within one encounter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of the encounter a combatant fights for.
#[derive(
    Clone,
    Copy,
    Debug,
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
pub enum Side {
    /// The player and allies.
    Party,
    /// Enemies.
    Hostile,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Party => Self::Hostile,
            Self::Hostile => Self::Party,
        }
    }
}

/// A status effect currently affecting a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffect {
    pub id: String,

    /// Rounds left. `None` lasts until removed.
    pub remaining: Option<u32>,

    /// Health lost per round per stack. Negative values heal.
    pub damage_per_tick: i32,

    pub stacks: u32,
    pub max_stacks: u32,
}

impl ActiveEffect {
    pub fn new(id: impl Into<String>, remaining: Option<u32>) -> Self {
        Self {
            id: id.into(),
            remaining,
            damage_per_tick: 0,
            stacks: 1,
            max_stacks: 1,
        }
    }

    pub fn with_damage(mut self, damage_per_tick: i32) -> Self {
        self.damage_per_tick = damage_per_tick;
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks.max(1);
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.remaining.is_none()
    }

    fn tick_damage(&self) -> i32 {
        let stacks = i32::try_from(self.stacks).unwrap_or(i32::MAX);
        self.damage_per_tick.saturating_mul(stacks)
    }
}

/// What one round-boundary tick did to a combatant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTick {
    pub damage: i32,
    pub healed: i32,

    /// Effect ids whose duration reached zero and were removed.
    pub expired: Vec<String>,
}

impl EffectTick {
    pub fn is_empty(&self) -> bool {
        self.damage == 0 && self.healed == 0 && self.expired.is_empty()
    }
}

/// A participant in an encounter.
///
/// Health and mana are kept within `[0, max]` by every mutator.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,

    /// Registry id of the template this combatant was built from, if any.
    pub template_id: Option<String>,

    pub side: Side,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub ammo: u32,

    health: i32,
    max_health: i32,
    mana: i32,
    max_mana: i32,
    immunities: BTreeSet<String>,
    granted_effects: BTreeSet<String>,
    effects: Vec<ActiveEffect>,
}

impl Combatant {
    /// Suffix marking a granted effect as an immunity (`"poison_immunity"`).
    pub const IMMUNITY_SUFFIX: &'static str = "_immunity";

    /// Builds a combatant from named stats (`health`, `mana`, `attack`,
    /// `defense`, `speed`, `ammo`). Missing stats read as 0.
    pub fn new(id: CombatantId, name: impl Into<String>, side: Side, stats: &StatBlock) -> Self {
        let health = stats.get("health").max(0);
        let mana = stats.get("mana").max(0);
        Self {
            id,
            name: name.into(),
            template_id: None,
            side,
            attack: stats.get("attack"),
            defense: stats.get("defense"),
            speed: stats.get("speed"),
            ammo: u32::try_from(stats.get("ammo")).unwrap_or(0),
            health,
            max_health: health,
            mana,
            max_mana: mana,
            immunities: BTreeSet::new(),
            granted_effects: BTreeSet::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_immunities<I, S>(mut self, immunities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.immunities.extend(immunities.into_iter().map(Into::into));
        self
    }

    /// Records effects granted by a variant. `<effect>_immunity` tags also
    /// make the combatant immune to `<effect>`.
    pub fn with_granted_effects<'a>(mut self, effects: impl IntoIterator<Item = &'a String>) -> Self {
        for effect in effects {
            if let Some(target) = effect.strip_suffix(Self::IMMUNITY_SUFFIX) {
                self.immunities.insert(target.to_owned());
            }
            self.granted_effects.insert(effect.clone());
        }
        self
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn mana(&self) -> i32 {
        self.mana
    }

    pub fn max_mana(&self) -> i32 {
        self.max_mana
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Applies up to `amount` damage and returns how much was taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let taken = amount.max(0).min(self.health);
        self.health -= taken;
        taken
    }

    /// Restores up to `amount` health and returns how much was restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.max(0).min(self.max_health - self.health);
        self.health += restored;
        restored
    }

    /// Spends mana if enough is available.
    pub fn spend_mana(&mut self, amount: i32) -> bool {
        let amount = amount.max(0);
        if self.mana < amount {
            return false;
        }
        self.mana -= amount;
        true
    }

    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        let restored = amount.max(0).min(self.max_mana - self.mana);
        self.mana += restored;
        restored
    }

    /// Pays an ability cost, or fails without changing anything.
    pub fn pay(&mut self, cost: &AbilityCost) -> Result<(), CombatError> {
        let mana = u32::try_from(self.mana).unwrap_or(0);
        let health = u32::try_from(self.health).unwrap_or(0);
        if !cost.can_afford(self.ammo, mana, health) {
            return Err(CombatError::InsufficientResources(self.id));
        }
        self.ammo -= cost.ammo;
        self.mana -= i32::try_from(cost.mana).unwrap_or(i32::MAX);
        self.health -= i32::try_from(cost.health).unwrap_or(i32::MAX);
        Ok(())
    }

    pub fn is_immune_to(&self, effect: &str) -> bool {
        self.immunities.contains(effect)
    }

    pub fn immunities(&self) -> impl Iterator<Item = &str> {
        self.immunities.iter().map(String::as_str)
    }

    pub fn granted_effects(&self) -> impl Iterator<Item = &str> {
        self.granted_effects.iter().map(String::as_str)
    }

    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn has_effect(&self, id: &str) -> bool {
        self.effects.iter().any(|e| e.id == id)
    }

    /// Adds an effect, or refreshes an existing one.
    ///
    /// Re-applying keeps the longer duration and adds a stack up to the
    /// effect's `max_stacks`.
    pub fn apply_effect(&mut self, effect: ActiveEffect) -> Result<(), CombatError> {
        if !self.is_alive() {
            return Err(CombatError::Defeated(self.id));
        }
        if self.is_immune_to(&effect.id) {
            return Err(CombatError::Immune {
                combatant: self.id,
                effect: effect.id,
            });
        }

        if let Some(existing) = self.effects.iter_mut().find(|e| e.id == effect.id) {
            existing.remaining = match (existing.remaining, effect.remaining) {
                (None, _) | (_, None) => None,
                (Some(a), Some(b)) => Some(a.max(b)),
            };
            existing.max_stacks = existing.max_stacks.max(effect.max_stacks);
            existing.stacks = (existing.stacks + 1).min(existing.max_stacks);
            return Ok(());
        }

        self.effects.push(effect);
        Ok(())
    }

    /// Removes an effect immediately. Returns true if it was present.
    pub fn remove_effect(&mut self, id: &str) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        self.effects.len() != before
    }

    /// Advances every effect by one round.
    ///
    /// Damage over time is applied first, then durations drop by exactly one
    /// and effects reaching zero are removed.
    pub fn tick_effects(&mut self) -> EffectTick {
        let total = self
            .effects
            .iter()
            .fold(0i32, |acc, effect| acc.saturating_add(effect.tick_damage()));
        let mut tick = EffectTick::default();
        if total > 0 {
            tick.damage = self.take_damage(total);
        } else if total < 0 {
            tick.healed = self.heal(total.saturating_neg());
        }

        for effect in &mut self.effects {
            if let Some(remaining) = effect.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
            }
        }
        self.effects.retain(|effect| {
            let expired = effect.remaining == Some(0);
            if expired {
                tick.expired.push(effect.id.clone());
            }
            !expired
        });
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imp() -> Combatant {
        Combatant::new(
            CombatantId(1),
            "Imp",
            Side::Hostile,
            &StatBlock::from([("health", 30), ("mana", 10), ("attack", 5), ("speed", 12)]),
        )
    }

    #[test]
    fn meters_are_clamped() {
        let mut imp = imp();
        assert_eq!(imp.take_damage(-5), 0);
        assert_eq!(imp.take_damage(12), 12);
        assert_eq!(imp.heal(50), 12);
        assert_eq!(imp.health(), 30);
        assert_eq!(imp.take_damage(100), 30);
        assert!(!imp.is_alive());

        let mut imp = self::imp();
        assert!(!imp.spend_mana(11));
        assert!(imp.spend_mana(4));
        assert_eq!(imp.restore_mana(20), 4);
        assert_eq!(imp.mana(), 10);
    }

    #[test]
    fn duration_effects_expire_after_their_rounds() {
        let mut imp = imp();
        imp.apply_effect(ActiveEffect::new("burning", Some(2)).with_damage(3))
            .unwrap();
        imp.apply_effect(ActiveEffect::new("cursed", None)).unwrap();

        let first = imp.tick_effects();
        assert_eq!(first.damage, 3);
        assert!(first.expired.is_empty());
        assert_eq!(imp.effects()[0].remaining, Some(1));

        let second = imp.tick_effects();
        assert_eq!(second.expired, vec!["burning".to_owned()]);
        assert_eq!(imp.health(), 24);
        assert!(imp.has_effect("cursed"));
        assert!(!imp.has_effect("burning"));
    }

    #[test]
    fn stacked_damage_over_time_saturates() {
        let mut imp = imp();
        imp.apply_effect(ActiveEffect::new("hellfire", Some(3)).with_damage(i32::MAX))
            .unwrap();
        imp.apply_effect(ActiveEffect::new("brimstone", Some(3)).with_damage(i32::MAX / 2 + 1))
            .unwrap();

        let tick = imp.tick_effects();
        assert_eq!(tick.damage, 30);
        assert!(!imp.is_alive());
    }

    #[test]
    fn reapplying_refreshes_and_stacks() {
        let mut imp = imp();
        imp.apply_effect(ActiveEffect::new("bleeding", Some(1)).with_max_stacks(3))
            .unwrap();
        imp.apply_effect(ActiveEffect::new("bleeding", Some(4))).unwrap();
        let bleeding = &imp.effects()[0];
        assert_eq!(bleeding.remaining, Some(4));
        assert_eq!(bleeding.stacks, 2);
        assert_eq!(imp.effects().len(), 1);
    }

    #[test]
    fn granted_immunities_block_effects() {
        let mut imp = imp().with_granted_effects(&["poison_immunity".to_owned()]);
        assert!(imp.is_immune_to("poison"));
        let err = imp
            .apply_effect(ActiveEffect::new("poison", Some(3)))
            .unwrap_err();
        assert!(matches!(err, CombatError::Immune { .. }));
    }

    #[test]
    fn paying_costs() {
        let mut imp = imp();
        imp.ammo = 2;
        let cost = AbilityCost {
            ammo: 1,
            mana: 5,
            health: 0,
        };
        imp.pay(&cost).unwrap();
        assert_eq!((imp.ammo, imp.mana()), (1, 5));
        imp.pay(&cost).unwrap();
        assert_eq!(
            imp.pay(&cost),
            Err(CombatError::InsufficientResources(CombatantId(1)))
        );
    }
}
