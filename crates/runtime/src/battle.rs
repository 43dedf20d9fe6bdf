//! Registry-driven combat with signal emission.
//!
//! [`BattleSession`] wraps a core [`Encounter`] and resolves registry content
//! (entity templates, status effects, abilities) against it. Every state
//! change is published on the context's [`SignalBus`] under the `battle`
//! source.

use std::collections::BTreeMap;

use rand::Rng;
use serde_json::{Value, json};

use game_core::{
    AbilityDef, ActiveEffect, CombatError, Combatant, CombatantId, Encounter, ErrorSeverity,
    GameError, Outcome, RoundSummary, Side, StatusEffectDef, StrikeResult,
};

use crate::context::ContentContext;
use crate::events::Signal;

const SOURCE: &str = "battle";

/// Status removed by abilities with `removes_bleeding`.
pub const BLEEDING: &str = "bleeding";

#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("unknown entity template '{0}'")]
    UnknownEntity(String),

    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("unknown status effect '{0}'")]
    UnknownStatus(String),

    #[error("it is not {0}'s turn")]
    NotYourTurn(CombatantId),

    #[error("ability '{ability}' cannot target {target}")]
    InvalidTarget { ability: String, target: CombatantId },

    #[error("ability '{ability}' needs a target")]
    MissingTarget { ability: String },

    #[error("ability '{ability}' is cooling down for {rounds} more round(s)")]
    OnCooldown { ability: String, rounds: u32 },

    #[error("combatant {0} cannot flee")]
    CannotFlee(CombatantId),
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Combat(err) => err.severity(),
            Self::OnCooldown { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Combat(err) => err.error_code(),
            Self::UnknownEntity(_) => "BATTLE_UNKNOWN_ENTITY",
            Self::UnknownAbility(_) => "BATTLE_UNKNOWN_ABILITY",
            Self::UnknownStatus(_) => "BATTLE_UNKNOWN_STATUS",
            Self::NotYourTurn(_) => "BATTLE_NOT_YOUR_TURN",
            Self::InvalidTarget { .. } => "BATTLE_INVALID_TARGET",
            Self::MissingTarget { .. } => "BATTLE_MISSING_TARGET",
            Self::OnCooldown { .. } => "BATTLE_ON_COOLDOWN",
            Self::CannotFlee(_) => "BATTLE_CANNOT_FLEE",
        }
    }
}

/// What one ability use did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbilityOutcome {
    pub ability: String,
    pub user: CombatantId,
    pub target: CombatantId,
    pub damage: i32,
    pub healed: i32,
    pub critical: bool,
    /// Status effects that landed on the target.
    pub applied: Vec<String>,
    /// Status effects the target was immune to.
    pub resisted: Vec<String>,
}

/// A fight between registry entities.
pub struct BattleSession<'ctx> {
    ctx: &'ctx ContentContext,
    encounter: Encounter,
    cooldowns: BTreeMap<(CombatantId, String), u32>,
    end_reported: bool,
}

impl<'ctx> BattleSession<'ctx> {
    /// Wraps an existing encounter.
    pub fn new(ctx: &'ctx ContentContext, encounter: Encounter) -> Self {
        Self {
            ctx,
            encounter,
            cooldowns: BTreeMap::new(),
            end_reported: false,
        }
    }

    /// Builds combatants from entity template ids.
    ///
    /// With `enemy_variants` set, every hostile combatant is run through the
    /// variant generator for that target kind first, so it may gain a prefix
    /// or suffix, extra stats, and granted immunities.
    pub fn from_registry<R>(
        ctx: &'ctx ContentContext,
        party: &[&str],
        hostile: &[&str],
        enemy_variants: Option<&str>,
        rng: &mut R,
    ) -> Result<Self, BattleError>
    where
        R: Rng + ?Sized,
    {
        let mut combatants = Vec::with_capacity(party.len() + hostile.len());
        let mut next_id = 1;
        let sides = party
            .iter()
            .map(|id| (*id, Side::Party))
            .chain(hostile.iter().map(|id| (*id, Side::Hostile)));

        for (template_id, side) in sides {
            let template = ctx
                .entities()
                .get(template_id)
                .ok_or_else(|| BattleError::UnknownEntity(template_id.to_owned()))?;
            let id = CombatantId(next_id);
            next_id += 1;

            let combatant = match (side, enemy_variants) {
                (Side::Hostile, Some(target)) => {
                    let variant = ctx.variant(&template.as_subject(), target, rng);
                    Combatant::new(id, variant.final_name.clone(), side, &variant.final_stats)
                        .with_granted_effects(&variant.granted_effects)
                }
                _ => Combatant::new(id, template.name.clone(), side, &template.base_stats()),
            };
            combatants.push(
                combatant
                    .with_template(template.id.clone())
                    .with_immunities(template.immunities.iter().cloned()),
            );
        }

        Ok(Self::new(ctx, Encounter::new(combatants)?))
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn outcome(&self) -> Outcome {
        self.encounter.outcome()
    }

    pub fn is_over(&self) -> bool {
        self.encounter.is_over()
    }

    pub fn round(&self) -> u32 {
        self.encounter.round()
    }

    pub fn current_actor(&self) -> Option<CombatantId> {
        self.encounter.current_actor()
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.encounter.combatant(id)
    }

    /// First combatant with this name.
    pub fn find(&self, name: &str) -> Option<&Combatant> {
        self.encounter.combatants().iter().find(|c| c.name == name)
    }

    /// First living combatant on `side`.
    pub fn first_living(&self, side: Side) -> Option<CombatantId> {
        self.encounter.living(side).next().map(|c| c.id)
    }

    /// Remaining cooldown of `ability` for `user`.
    pub fn cooldown(&self, user: CombatantId, ability: &str) -> u32 {
        self.cooldowns
            .get(&(user, ability.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    /// Rolls initiative and announces the fight.
    pub fn start<R>(&mut self, rng: &mut R) -> Option<CombatantId>
    where
        R: Rng + ?Sized,
    {
        let first = self.encounter.start(rng);
        let side_names = |side: Side| -> Vec<String> {
            self.encounter
                .combatants()
                .iter()
                .filter(|c| c.side == side)
                .map(|c| c.name.clone())
                .collect()
        };
        self.publish(
            Signal::CombatStarted,
            json!({
                "party": side_names(Side::Party),
                "hostile": side_names(Side::Hostile),
                "order": self.encounter.order().iter().map(|id| id.0).collect::<Vec<_>>(),
            }),
        );
        tracing::info!(combatants = self.encounter.combatants().len(), "combat started");
        self.announce_turn();
        first
    }

    /// Basic attack by the current actor.
    pub fn attack(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Result<StrikeResult, BattleError> {
        self.ensure_turn(attacker)?;
        let result = self.encounter.strike(attacker, target)?;
        self.report_health(target, -result.damage);
        self.finish_action();
        Ok(result)
    }

    /// Applies a registered status effect to a living combatant.
    ///
    /// Effects the new one conflicts with are removed first. Not bound to the
    /// turn order, so ability and scripted effects can use it.
    pub fn apply_status(&mut self, target: CombatantId, status_id: &str) -> Result<(), BattleError> {
        let def = self
            .ctx
            .statuses()
            .get(status_id)
            .ok_or_else(|| BattleError::UnknownStatus(status_id.to_owned()))?;
        self.apply_status_def(target, &def)
    }

    fn apply_status_def(&mut self, target: CombatantId, def: &StatusEffectDef) -> Result<(), BattleError> {
        let combatant = self.encounter.living_combatant_mut(target)?;
        if combatant.is_immune_to(&def.id) {
            return Err(CombatError::Immune {
                combatant: target,
                effect: def.id.clone(),
            }
            .into());
        }

        let conflicting: Vec<String> = combatant
            .effects()
            .iter()
            .filter(|e| def.conflicts_with(&e.id))
            .map(|e| e.id.clone())
            .collect();
        for id in &conflicting {
            combatant.remove_effect(id);
        }

        let effect = ActiveEffect::new(def.id.clone(), def.round_duration())
            .with_damage(def.damage_over_time)
            .with_max_stacks(def.max_stacks);
        combatant.apply_effect(effect)?;

        for id in conflicting {
            self.publish(
                Signal::StatusRemoved,
                json!({ "combatant": target.0, "status": id, "reason": "conflict" }),
            );
        }
        self.publish(
            Signal::StatusApplied,
            json!({
                "combatant": target.0,
                "status": def.id,
                "name": def.label(),
                "duration": def.round_duration(),
            }),
        );
        Ok(())
    }

    /// Removes a status effect unless its definition marks it non-removable.
    ///
    /// Returns whether anything was removed.
    pub fn remove_status(&mut self, target: CombatantId, status_id: &str) -> Result<bool, BattleError> {
        let removable = self
            .ctx
            .statuses()
            .get(status_id)
            .is_none_or(|def| def.removable);
        if !removable {
            return Ok(false);
        }

        let removed = self.encounter.living_combatant_mut(target)?.remove_effect(status_id);
        if removed {
            self.publish(
                Signal::StatusRemoved,
                json!({ "combatant": target.0, "status": status_id, "reason": "removed" }),
            );
        }
        Ok(removed)
    }

    /// Uses a registered ability.
    ///
    /// Self-targeting abilities ignore `target`. Attacks must target the other
    /// side and heals the user's own side. Every listed status must be
    /// registered; lookups happen before the cost is paid, so a rejected use
    /// leaves the fight untouched. Damage and healing are drawn uniformly from
    /// the declared range, and a critical hit doubles damage. Healing and
    /// statuses are skipped once the target is down.
    pub fn use_ability<R>(
        &mut self,
        user: CombatantId,
        ability_id: &str,
        target: Option<CombatantId>,
        rng: &mut R,
    ) -> Result<AbilityOutcome, BattleError>
    where
        R: Rng + ?Sized,
    {
        self.ensure_turn(user)?;
        let ability = self
            .ctx
            .abilities()
            .get(ability_id)
            .ok_or_else(|| BattleError::UnknownAbility(ability_id.to_owned()))?;

        let rounds = self.cooldown(user, &ability.id);
        if rounds > 0 {
            return Err(BattleError::OnCooldown {
                ability: ability.id.clone(),
                rounds,
            });
        }

        let target = self.resolve_target(user, &ability, target)?;
        let statuses = ability
            .effects
            .status_effects
            .iter()
            .map(|id| {
                self.ctx
                    .statuses()
                    .get(id)
                    .ok_or_else(|| BattleError::UnknownStatus(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.encounter.living_combatant_mut(user)?.pay(&ability.cost)?;
        if ability.cost.health > 0 {
            let paid = i32::try_from(ability.cost.health).unwrap_or(i32::MAX);
            self.report_health(user, -paid);
        }

        let mut outcome = AbilityOutcome {
            ability: ability.id.clone(),
            user,
            target,
            ..AbilityOutcome::default()
        };

        let effects = &ability.effects;
        let (low, high) = effects.damage_range();
        if high > 0 {
            let mut damage = rng.gen_range(low.max(0)..=high);
            if effects.critical_chance > 0.0 && rng.gen_bool(effects.critical_chance.clamp(0.0, 1.0)) {
                damage = damage.saturating_mul(2);
                outcome.critical = true;
            }
            outcome.damage = self.encounter.living_combatant_mut(target)?.take_damage(damage);
            self.report_health(target, -outcome.damage);
        }

        let target_alive =
            |encounter: &Encounter| encounter.combatant(target).is_some_and(Combatant::is_alive);

        let (low, high) = effects.heal_range();
        if high > 0 && target_alive(&self.encounter) {
            let amount = rng.gen_range(low.max(0)..=high);
            outcome.healed = self.encounter.living_combatant_mut(target)?.heal(amount);
            self.report_health(target, outcome.healed);
        }

        if effects.removes_bleeding && target_alive(&self.encounter) {
            self.remove_status(target, BLEEDING)?;
        }

        for def in &statuses {
            if !target_alive(&self.encounter) {
                break;
            }
            match self.apply_status_def(target, def) {
                Ok(()) => outcome.applied.push(def.id.clone()),
                Err(BattleError::Combat(CombatError::Immune { effect, .. })) => {
                    outcome.resisted.push(effect);
                }
                Err(err) => return Err(err),
            }
        }

        if ability.cooldown > 0 {
            self.cooldowns.insert((user, ability.id.clone()), ability.cooldown);
        }

        self.publish(
            Signal::AbilityUsed,
            json!({
                "user": user.0,
                "ability": ability.id,
                "target": target.0,
                "damage": outcome.damage,
                "healed": outcome.healed,
                "critical": outcome.critical,
            }),
        );
        tracing::debug!(ability = %ability.id, %user, %target, damage = outcome.damage, healed = outcome.healed, "ability used");
        self.finish_action();
        Ok(outcome)
    }

    /// Ends the current actor's turn, resolving the round boundary if reached.
    pub fn end_turn<R>(&mut self, rng: &mut R) -> Result<Option<RoundSummary>, BattleError>
    where
        R: Rng + ?Sized,
    {
        let actor = self.encounter.current_actor();
        let summary = self.encounter.end_turn(rng)?;
        if let Some(actor) = actor {
            self.publish(Signal::TurnEnded, json!({ "combatant": actor.0 }));
        }

        if let Some(summary) = &summary {
            self.report_round(summary);
            self.cooldowns.retain(|_, rounds| {
                *rounds = rounds.saturating_sub(1);
                *rounds > 0
            });
        }

        self.finish_action();
        if !self.is_over() {
            self.announce_turn();
        }
        Ok(summary)
    }

    /// The party leaves the fight.
    pub fn flee(&mut self, who: CombatantId) -> Result<(), BattleError> {
        self.ensure_turn(who)?;
        if self.encounter.living_combatant(who)?.side != Side::Party {
            return Err(BattleError::CannotFlee(who));
        }
        self.encounter.flee()?;
        self.finish_action();
        Ok(())
    }

    /// Current actor strikes the first living opponent, then ends its turn.
    pub fn basic_turn<R>(&mut self, rng: &mut R) -> Result<Option<RoundSummary>, BattleError>
    where
        R: Rng + ?Sized,
    {
        let actor = self.encounter.current_actor().ok_or(if self.encounter.is_started() {
            CombatError::EncounterOver
        } else {
            CombatError::NotStarted
        })?;
        let side = self.encounter.living_combatant(actor)?.side;
        if let Some(target) = self.first_living(side.opposite()) {
            self.attack(actor, target)?;
        }
        if self.is_over() {
            return Ok(None);
        }
        self.end_turn(rng)
    }

    fn ensure_turn(&self, who: CombatantId) -> Result<(), BattleError> {
        if !self.encounter.is_started() {
            return Err(CombatError::NotStarted.into());
        }
        if self.encounter.is_over() {
            return Err(CombatError::EncounterOver.into());
        }
        self.encounter.living_combatant(who)?;
        if self.encounter.current_actor() != Some(who) {
            return Err(BattleError::NotYourTurn(who));
        }
        Ok(())
    }

    fn resolve_target(
        &self,
        user: CombatantId,
        ability: &AbilityDef,
        target: Option<CombatantId>,
    ) -> Result<CombatantId, BattleError> {
        if ability.is_self_targeting() {
            return Ok(user);
        }
        let target = target.ok_or_else(|| BattleError::MissingTarget {
            ability: ability.id.clone(),
        })?;

        let user_side = self.encounter.living_combatant(user)?.side;
        let target_side = self.encounter.living_combatant(target)?.side;
        let allowed = if ability.is_attack() {
            target_side != user_side
        } else if ability.is_heal() {
            target_side == user_side
        } else {
            ability.can_target_allies() || target_side != user_side
        };
        if !allowed {
            return Err(BattleError::InvalidTarget {
                ability: ability.id.clone(),
                target,
            });
        }
        Ok(target)
    }

    fn report_round(&self, summary: &RoundSummary) {
        for (id, tick) in &summary.ticks {
            self.publish(
                Signal::StatusTick,
                json!({
                    "combatant": id.0,
                    "round": summary.round,
                    "damage": tick.damage,
                    "healed": tick.healed,
                    "expired": tick.expired,
                }),
            );
            if tick.damage > 0 || tick.healed > 0 {
                self.report_health(*id, tick.healed - tick.damage);
            }
            for status in &tick.expired {
                self.publish(
                    Signal::StatusRemoved,
                    json!({ "combatant": id.0, "status": status, "reason": "expired" }),
                );
            }
        }
    }

    fn report_health(&self, id: CombatantId, delta: i32) {
        let Some(combatant) = self.encounter.combatant(id) else {
            return;
        };
        if delta != 0 {
            self.publish(
                Signal::EntityHpChanged,
                json!({
                    "combatant": id.0,
                    "name": combatant.name,
                    "delta": delta,
                    "health": combatant.health(),
                    "max_health": combatant.max_health(),
                }),
            );
        }
        if delta < 0 && !combatant.is_alive() {
            self.publish(
                Signal::EntityDied,
                json!({ "combatant": id.0, "name": combatant.name }),
            );
            tracing::info!(combatant = %combatant.name, "combatant defeated");
        }
    }

    fn announce_turn(&self) {
        if let Some(actor) = self.encounter.current_actor() {
            self.publish(
                Signal::TurnStarted,
                json!({ "combatant": actor.0, "round": self.encounter.round() }),
            );
        }
    }

    fn finish_action(&mut self) {
        let outcome = self.encounter.refresh_outcome();
        if outcome == Outcome::Ongoing || self.end_reported {
            return;
        }
        self.end_reported = true;
        self.publish(
            Signal::CombatEnded,
            json!({ "outcome": outcome.to_string(), "rounds": self.encounter.round() }),
        );
        tracing::info!(%outcome, rounds = self.encounter.round(), "combat ended");
    }

    fn publish(&self, signal: Signal, payload: Value) {
        self.ctx.bus().publish(signal, SOURCE, payload);
    }
}
