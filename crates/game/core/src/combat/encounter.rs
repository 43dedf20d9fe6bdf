use rand::Rng;

use super::{CombatError, Combatant, CombatantId, EffectTick, Side, initiative_order};

/// How an encounter ended, if it has.
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
pub enum Outcome {
    #[default]
    Ongoing,
    /// Every hostile combatant is down.
    Victory,
    /// Every party combatant is down.
    Defeat,
    /// The party left the fight.
    Fled,
}

/// Effects resolved at a round boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundSummary {
    /// The round that just finished.
    pub round: u32,

    /// Non-empty ticks, per combatant.
    pub ticks: Vec<(CombatantId, EffectTick)>,

    /// Combatants that fell to damage over time.
    pub defeated: Vec<CombatantId>,
}

/// Result of a basic attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrikeResult {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub damage: i32,
    pub target_health: i32,
    pub defeated: bool,
}

/// A two-sided fight.
///
/// Turns are strictly sequential: [`Encounter::current_actor`] is the only
/// combatant expected to act, and [`Encounter::end_turn`] hands over to the
/// next living combatant in initiative order. Once everyone alive has acted the
/// round ends, effects tick once, and a fresh initiative order is drawn.
#[derive(Clone, Debug)]
pub struct Encounter {
    combatants: Vec<Combatant>,
    order: Vec<CombatantId>,
    cursor: usize,
    round: u32,
    outcome: Outcome,
}

impl Encounter {
    /// Creates an encounter. Both sides need at least one living combatant.
    pub fn new(combatants: Vec<Combatant>) -> Result<Self, CombatError> {
        for side in [Side::Party, Side::Hostile] {
            if !combatants.iter().any(|c| c.side == side && c.is_alive()) {
                return Err(CombatError::MissingSide(side));
            }
        }
        Ok(Self {
            combatants,
            order: Vec::new(),
            cursor: 0,
            round: 0,
            outcome: Outcome::Ongoing,
        })
    }

    /// Rolls the first initiative order and returns the first actor.
    pub fn start<R>(&mut self, rng: &mut R) -> Option<CombatantId>
    where
        R: Rng + ?Sized,
    {
        self.round = 1;
        self.begin_round(rng);
        self.current_actor()
    }

    pub fn is_started(&self) -> bool {
        self.round > 0
    }

    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::Ongoing
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Current round, starting at 1. Zero before [`Encounter::start`].
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Initiative order of the current round.
    pub fn order(&self) -> &[CombatantId] {
        &self.order
    }

    /// The combatant whose turn it is.
    pub fn current_actor(&self) -> Option<CombatantId> {
        if !self.is_started() || self.is_over() {
            return None;
        }
        self.order.get(self.cursor).copied()
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.combatants
            .iter()
            .filter(move |c| c.side == side && c.is_alive())
    }

    /// Finishes the current actor's turn.
    ///
    /// Returns the round summary when this turn closed the round.
    pub fn end_turn<R>(&mut self, rng: &mut R) -> Result<Option<RoundSummary>, CombatError>
    where
        R: Rng + ?Sized,
    {
        self.ensure_running()?;

        self.cursor += 1;
        self.skip_fallen();
        if self.cursor < self.order.len() {
            return Ok(None);
        }

        let summary = self.finish_round();
        self.refresh_outcome();
        if !self.is_over() {
            self.round += 1;
            self.begin_round(rng);
        }
        Ok(Some(summary))
    }

    /// Basic attack: `max(1, attack - defense)` damage.
    pub fn strike(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Result<StrikeResult, CombatError> {
        self.ensure_running()?;

        let attack = self.living_combatant(attacker)?.attack;
        let defender = self.living_combatant_mut(target)?;
        let damage = defender.take_damage((attack - defender.defense).max(1));
        let result = StrikeResult {
            attacker,
            target,
            damage,
            target_health: defender.health(),
            defeated: !defender.is_alive(),
        };

        self.refresh_outcome();
        Ok(result)
    }

    /// Ends the encounter with [`Outcome::Fled`].
    pub fn flee(&mut self) -> Result<(), CombatError> {
        self.ensure_running()?;
        self.outcome = Outcome::Fled;
        Ok(())
    }

    /// Re-evaluates the outcome after external changes (ability damage, ...).
    pub fn refresh_outcome(&mut self) -> Outcome {
        if self.outcome == Outcome::Ongoing {
            if self.living(Side::Hostile).next().is_none() {
                self.outcome = Outcome::Victory;
            } else if self.living(Side::Party).next().is_none() {
                self.outcome = Outcome::Defeat;
            }
        }
        self.outcome
    }

    pub fn living_combatant(&self, id: CombatantId) -> Result<&Combatant, CombatError> {
        let combatant = self
            .combatant(id)
            .ok_or(CombatError::UnknownCombatant(id))?;
        if !combatant.is_alive() {
            return Err(CombatError::Defeated(id));
        }
        Ok(combatant)
    }

    pub fn living_combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, CombatError> {
        let combatant = self
            .combatant_mut(id)
            .ok_or(CombatError::UnknownCombatant(id))?;
        if !combatant.is_alive() {
            return Err(CombatError::Defeated(id));
        }
        Ok(combatant)
    }

    fn ensure_running(&self) -> Result<(), CombatError> {
        if !self.is_started() {
            return Err(CombatError::NotStarted);
        }
        if self.is_over() {
            return Err(CombatError::EncounterOver);
        }
        Ok(())
    }

    fn begin_round<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.order = initiative_order(&self.combatants, rng);
        self.cursor = 0;
    }

    fn skip_fallen(&mut self) {
        while let Some(&id) = self.order.get(self.cursor) {
            if self.combatant(id).is_some_and(Combatant::is_alive) {
                break;
            }
            self.cursor += 1;
        }
    }

    fn finish_round(&mut self) -> RoundSummary {
        let mut summary = RoundSummary {
            round: self.round,
            ..RoundSummary::default()
        };
        for combatant in self.combatants.iter_mut().filter(|c| c.is_alive()) {
            let tick = combatant.tick_effects();
            if !combatant.is_alive() {
                summary.defeated.push(combatant.id);
            }
            if !tick.is_empty() {
                summary.ticks.push((combatant.id, tick));
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::ActiveEffect;
    use crate::rng::PcgRng;
    use crate::stats::StatBlock;

    fn combatant(id: u32, side: Side, health: i32, attack: i32, defense: i32, speed: i32) -> Combatant {
        Combatant::new(
            CombatantId(id),
            format!("c{id}"),
            side,
            &StatBlock::from([
                ("health", health),
                ("attack", attack),
                ("defense", defense),
                ("speed", speed),
            ]),
        )
    }

    fn skirmish() -> Encounter {
        Encounter::new(vec![
            combatant(0, Side::Party, 40, 12, 4, 15),
            combatant(1, Side::Hostile, 20, 6, 2, 10),
            combatant(2, Side::Hostile, 20, 6, 20, 5),
        ])
        .unwrap()
    }

    #[test]
    fn requires_both_sides() {
        let err = Encounter::new(vec![combatant(0, Side::Party, 10, 1, 1, 1)]).unwrap_err();
        assert_eq!(err, CombatError::MissingSide(Side::Hostile));
    }

    #[test]
    fn actions_require_a_started_encounter() {
        let mut encounter = skirmish();
        assert_eq!(encounter.current_actor(), None);
        assert_eq!(
            encounter.strike(CombatantId(0), CombatantId(1)),
            Err(CombatError::NotStarted)
        );
    }

    #[test]
    fn everyone_acts_once_per_round() {
        let mut rng = PcgRng::new(9);
        let mut encounter = skirmish();
        assert_eq!(encounter.start(&mut rng), Some(CombatantId(0)));

        let mut acted = Vec::new();
        loop {
            acted.push(encounter.current_actor().unwrap());
            if let Some(summary) = encounter.end_turn(&mut rng).unwrap() {
                assert_eq!(summary.round, 1);
                break;
            }
        }
        assert_eq!(acted, vec![CombatantId(0), CombatantId(1), CombatantId(2)]);
        assert_eq!(encounter.round(), 2);
        assert_eq!(encounter.current_actor(), Some(CombatantId(0)));
    }

    #[test]
    fn strike_damage_has_a_floor_of_one() {
        let mut rng = PcgRng::new(1);
        let mut encounter = skirmish();
        encounter.start(&mut rng);

        let hit = encounter.strike(CombatantId(0), CombatantId(1)).unwrap();
        assert_eq!(hit.damage, 10);
        assert_eq!(hit.target_health, 10);

        let glance = encounter.strike(CombatantId(0), CombatantId(2)).unwrap();
        assert_eq!(glance.damage, 1);
    }

    #[test]
    fn defeating_all_hostiles_is_victory() {
        let mut rng = PcgRng::new(1);
        let mut encounter = Encounter::new(vec![
            combatant(0, Side::Party, 40, 50, 4, 15),
            combatant(1, Side::Hostile, 20, 6, 2, 10),
        ])
        .unwrap();
        encounter.start(&mut rng);

        let hit = encounter.strike(CombatantId(0), CombatantId(1)).unwrap();
        assert!(hit.defeated);
        assert_eq!(encounter.outcome(), Outcome::Victory);
        assert_eq!(encounter.current_actor(), None);
        assert_eq!(encounter.end_turn(&mut rng), Err(CombatError::EncounterOver));
    }

    #[test]
    fn fallen_combatants_lose_their_turn() {
        let mut rng = PcgRng::new(4);
        let mut encounter = skirmish();
        encounter.start(&mut rng);
        encounter
            .combatant_mut(CombatantId(1))
            .unwrap()
            .take_damage(100);

        encounter.end_turn(&mut rng).unwrap();
        assert_eq!(encounter.current_actor(), Some(CombatantId(2)));
        assert_eq!(
            encounter.strike(CombatantId(2), CombatantId(1)),
            Err(CombatError::Defeated(CombatantId(1)))
        );
    }

    #[test]
    fn effects_tick_once_per_round() {
        let mut rng = PcgRng::new(3);
        let mut encounter = skirmish();
        encounter.start(&mut rng);
        encounter
            .combatant_mut(CombatantId(1))
            .unwrap()
            .apply_effect(ActiveEffect::new("poison", Some(2)).with_damage(4))
            .unwrap();

        let mut summaries = Vec::new();
        while summaries.len() < 2 {
            if let Some(summary) = encounter.end_turn(&mut rng).unwrap() {
                summaries.push(summary);
            }
        }

        assert_eq!(summaries[0].ticks.len(), 1);
        assert_eq!(summaries[0].ticks[0].1.damage, 4);
        assert_eq!(summaries[1].ticks[0].1.expired, vec!["poison".to_owned()]);
        assert_eq!(encounter.combatant(CombatantId(1)).unwrap().health(), 12);
        assert!(summaries.iter().all(|s| s.defeated.is_empty()));
    }

    #[test]
    fn fleeing_ends_the_encounter() {
        let mut rng = PcgRng::new(2);
        let mut encounter = skirmish();
        encounter.start(&mut rng);
        encounter.flee().unwrap();
        assert_eq!(encounter.outcome(), Outcome::Fled);
        assert_eq!(encounter.flee(), Err(CombatError::EncounterOver));
    }
}
