use rand::Rng;
use rand::seq::SliceRandom;

use super::{Combatant, CombatantId};

/// Turn order for one round.
///
/// Living combatants sorted by speed, fastest first. Combatants with equal
/// speed form a tie group whose internal order is shuffled independently on
/// every call. Fallen combatants are left out.
pub fn initiative_order<R>(combatants: &[Combatant], rng: &mut R) -> Vec<CombatantId>
where
    R: Rng + ?Sized,
{
    let mut living: Vec<&Combatant> = combatants.iter().filter(|c| c.is_alive()).collect();
    living.sort_by(|a, b| b.speed.cmp(&a.speed).then(a.id.cmp(&b.id)));

    let mut order = Vec::with_capacity(living.len());
    for group in living.chunk_by(|a, b| a.speed == b.speed) {
        let mut ids: Vec<CombatantId> = group.iter().map(|c| c.id).collect();
        ids.shuffle(rng);
        order.extend(ids);
    }
    order
}
