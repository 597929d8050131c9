//! Air reach: planes that can strike a territory and still land.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::board::{GameState, PlayerId, TerritoryId, UnitId};
use crate::matches::terr;

/// Planes owned by `player` within `max_hops` of `target` that can reach
/// it and then a landing site with their remaining movement.
///
/// The landing site is the nearest allied land territory found by the
/// search, or for carrier-capable planes the nearest territory holding a
/// carrier of `player` with movement left. Planes standing in `ignore` or
/// `checked` are not counted, but carriers there still serve as landing
/// sites.
pub fn plane_attackers_that_can_land(
    state: &GameState,
    target: TerritoryId,
    max_hops: u32,
    player: PlayerId,
    ignore: &HashSet<TerritoryId>,
    checked: &HashSet<TerritoryId>,
) -> Vec<UnitId> {
    let graph = state.graph();
    let air_ok = terr::is_passable(state);
    let allied = terr::is_allied(state, player);

    let mut distance: HashMap<TerritoryId, u32> = HashMap::new();
    let mut planes: Vec<(UnitId, u32)> = Vec::new();
    let mut landing: Option<u32> = None;
    let mut carrier: Option<u32> = None;
    let mut queue = VecDeque::new();
    distance.insert(target, 0);
    queue.push_back(target);

    while let Some(cur) = queue.pop_front() {
        let d = distance[&cur];
        if d >= max_hops {
            break;
        }
        for &nb in graph.neighbors(cur) {
            let terr = state.territory(nb);
            if distance.contains_key(&nb) || !air_ok.test(terr) {
                continue;
            }
            let hops = d + 1;
            distance.insert(nb, hops);
            queue.push_back(nb);
            if landing.is_none() && terr.is_land() && allied.test(terr) {
                landing = Some(hops);
            }
            let counted = !ignore.contains(&nb) && !checked.contains(&nb);
            for u in state.units_in(nb) {
                if u.owner != player || !u.can_move() {
                    continue;
                }
                let ut = state.type_of(u);
                if carrier.is_none() && ut.is_carrier() {
                    carrier = Some(hops);
                }
                if counted && ut.is_air {
                    planes.push((u.id, hops));
                }
            }
        }
    }

    planes
        .into_iter()
        .filter(|&(id, hops)| {
            let u = state.unit(id);
            let lands = landing.is_some_and(|lz| u.movement_left >= hops + lz);
            let docks = carrier.is_some_and(|ac| {
                state.type_of(u).can_land_on_carrier() && u.movement_left >= hops + ac
            });
            lands || docks
        })
        .map(|(id, _)| id)
        .collect()
}
