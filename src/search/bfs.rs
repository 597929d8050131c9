//! Constrained breadth-first traversals.
//!
//! Every search keeps its visited/distance/parent maps local to the call and
//! walks an explicit `VecDeque` worklist, so memory stays bounded by the map
//! size and concurrent calls never share scratch state.
//!
//! A start territory that is not on the map finds nothing.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::board::graph::unwind;
use crate::board::{GameState, PlayerId, Route, TerritoryId, UnitId};
use crate::matches::{terr, unit, TerritoryPred, UnitPred};

/// Nearest territory accepted by `end`, exploring only territories accepted
/// by `end` or `route_through`.
///
/// The search starts from the neighbors of `start`; `start` itself is never
/// returned even if it satisfies `end`. Among equally near matches the one
/// discovered first in neighbor order wins.
pub fn nearest(
    state: &GameState,
    start: TerritoryId,
    end: &TerritoryPred<'_>,
    route_through: &TerritoryPred<'_>,
) -> Option<Route> {
    let graph = state.graph();
    if !graph.contains(start) {
        return None;
    }
    let can_go = |t: TerritoryId| {
        let terr = state.territory(t);
        end.test(terr) || route_through.test(terr)
    };

    let mut parent: HashMap<TerritoryId, TerritoryId> = HashMap::new();
    let mut visited: HashSet<TerritoryId> = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);

    for &n in graph.neighbors(start) {
        if can_go(n) && visited.insert(n) {
            parent.insert(n, start);
            queue.push_back(n);
        }
    }

    while let Some(cur) = queue.pop_front() {
        if end.test(state.territory(cur)) {
            return Some(unwind(start, cur, |t| parent.get(&t).copied()));
        }
        for &n in graph.neighbors(cur) {
            if !visited.contains(&n) && can_go(n) {
                visited.insert(n);
                parent.insert(n, cur);
                queue.push_back(n);
            }
        }
    }
    None
}

/// Every territory exactly `n` hops from `start` (over territories accepted
/// by `end` or `route_through`) that satisfies `end`.
///
/// Distance zero belongs to `start` alone, so `n == 0` yields nothing.
pub fn frontier_at_distance(
    state: &GameState,
    start: TerritoryId,
    end: &TerritoryPred<'_>,
    route_through: &TerritoryPred<'_>,
    n: u32,
) -> Vec<TerritoryId> {
    let graph = state.graph();
    if n == 0 || !graph.contains(start) {
        return Vec::new();
    }
    let mut dist: HashMap<TerritoryId, u32> = HashMap::new();
    let mut out = Vec::new();
    let mut queue = VecDeque::new();
    dist.insert(start, 0);
    queue.push_back((start, 0u32));

    while let Some((cur, d)) = queue.pop_front() {
        if d >= n {
            continue;
        }
        for &nb in graph.neighbors(cur) {
            if dist.contains_key(&nb) {
                continue;
            }
            let terr = state.territory(nb);
            let is_end = end.test(terr);
            if !is_end && !route_through.test(terr) {
                continue;
            }
            dist.insert(nb, d + 1);
            if d + 1 == n && is_end {
                out.push(nb);
            }
            queue.push_back((nb, d + 1));
        }
    }
    out
}

/// Extra knobs for [`reachable_units_within_movement`].
#[derive(Debug, Clone, Default)]
pub struct ReachOptions {
    /// Hop counts whose units are mapped but not collected.
    pub ignore_distances: Vec<u32>,
    /// When set, hops through canals this player cannot use are refused.
    pub canal_player: Option<PlayerId>,
}

/// Output of [`reachable_units_within_movement`].
#[derive(Debug, Clone, Default)]
pub struct Reachable {
    /// Collected units with the hop distance at which they were found.
    pub units: Vec<(UnitId, u32)>,
    /// Hop distance of every territory recorded during the search.
    pub distances: HashMap<TerritoryId, u32>,
    parents: HashMap<TerritoryId, TerritoryId>,
    origin: Option<TerritoryId>,
}

impl Reachable {
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|&(u, _)| u).collect()
    }

    /// Route from the search origin to a recorded territory.
    pub fn route_to(&self, t: TerritoryId) -> Option<Route> {
        let origin = self.origin?;
        if !self.distances.contains_key(&t) {
            return None;
        }
        Some(unwind(origin, t, |x| self.parents.get(&x).copied()))
    }

    /// Routes to every recorded territory other than the origin.
    pub fn routes(&self) -> Vec<Route> {
        let mut targets: Vec<TerritoryId> = self.parents.keys().copied().collect();
        targets.sort();
        targets.into_iter().filter_map(|t| self.route_to(t)).collect()
    }
}

/// Units that can reach `start` within `max_hops`.
///
/// A neighbor enters the distance map only if it hosts a unit accepted by
/// `unit_pred` or is accepted by `route_constraint`. Territories in
/// `blocked` are recorded but neither expanded nor harvested. Elsewhere,
/// every matching unit whose remaining movement covers its hop distance is
/// collected.
pub fn reachable_units_within_movement(
    state: &GameState,
    start: TerritoryId,
    max_hops: u32,
    unit_pred: &UnitPred<'_>,
    route_constraint: &TerritoryPred<'_>,
    blocked: &HashSet<TerritoryId>,
    opts: &ReachOptions,
) -> Reachable {
    let graph = state.graph();
    if !graph.contains(start) {
        return Reachable::default();
    }
    let mut out = Reachable {
        origin: Some(start),
        ..Reachable::default()
    };
    let mut queue = VecDeque::new();
    out.distances.insert(start, 0);
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        let d = out.distances[&cur];
        if d >= max_hops {
            break;
        }
        for &nb in graph.neighbors(cur) {
            if out.distances.contains_key(&nb) {
                continue;
            }
            let hosts = state.units_in(nb).any(|u| unit_pred.test(u));
            if !hosts && !route_constraint.test(state.territory(nb)) {
                continue;
            }
            if let Some(p) = opts.canal_player {
                if state.canal_blocks(cur, nb, p) {
                    continue;
                }
            }
            let hops = d + 1;
            out.distances.insert(nb, hops);
            out.parents.insert(nb, cur);
            if blocked.contains(&nb) {
                continue;
            }
            queue.push_back(nb);
            if opts.ignore_distances.contains(&hops) {
                continue;
            }
            for u in state.units_in(nb) {
                if unit_pred.test(u) && u.movement_left >= hops {
                    out.units.push((u.id, hops));
                }
            }
        }
    }
    trace!(
        start = start.0,
        max_hops,
        found = out.units.len(),
        "reachable units"
    );
    out
}

/// Every unit accepted by `unit_pred` within `max_hops` over territories
/// accepted by `route`, with its hop distance. Movement is not checked.
pub fn units_within(
    state: &GameState,
    start: TerritoryId,
    max_hops: u32,
    route: &TerritoryPred<'_>,
    unit_pred: &UnitPred<'_>,
) -> Vec<(UnitId, u32)> {
    let graph = state.graph();
    if !graph.contains(start) {
        return Vec::new();
    }
    let mut dist: HashMap<TerritoryId, u32> = HashMap::new();
    let mut out = Vec::new();
    let mut queue = VecDeque::new();
    dist.insert(start, 0);
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        let d = dist[&cur];
        if d >= max_hops {
            break;
        }
        for &nb in graph.neighbors(cur) {
            if dist.contains_key(&nb) || !route.test(state.territory(nb)) {
                continue;
            }
            dist.insert(nb, d + 1);
            queue.push_back(nb);
            out.extend(
                state
                    .units_in(nb)
                    .filter(|u| unit_pred.test(u))
                    .map(|u| (u.id, d + 1)),
            );
        }
    }
    out
}

/// [`nearest`] whose match must also hold more than `min` units accepted by
/// `unit_pred`.
pub fn nearest_with_minimum_occupancy<'a>(
    state: &'a GameState,
    start: TerritoryId,
    end: &TerritoryPred<'a>,
    route_through: &TerritoryPred<'a>,
    unit_pred: &UnitPred<'a>,
    min: usize,
) -> Option<Route> {
    let occupied = end
        .clone()
        .and(terr::has_more_than(state, unit_pred.clone(), min));
    nearest(state, start, &occupied, route_through)
}

/// [`nearest`] preferring matches that hold units, falling back to any
/// match when no occupied one is reachable.
pub fn nearest_non_empty(
    state: &GameState,
    start: TerritoryId,
    end: &TerritoryPred<'_>,
    route_through: &TerritoryPred<'_>,
) -> Option<Route> {
    let occupied = end.clone().and(terr::has_units());
    nearest(state, start, &occupied, route_through)
        .or_else(|| nearest(state, start, end, route_through))
}

/// Passable territories exactly `n` hops from `t`, skipping neutral land
/// unless `include_neutral` (and the rules leave neutrals open). The hop
/// count ignores what lies in between.
pub fn exact_neighbors(
    state: &GameState,
    t: TerritoryId,
    n: u32,
    include_neutral: bool,
) -> Vec<TerritoryId> {
    let mut end = terr::is_passable(state);
    if !include_neutral {
        end = end.and(!terr::is_neutral());
    }
    frontier_at_distance(state, t, &end, &TerritoryPred::always(), n)
}

/// A two-hop route `from -> mid -> to` whose midpoint is accepted by `mid`
/// and not in `blocked`.
pub fn two_hop_route(
    state: &GameState,
    from: TerritoryId,
    to: TerritoryId,
    mid: &TerritoryPred<'_>,
    blocked: &HashSet<TerritoryId>,
) -> Option<Route> {
    let graph = state.graph();
    graph
        .neighbors(from)
        .iter()
        .copied()
        .find(|&m| {
            m != to
                && !blocked.contains(&m)
                && graph.is_adjacent(m, to)
                && mid.test(state.territory(m))
        })
        .and_then(|m| Route::from_steps(vec![from, m, to]))
}

/// Hops from `t` to the nearest enemy.
///
/// With `land` set this is enemy-owned passable land reached over allied
/// passable land. Otherwise it is the nearest water holding units hostile
/// to `player`, reached over water only, so enemy coastline does not count.
/// `None` when `t` is impassable or nothing matches.
pub fn distance_to_enemy(
    state: &GameState,
    t: TerritoryId,
    player: PlayerId,
    land: bool,
) -> Option<u32> {
    if state.try_territory(t).map_or(true, |here| here.impassable) {
        return None;
    }
    let (end, route_through) = if land {
        (
            terr::is_enemy_land(state, player),
            terr::is_allied(state, player).and(terr::is_passable_land(state)),
        )
    } else {
        (
            terr::is_water().and(terr::has_units_matching(state, unit::is_enemy(state, player))),
            terr::is_water(),
        )
    };
    nearest(state, t, &end, &route_through).map(|r| r.len() as u32)
}

/// Sea route from `start` toward `dest` avoiding hostile fleets and
/// forbidden canals, truncated to `max_hops`.
///
/// When `attacking`, the destination may itself hold hostile units.
/// Returns `None` if either end is land or no route exists.
pub fn max_sea_route(
    state: &GameState,
    start: TerritoryId,
    dest: TerritoryId,
    player: PlayerId,
    attacking: bool,
    max_hops: u32,
) -> Option<Route> {
    if !state.territory(start).is_water || !state.territory(dest).is_water {
        return None;
    }
    let open = terr::is_open_sea(state, player);
    let mut route = state.graph().route_by_step(start, dest, |from, to| {
        let ok = open.test(state.territory(to)) || (attacking && to == dest);
        ok && !state.canal_blocks(from, to, player)
    })?;
    route.truncate(max_hops as usize);
    Some(route)
}
