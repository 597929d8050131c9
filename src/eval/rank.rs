//! Territory desirability ranking.
//!
//! Every passable land territory gets a scalar score from `player`'s point
//! of view. The score starts from shared terms (victory city, capital
//! routes, nearby factories, distance to the nearest enemy capital) and
//! then takes a branch depending on who holds the territory:
//!
//! - enemy land is valued for its production, its garrison and its air,
//!   plus a net-strength term that favours places we can win;
//! - allied land is valued as a staging area, more so when it is
//!   threatened or guards a factory;
//! - neutral land is only ranked when entering it is affordable, and always
//!   well below everything else.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, trace};

use super::invite::two_away_strength_not_counted;
use super::reorder::reorder_or_zero;
use super::threat::{potential_attacker_strength, strength_of_territory, PotentialOpts};
use crate::board::{GameState, PlayerId, Route, TerritoryId, UnitId};
use crate::combat::{score, Domain};
use crate::matches::{terr, unit, TerritoryPred};
use crate::search::nearest;

/// Knobs for [`rank_territories`].
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    /// Options for the enemy-potential query. Its `ignore` set is applied
    /// to the enemy side only; `ignore_only_planes` is always forced on.
    pub potential: PotentialOpts,
    /// Lift threatened allied factories to the best score around them.
    pub non_combat: bool,
}

/// Output of [`rank_territories`].
#[derive(Debug, Clone, Default)]
pub struct TerritoryRanking {
    pub scores: HashMap<TerritoryId, f32>,
    pub net_strength: HashMap<TerritoryId, f32>,
    /// Allied territories worth reinforcing, best first.
    pub friendly: Vec<TerritoryId>,
    /// Enemy land, best target first.
    pub enemy: Vec<TerritoryId>,
    /// Neutral land that can be entered, best first.
    pub neutral: Vec<TerritoryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Enemy,
    Friendly,
    /// Allied but not worth listing.
    Held,
    Neutral,
}

#[derive(Debug, Clone, Copy)]
struct Ranked {
    t: TerritoryId,
    bucket: Bucket,
    score: f32,
    net: f32,
    allied_factory: bool,
}

fn units_matching(state: &GameState, t: TerritoryId, allied_to: PlayerId, allied: bool) -> Vec<UnitId> {
    state
        .units_in(t)
        .filter(|u| state.is_allied(allied_to, u.owner) == allied)
        .map(|u| u.id)
        .collect()
}

/// True if a neighbor of `t` is passable enemy land.
pub(crate) fn has_enemy_land_neighbor(state: &GameState, t: TerritoryId, player: PlayerId) -> bool {
    let enemy_land = terr::is_enemy_land(state, player);
    state
        .graph()
        .neighbors(t)
        .iter()
        .any(|&n| enemy_land.test(state.territory(n)))
}

/// No passable, non-neutral land next to `t`.
fn is_island(state: &GameState, t: TerritoryId) -> bool {
    !state.graph().neighbors(t).iter().any(|&n| {
        let nt = state.territory(n);
        nt.is_land() && !nt.impassable && !nt.is_neutral()
    })
}

fn has_neighbor_matching(state: &GameState, t: TerritoryId, pred: &TerritoryPred<'_>) -> bool {
    state
        .graph()
        .neighbors(t)
        .iter()
        .any(|&n| pred.test(state.territory(n)))
}

/// Route over allied passable land to the nearest enemy land.
fn route_to_enemy_land(state: &GameState, t: TerritoryId, player: PlayerId) -> Option<Route> {
    let end = terr::is_enemy_land(state, player);
    let through = terr::is_allied(state, player).and(terr::is_passable_land(state));
    nearest(state, t, &end, &through)
}

fn potential(
    state: &GameState,
    t: TerritoryId,
    viewpoint: PlayerId,
    base: &PotentialOpts,
    with_ignore: bool,
) -> f32 {
    let opts = PotentialOpts {
        ignore_only_planes: true,
        ignore: if with_ignore {
            base.ignore.clone()
        } else {
            HashSet::new()
        },
        ..base.clone()
    };
    potential_attacker_strength(state, t, viewpoint, &opts)
}

/// True if an allied factory next to `t` could be overrun: the padded
/// enemy potential against it beats its garrison, even after counting half
/// of the allied strength around it.
pub fn threatened_allied_factory_neighbor(
    state: &GameState,
    t: TerritoryId,
    player: PlayerId,
) -> bool {
    let factory = terr::is_allied_factory(state, player);
    let allied = terr::is_allied(state, player);
    let opts = PotentialOpts::default();
    state
        .graph()
        .neighbors(t)
        .iter()
        .copied()
        .filter(|&f| factory.test(state.territory(f)))
        .any(|f| {
            let mut enemy = potential(state, f, player, &opts, false);
            enemy += enemy * 1.15 + if enemy > 2.0 { 3.0 } else { 0.0 };
            let garrison: Vec<UnitId> = state.territory(f).units.clone();
            let mut mine = score(state, &garrison, false, Domain::Land, false);
            if enemy > mine {
                let support: f32 = state
                    .graph()
                    .neighbors(f)
                    .iter()
                    .filter(|&&n| allied.test(state.territory(n)))
                    .map(|&n| {
                        let ours = units_matching(state, n, player, true);
                        score(state, &ours, false, Domain::Land, false)
                    })
                    .sum();
                mine += support * 0.5;
            }
            enemy > mine
        })
}

/// Allied capitals under enough pressure to deserve reinforcement.
///
/// Capitals opposed to `first_enemy` that an enemy of `player` holds while
/// bordering enemy land are front lines of their own and are skipped.
fn threatened_allied_capitals(
    state: &GameState,
    player: PlayerId,
    first_enemy: PlayerId,
    opts: &PotentialOpts,
) -> Vec<TerritoryId> {
    let passable = terr::is_passable(state);
    let enemy_land = terr::is_enemy_land(state, player);
    state
        .enemy_capitals(first_enemy)
        .into_iter()
        .filter(|&cap| {
            let here = state.territory(cap);
            if enemy_land.test(here) && has_enemy_land_neighbor(state, cap, player) {
                return false;
            }
            let pressure = potential(state, cap, player, opts, false);
            let held = strength_of_territory(state, cap, player, false, true, opts.transports_first);
            pressure >= held * 0.75 && pressure >= 1.0 && passable.test(here)
        })
        .collect()
}

/// Scores every land territory for `player`.
///
/// Returns an empty ranking when `player` is not in the snapshot or has no
/// enemies.
pub fn rank_territories(state: &GameState, player: PlayerId, opts: &RankOptions) -> TerritoryRanking {
    let Ok(me) = state.try_player(player) else {
        return TerritoryRanking::default();
    };
    let Some(&first_enemy) = state.enemies_of(player).first() else {
        return TerritoryRanking::default();
    };
    let popts = &opts.potential;
    let tf = popts.transports_first;
    let enemy_capitals = state.enemy_capitals(player);
    let graph = state.graph();

    let threatened_caps = threatened_allied_capitals(state, player, first_enemy, popts);
    let allied = terr::is_allied(state, player);
    let guards_capital: HashSet<TerritoryId> = threatened_caps
        .iter()
        .flat_map(|&c| graph.neighbors_matching(c, |n| allied.test(state.territory(n))))
        .collect();

    let passable = terr::is_passable(state);
    let passable_land = terr::is_passable_land(state);
    let enemy_land = terr::is_enemy_land(state, player);
    let enemy_factory = terr::is_enemy_factory(state, player);
    let allied_factory = terr::is_allied_factory(state, player);
    let enemy_unit = unit::is_enemy(state, player);
    let resources = me.resources;
    let charge = state.rules().neutral_charge;

    let rank_one = |t: TerritoryId| -> Option<Ranked> {
        let here = state.territory(t);
        if here.is_water || !passable.test(here) {
            return None;
        }
        let neutral = here.is_neutral();
        if neutral && charge > resources {
            return None;
        }

        let ours = potential(state, t, first_enemy, popts, false);
        let theirs = potential(state, t, player, popts, true);
        let production = here.production as f32;
        let island = is_island(state, t);

        let mut value = if here.victory_city { 2.0 } else { 0.0 };
        let cap_by_land = enemy_capitals.iter().any(|&c| {
            graph
                .distance_matching(t, c, |n| passable_land.test(state.territory(n)))
                .is_some()
        });
        if cap_by_land {
            value += 16.0;
            if !enemy_factory.test(here) && !allied_factory.test(here) {
                let to_factory = nearest(state, t, &enemy_factory, &passable_land);
                if let Some(r) = to_factory {
                    value = f32::max(value - 8.0, value - (r.len() as f32 - 1.0));
                }
            }
        }
        if has_neighbor_matching(state, t, &enemy_factory) {
            value += 3.0;
        }
        let cap_dist = enemy_capitals
            .iter()
            .filter_map(|&c| graph.distance_matching(t, c, |n| !state.territory(n).impassable))
            .min();
        if let Some(d) = cap_dist {
            value -= d as f32 - 1.0;
        }

        let ranked = if enemy_land.test(here) {
            let garrison: Vec<UnitId> = state
                .units_in(t)
                .filter(|u| enemy_unit.test(u))
                .map(|u| u.id)
                .collect();
            let defense = score(state, &garrison, false, Domain::Land, tf);
            value += production * 2.0;
            if ours > theirs + defense {
                value += production;
            }
            if island {
                value += 5.0;
            }
            value += 2.0 * state.units_in(t).filter(|u| state.type_of(u).is_air).count() as f32;
            if enemy_factory.test(here) {
                value += 4.0;
            }
            if has_neighbor_matching(state, t, &allied_factory) {
                value += 8.0;
            }
            if !has_enemy_land_neighbor(state, t, player) {
                value += production + 1.0;
            }
            let net = defense - ours + 0.5 * theirs;
            Ranked {
                t,
                bucket: Bucket::Enemy,
                score: value + net * 0.25,
                net,
                allied_factory: false,
            }
        } else if allied.test(here) {
            let contact = has_enemy_land_neighbor(state, t, player);
            let route = route_to_enemy_land(state, t, player);
            if island {
                value -= 5.0;
            }
            value += if contact { 2.0 } else { -2.0 };
            if guards_capital.contains(&t) {
                value += 8.0;
            }
            value += match &route {
                None => -20.0,
                Some(r) => f32::max(-10.0, -(r.len() as f32 - 2.0)) + production,
            };
            let garrison = units_matching(state, t, player, true);
            let held = score(state, &garrison, false, Domain::Land, tf);
            let has_factory = allied_factory.test(here);
            if has_factory {
                value += 4.0;
                if contact && theirs > 5.0 {
                    value += 3.0;
                }
            }
            let net = theirs - held - 0.5 * ours;
            let listed = (net > -15.0 && theirs > 2.0) || contact || route.is_some();
            Ranked {
                t,
                bucket: if listed { Bucket::Friendly } else { Bucket::Held },
                score: value + net * 0.5,
                net,
                allied_factory: has_factory,
            }
        } else if neutral {
            value -= 100.0;
            value += if has_enemy_land_neighbor(state, t, player) {
                1.0
            } else {
                -1.0
            };
            value += match route_to_enemy_land(state, t, player) {
                None => -1.0,
                Some(r) => -(r.len() as f32 - 1.0),
            };
            value += if production > 0.0 { production } else { -5.0 };
            let net = theirs - 0.5 * ours;
            Ranked {
                t,
                bucket: Bucket::Neutral,
                score: value + net * 0.5,
                net,
                allied_factory: false,
            }
        } else {
            return None;
        };
        trace!(territory = t.0, score = ranked.score, net = ranked.net, "ranked");
        Some(ranked)
    };

    let ranked: Vec<Ranked> = state
        .territories()
        .par_iter()
        .filter_map(|terr| rank_one(terr.id))
        .collect();

    let mut out = TerritoryRanking::default();
    let mut factories: Vec<TerritoryId> = threatened_caps;
    for r in &ranked {
        out.scores.insert(r.t, r.score);
        out.net_strength.insert(r.t, r.net);
        match r.bucket {
            Bucket::Enemy => out.enemy.push(r.t),
            Bucket::Friendly => out.friendly.push(r.t),
            Bucket::Neutral => out.neutral.push(r.t),
            Bucket::Held => {}
        }
        if r.allied_factory && !factories.contains(&r.t) {
            factories.push(r.t);
        }
    }

    if opts.non_combat {
        let allied_land = allied.clone().and(passable_land.clone());
        for f in factories {
            let Some(&own) = out.scores.get(&f) else {
                continue;
            };
            if !has_enemy_land_neighbor(state, f, player) {
                continue;
            }
            let best = graph
                .neighbors(f)
                .iter()
                .filter(|&&n| allied_land.test(state.territory(n)))
                .filter_map(|n| out.scores.get(n).copied())
                .fold(own, f32::max);
            out.scores.insert(f, best + 1.0);
        }
    }

    reorder_or_zero(&mut out.friendly, &out.scores, true);
    reorder_or_zero(&mut out.enemy, &out.scores, true);
    reorder_or_zero(&mut out.neutral, &out.scores, true);
    debug!(
        player = player.0,
        friendly = out.friendly.len(),
        enemy = out.enemy.len(),
        neutral = out.neutral.len(),
        "ranked territories"
    );
    out
}

/// Scores allied coastal territory as a drop point for transported
/// reinforcements heading toward the nearest enemy capital.
///
/// Returns an empty map when `player` has no capital, no enemies or no
/// enemy capital still standing.
pub fn rank_amphibious_reinforcement(
    state: &GameState,
    player: PlayerId,
    opts: &PotentialOpts,
) -> HashMap<TerritoryId, f32> {
    let mut out = HashMap::new();
    let Some(&first_enemy) = state.enemies_of(player).first() else {
        return out;
    };
    let Some(home) = state.capital_of(player) else {
        return out;
    };
    let graph = state.graph();
    let Some(goal) = state
        .enemy_capitals(player)
        .into_iter()
        .filter_map(|c| graph.distance(home, c).map(|d| (d, c)))
        .min_by_key(|&(d, _)| d)
        .map(|(_, c)| c)
    else {
        return out;
    };

    let tf = opts.transports_first;
    let allied = terr::is_allied(state, player);
    let passable_land = terr::is_passable_land(state);
    let enemy_factory = terr::is_enemy_factory(state, player);
    let allied_factory = terr::is_allied_factory(state, player);

    for here in state.territories() {
        let t = here.id;
        if !allied.test(here) || here.impassable || here.is_water {
            continue;
        }
        let coastal = graph.neighbors(t).iter().any(|&n| state.territory(n).is_water);
        let by_land = graph
            .route(t, goal, |n| passable_land.test(state.territory(n)))
            .is_some();
        if !coastal || !by_land {
            continue;
        }

        let ours = potential(state, t, first_enemy, opts, false);
        let everything: Vec<UnitId> = here.units.clone();
        let local = score(state, &everything, false, Domain::Land, tf);
        let theirs = potential(state, t, player, opts, true);
        let production = here.production as f32;

        let mut value = if here.victory_city { 2.0 } else { 0.0 };
        if has_neighbor_matching(state, t, &enemy_factory) {
            value += 2.0;
        }
        if let Some(d) = graph.distance_matching(t, goal, |n| !state.territory(n).impassable) {
            value -= d as f32 - 1.0;
        }
        let near_factory = has_neighbor_matching(state, t, &allied_factory);
        if near_factory {
            let pressed = theirs > ours + local
                || theirs + two_away_strength_not_counted(state, player, t)
                    > (ours + local) * 1.05;
            if pressed {
                value += 15.0;
            }
        }
        let contact = has_enemy_land_neighbor(state, t, player);
        value += if contact { 1.0 } else { -1.0 };
        if contact && near_factory {
            value += 5.0;
        }
        match route_to_enemy_land(state, t, player) {
            None => value -= 1.0,
            Some(r) => value += production - (r.len() as f32 - 1.0),
        }
        let garrison = units_matching(state, t, player, true);
        let held = score(state, &garrison, false, Domain::Land, tf);
        if allied_factory.test(here) {
            value += 4.0;
            if contact && theirs > 5.0 {
                value += 3.0;
            }
        }
        let worth_drop =
            held + ours > (theirs - 3.0) * 0.8 && held + 0.8 * ours < 1.25 * (theirs + 3.0);
        value += if worth_drop { 5.0 } else { -2.0 };
        out.insert(t, value);
    }
    out
}
