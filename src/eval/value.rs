//! Unit value and factory placement.
//!
//! A unit type is worth what the cheapest production rule charges for it;
//! a type nobody can buy is worth nothing.

use std::cmp::Reverse;
use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use super::rank::has_enemy_land_neighbor;
use crate::board::{GameState, PlayerId, TerritoryId, UnitId, UnitTypeId};
use crate::combat::{estimate_battle, score, BattleSide, Domain, EstimatorConfig, UnitCounts};
use crate::matches::{terr, unit};
use crate::search::{distance_to_enemy, exact_neighbors, nearest};

/// Value a cautious attacker is willing to lose beyond what it takes.
const TRADE_MARGIN: i64 = -5;
const AGGRESSIVE_TRADE_MARGIN: i64 = -2;
/// Extra loss accepted when the attacker is expected to win.
const WINNING_SLACK: i64 = 7;
/// Neutral land is worth this many turns of its production.
const NEUTRAL_PRODUCTION_MULTIPLIER: u32 = 3;
/// Farthest an enemy factory may be from an inland site.
const FACTORY_REACH: usize = 8;

/// Cheapest purchase cost of every buyable unit type.
pub fn unit_costs(state: &GameState) -> HashMap<UnitTypeId, u32> {
    let mut costs: HashMap<UnitTypeId, u32> = HashMap::new();
    for rule in state.production_rules() {
        costs
            .entry(rule.unit_type)
            .and_modify(|c| *c = (*c).min(rule.cost))
            .or_insert(rule.cost);
    }
    costs
}

/// Value of a tally of units.
pub fn tuv(counts: &UnitCounts, costs: &HashMap<UnitTypeId, u32>) -> u32 {
    counts
        .iter()
        .map(|(ut, &n)| n * costs.get(ut).copied().unwrap_or(0))
        .sum()
}

/// Value of each player's units that are not ships. Every player in the
/// snapshot has an entry.
pub fn player_tuv(state: &GameState) -> HashMap<PlayerId, u32> {
    let costs = unit_costs(state);
    let mut totals: HashMap<PlayerId, u32> = state.players().iter().map(|p| (p.id, 0)).collect();
    for u in state.units() {
        if state.type_of(u).is_sea {
            continue;
        }
        *totals.entry(u.owner).or_insert(0) += costs.get(&u.unit_type).copied().unwrap_or(0);
    }
    totals
}

/// Whether sending `attackers` against `defenders` in `target` is worth
/// the expected losses.
///
/// One battle estimate decides the outcome. A win is always taken when the
/// defenders are worth nothing or are badly outmatched. Otherwise the
/// value `player` loses, less the target's production on a win, is
/// compared with the value the defender loses; `aggressive` narrows the
/// margin demanded. Neutral land has no defender value but counts its
/// production three times.
#[allow(clippy::too_many_arguments)]
pub fn attack_trades_favorably<R: Rng + ?Sized>(
    state: &GameState,
    target: TerritoryId,
    player: PlayerId,
    attackers: &[UnitId],
    defenders: &[UnitId],
    aggressive: bool,
    transports_first: bool,
    rng: &mut R,
    config: &EstimatorConfig,
) -> bool {
    let here = state.territory(target);
    let domain = Domain::of(here);
    let neutral = here.is_neutral();
    let defender = defenders
        .first()
        .map(|&d| state.unit(d).owner)
        .or(here.owner)
        .unwrap_or(player);

    let costs = unit_costs(state);
    let ours = BattleSide::from_units(state, player, attackers);
    let theirs = BattleSide::from_units(state, defender, defenders);
    let outcome = estimate_battle(state, &ours, &theirs, domain, rng, config);
    let won = outcome.attacker_wins;

    let their_value = |counts: &UnitCounts| if neutral { 0 } else { tuv(counts, &costs) };
    let their_before = their_value(&theirs.units);
    let their_lost = their_before.saturating_sub(their_value(&outcome.defenders)) as i64;
    let mut production = here.production;
    if neutral {
        production *= NEUTRAL_PRODUCTION_MULTIPLIER;
    }
    let my_lost = tuv(&ours.units, &costs).saturating_sub(tuv(&outcome.attackers, &costs)) as i64
        - if won { production as i64 } else { 0 };
    let margin = if aggressive { AGGRESSIVE_TRADE_MARGIN } else { TRADE_MARGIN };
    debug!(
        territory = %here.name,
        won,
        my_lost,
        their_lost,
        margin,
        "weighed attack"
    );

    if won {
        let defence = score(state, defenders, false, domain, transports_first);
        let offence = score(state, attackers, true, domain, transports_first);
        if their_before == 0 || defence * 5.0 + 10.0 < offence {
            return true;
        }
        if my_lost <= their_lost + WINNING_SLACK + margin {
            return true;
        }
    }
    my_lost < their_lost + margin
}

fn land_route_to_enemy_capital(state: &GameState, t: TerritoryId, player: PlayerId) -> bool {
    let land = terr::is_passable_land(state);
    state.enemy_capitals(player).into_iter().any(|cap| {
        state
            .graph()
            .route(t, cap, |n| land.test(state.territory(n)))
            .is_some()
    })
}

/// Hops over passable land to the nearest enemy factory.
fn enemy_factory_distance(state: &GameState, t: TerritoryId, player: PlayerId) -> Option<usize> {
    nearest(
        state,
        t,
        &terr::is_enemy_factory(state, player),
        &terr::is_passable_land(state),
    )
    .map(|r| r.len())
}

fn coastal_value(state: &GameState, t: TerritoryId, player: PlayerId) -> i32 {
    let mut value = 0;
    if land_route_to_enemy_capital(state, t, player) {
        value += 2;
    }
    if enemy_factory_distance(state, t, player).is_some() {
        value += 2;
    }
    let enemy_land = terr::is_enemy_land(state, player);
    let allied_land = terr::is_allied(state, player).and(terr::is_passable_land(state));
    value += match nearest(state, t, &enemy_land, &allied_land) {
        Some(r) => 10 - r.len() as i32,
        None => match nearest(state, t, &enemy_land, &terr::is_water()) {
            Some(r) => 8 - r.len() as i32,
            None => -115,
        },
    };
    let production = state.territory(t).production as i32;
    value += 4 * production;
    let exposed = state
        .graph()
        .neighbors(t)
        .iter()
        .filter(|&&n| enemy_land.test(state.territory(n)))
        .count() as i32;
    value -= 15 * exposed;
    if production < 2 {
        value -= 100;
    }
    if production < 1 {
        value -= 100;
    }
    value
}

fn inland_value(state: &GameState, t: TerritoryId, player: PlayerId) -> i32 {
    let mut value = 0;
    if land_route_to_enemy_capital(state, t, player) {
        value += 3;
    }
    if enemy_factory_distance(state, t, player).is_some() {
        value += 1;
    }
    value += match distance_to_enemy(state, t, player, true) {
        Some(d) => 10 - d as i32,
        None => distance_to_enemy(state, t, player, false).map_or(0, |d| 5 - d as i32),
    };
    value + 4 * state.territory(t).production as i32
}

/// Attack strength of the enemy units standing in `ring`.
fn enemy_strength_in(state: &GameState, ring: &[TerritoryId], player: PlayerId) -> f32 {
    let enemy = unit::is_enemy(state, player);
    ring.iter()
        .map(|&t| {
            let theirs: Vec<UnitId> = state
                .units_in(t)
                .filter(|u| enemy.test(u))
                .map(|u| u.id)
                .collect();
            score(state, &theirs, true, Domain::Land, false)
        })
        .sum()
}

/// Defence of `t` from `player`'s own units there plus allied units on
/// the neighbouring land.
fn local_defence(state: &GameState, t: TerritoryId, player: PlayerId) -> f32 {
    let mine: Vec<UnitId> = state
        .units_in(t)
        .filter(|u| u.owner == player)
        .map(|u| u.id)
        .collect();
    let allied = unit::is_allied(state, player);
    let mut defence = score(state, &mine, false, Domain::Land, false);
    for &n in state.graph().neighbors(t) {
        if !state.territory(n).is_land() {
            continue;
        }
        let friends: Vec<UnitId> = state
            .units_in(n)
            .filter(|u| allied.test(u))
            .map(|u| u.id)
            .collect();
        defence += score(state, &friends, false, Domain::Land, false);
    }
    defence
}

fn safe_inland_site(state: &GameState, t: TerritoryId, player: PlayerId) -> bool {
    let production = state.territory(t).production as f32;
    if production < 2.0 || has_enemy_land_neighbor(state, t, player) {
        return false;
    }
    let local = local_defence(state, t, player);
    let two = enemy_strength_in(state, &exact_neighbors(state, t, 2, false), player);
    let three = enemy_strength_in(state, &exact_neighbors(state, t, 3, false), player);
    if two > production * 3.0 + local || two + three > (production * 8.0 + local) * 4.0 {
        return false;
    }
    let enemy_land = terr::is_enemy_land(state, player);
    let allied_land = terr::is_allied(state, player).and(terr::is_passable_land(state));
    if nearest(state, t, &enemy_land, &allied_land).is_none() {
        return false;
    }
    enemy_factory_distance(state, t, player).is_some_and(|d| d <= FACTORY_REACH)
        && land_route_to_enemy_capital(state, t, player)
}

/// Where `player` should build its next factory, if anywhere.
///
/// Candidates are `player`'s passable land without a factory of its own.
/// With `coastal` only sites touching water are considered and the best
/// scored one is returned: production and closeness to enemy land count
/// for it, bordering enemy land counts heavily against it. Otherwise sites
/// are tried from the highest inland score down, and the first one that
/// produces at least two, borders no enemy, is not outgunned by the
/// enemy two and three hops out, and can reach both an enemy factory and
/// an enemy capital over land is chosen.
pub fn find_factory_territory(
    state: &GameState,
    player: PlayerId,
    coastal: bool,
) -> Option<TerritoryId> {
    let graph = state.graph();
    let own_factory = unit::owned_by(player).and(unit::can_produce(state));
    let mut candidates: Vec<TerritoryId> = state
        .territories()
        .iter()
        .filter(|t| t.owner == Some(player) && t.is_land() && !t.impassable)
        .filter(|t| !state.units_in(t.id).any(|u| own_factory.test(u)))
        .map(|t| t.id)
        .collect();

    let site = if coastal {
        candidates.retain(|&t| graph.neighbors(t).iter().any(|&n| state.territory(n).is_water));
        let mut best: Option<(TerritoryId, i32)> = None;
        for t in candidates {
            let value = coastal_value(state, t, player);
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((t, value));
            }
        }
        best.map(|(t, _)| t)
    } else {
        candidates.sort_by_cached_key(|&t| Reverse(inland_value(state, t, player)));
        candidates
            .into_iter()
            .find(|&t| safe_inland_site(state, t, player))
    };
    debug!(player = player.0, coastal, site = ?site, "picked factory site");
    site
}
