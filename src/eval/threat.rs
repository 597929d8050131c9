//! Potential attacker strength.
//!
//! Estimates how hard each opposing player could hit a territory next turn
//! by adding up five sources: units already adjacent, blitzers two hops
//! out, ships within sailing range, planes that can strike and still land,
//! and troops that could be ferried in by transport. The per-player totals
//! are then folded into one coalition figure.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::debug;

use super::invite::sort_transport_units;
use crate::board::{GameState, PlayerId, TerritoryId, UnitId};
use crate::combat::{air_score, score, Domain};
use crate::matches::{terr, unit, TerritoryPred};
use crate::search::{
    max_sea_route, plane_attackers_that_can_land, reachable_units_within_movement, ReachOptions,
};

/// Returned for a target that is not on the map.
pub const UNKNOWN_TARGET_STRENGTH: f32 = -1000.0;

/// Weight given to every enemy other than the strongest.
pub const DEFAULT_COALITION_DISCOUNT: f32 = 0.40;

/// Infantry slots per transport in the load model.
const TRANSPORT_INFANTRY_SLOTS: i32 = 2;
/// Non-infantry slots per transport in the load model.
const TRANSPORT_OTHER_SLOTS: i32 = 1;

/// Knobs for [`potential_attacker_strength`].
#[derive(Debug, Clone)]
pub struct PotentialOpts {
    /// Score transports as if their cargo capacity counted.
    pub transports_first: bool,
    /// Drop an enemy's air strength when nothing else of theirs can reach.
    pub ignore_only_planes: bool,
    /// Territories whose units are left out (e.g. already attacked).
    pub ignore: HashSet<TerritoryId>,
    pub coalition_discount: f32,
    pub blitz_hops: u32,
    pub sea_hops: u32,
}

impl Default for PotentialOpts {
    fn default() -> Self {
        PotentialOpts {
            transports_first: false,
            ignore_only_planes: false,
            ignore: HashSet::new(),
            coalition_discount: DEFAULT_COALITION_DISCOUNT,
            blitz_hops: 2,
            sea_hops: 3,
        }
    }
}

/// Strongest value at full weight plus every other at `discount`.
pub fn combine_coalition(strengths: &[f32], discount: f32) -> f32 {
    let Some(max) = strengths.iter().copied().reduce(f32::max) else {
        return 0.0;
    };
    let rest: f32 = strengths.iter().sum::<f32>() - max;
    max + discount * rest
}

/// Attack strength each player opposed to `viewpoint` could bring against
/// `target`, in player-table order. `None` if `target` is not on the map.
pub fn enemy_strengths(
    state: &GameState,
    target: TerritoryId,
    viewpoint: PlayerId,
    opts: &PotentialOpts,
) -> Option<Vec<(PlayerId, f32)>> {
    if !state.graph().contains(target) {
        return None;
    }
    Some(
        state
            .enemies_of(viewpoint)
            .into_iter()
            .map(|e| (e, single_enemy_strength(state, target, e, opts)))
            .collect(),
    )
}

/// Coalition strength of every player opposed to `viewpoint` against
/// `target`.
pub fn potential_attacker_strength(
    state: &GameState,
    target: TerritoryId,
    viewpoint: PlayerId,
    opts: &PotentialOpts,
) -> f32 {
    match enemy_strengths(state, target, viewpoint, opts) {
        Some(per_enemy) => {
            let values: Vec<f32> = per_enemy.iter().map(|&(_, s)| s).collect();
            combine_coalition(&values, opts.coalition_discount)
        }
        None => UNKNOWN_TARGET_STRENGTH,
    }
}

/// Strength of the units in `t` that belong to `player`, or to anyone on
/// `player`'s side when `allied`, fighting in `t`'s domain.
pub fn strength_of_territory(
    state: &GameState,
    t: TerritoryId,
    player: PlayerId,
    attacking: bool,
    allied: bool,
    transports_first: bool,
) -> f32 {
    let ours: Vec<UnitId> = state
        .units_in(t)
        .filter(|u| {
            if allied {
                state.is_allied(player, u.owner)
            } else {
                u.owner == player
            }
        })
        .map(|u| u.id)
        .collect();
    score(state, &ours, attacking, Domain::of(state.territory(t)), transports_first)
}

/// Radius searched for fleets by [`ship_threat_to_territory`].
const SHIP_THREAT_RADIUS: u32 = 4;

/// Net number of hostile warships and planes that can reach the waters
/// around `t`.
///
/// A zone within four hops counts when its slowest ship can sail into one
/// of the water territories next to `t` (or `t` itself, if it is water).
/// Hostile non-transport ships and planes count one each, two-hit ships one
/// extra; `player`'s side subtracts its warships and carrier planes the same
/// way. Transports net out separately and add half a warship each when
/// `transports_first`. `None` if no water touches `t`.
pub fn ship_threat_to_territory(
    state: &GameState,
    t: TerritoryId,
    player: PlayerId,
    transports_first: bool,
) -> Option<i32> {
    let graph = state.graph();
    if !graph.contains(t) {
        return None;
    }
    let waters = graph.neighbors_matching(t, |n| state.territory(n).is_water);
    if waters.is_empty() {
        return None;
    }

    let mut hostile_zones: Vec<TerritoryId> = Vec::new();
    let mut friendly_zones: Vec<TerritoryId> = Vec::new();
    for zone in graph.neighbors_within(t, SHIP_THREAT_RADIUS) {
        if !state.territory(zone).is_water {
            continue;
        }
        let Some(reach) = state
            .units_in(zone)
            .filter(|u| state.type_of(u).is_sea)
            .map(|u| u.movement_left)
            .min()
        else {
            continue;
        };
        let reaches = |side: PlayerId| {
            waters.iter().any(|&w| {
                max_sea_route(state, zone, w, side, true, reach).is_some_and(|r| r.end() == w)
            })
        };
        let hostile_owner = state
            .units_in(zone)
            .map(|u| u.owner)
            .find(|&o| !state.is_allied(player, o));
        if hostile_owner.is_some_and(|e| reaches(e)) {
            hostile_zones.push(zone);
        }
        if reaches(player) {
            friendly_zones.push(zone);
        }
    }
    if state.territory(t).is_water {
        hostile_zones.push(t);
        friendly_zones.push(t);
    }

    let mut warships = 0i32;
    let mut transports = 0i32;
    let mut tally = |zones: &[TerritoryId], hostile: bool| {
        let sign = if hostile { 1 } else { -1 };
        for &zone in zones {
            for u in state.units_in(zone) {
                if state.is_allied(player, u.owner) == hostile {
                    continue;
                }
                let ut = state.type_of(u);
                if ut.is_sea && ut.is_transport() {
                    transports += sign;
                    continue;
                }
                let counts = if hostile {
                    ut.is_sea || ut.is_air
                } else {
                    ut.is_sea || ut.can_land_on_carrier()
                };
                if counts {
                    warships += sign;
                    if ut.is_sea && ut.is_two_hit {
                        warships += sign;
                    }
                }
            }
        }
    };
    tally(&hostile_zones, true);
    tally(&friendly_zones, false);
    if transports_first {
        warships += transports / 2;
    }
    Some(warships)
}

/// [`potential_attacker_strength`] for many territories at once.
pub fn threat_map(
    state: &GameState,
    viewpoint: PlayerId,
    territories: &[TerritoryId],
    opts: &PotentialOpts,
) -> HashMap<TerritoryId, f32> {
    let map: HashMap<TerritoryId, f32> = territories
        .par_iter()
        .map(|&t| (t, potential_attacker_strength(state, t, viewpoint, opts)))
        .collect();
    debug!(
        player = viewpoint.0,
        territories = map.len(),
        "computed threat map"
    );
    map
}

fn single_enemy_strength(
    state: &GameState,
    target: TerritoryId,
    e: PlayerId,
    opts: &PotentialOpts,
) -> f32 {
    let graph = state.graph();
    let here = state.territory(target);
    let domain = Domain::of(here);
    let tf = opts.transports_first;

    // Units of `e` that would take part in a sea fight.
    let mut water_units: Vec<UnitId> = Vec::new();
    let mut checked: HashSet<TerritoryId> = HashSet::new();
    let mut adjacent = 0.0;
    for &n in graph.neighbors(target) {
        if state.territory(n).is_water != here.is_water || opts.ignore.contains(&n) {
            continue;
        }
        let theirs: Vec<UnitId> = state
            .units_in(n)
            .filter(|u| u.owner == e)
            .map(|u| u.id)
            .collect();
        adjacent += score(state, &theirs, true, domain, tf);
        water_units.extend(theirs);
        checked.insert(n);
    }

    let mut blitz = 0.0;
    let mut ships = 0.0;
    if here.is_land() {
        blitz = blitz_strength(state, target, e, opts.blitz_hops);
    } else {
        let pred = unit::owned_by(e)
            .and(unit::is_sea(state))
            .and(unit::can_move());
        let found = reachable_units_within_movement(
            state,
            target,
            opts.sea_hops,
            &pred,
            &terr::is_open_sea(state, e),
            &opts.ignore,
            &ReachOptions {
                ignore_distances: vec![1],
                canal_player: Some(e),
            },
        );
        let ids = found.unit_ids();
        ships = score(state, &ids, true, Domain::Sea, tf);
        water_units.extend(ids);
    }

    let fighter_range = state
        .units()
        .iter()
        .filter(|u| u.owner == e && u.can_move() && state.type_of(u).is_air)
        .map(|u| u.movement_left)
        .max()
        .unwrap_or(0)
        .saturating_sub(1);
    let planes =
        plane_attackers_that_can_land(state, target, fighter_range, e, &opts.ignore, &checked);
    let air = air_score(state, &planes, true);

    let amphibious = if here.is_land() {
        amphibious_strength(state, target, e, tf)
    } else {
        0.0
    };

    let mut total = adjacent + blitz + ships + amphibious;
    if !opts.ignore_only_planes || total > 0.0 {
        total += air;
    }
    if here.is_water
        && !water_units
            .iter()
            .any(|&u| !state.type_of(state.unit(u)).is_transport())
    {
        return 0.0;
    }
    total
}

/// Blitz-capable units of `e` that can reach `target` through land free of
/// units hostile to `e`, not counting those already adjacent.
pub(crate) fn blitz_strength(state: &GameState, target: TerritoryId, e: PlayerId, hops: u32) -> f32 {
    let pred = unit::owned_by(e)
        .and(unit::can_blitz(state))
        .and(unit::can_move());
    let route = terr::has_no_enemy_units(state, e).and(terr::is_passable_land(state));
    let found = reachable_units_within_movement(
        state,
        target,
        hops,
        &pred,
        &route,
        &HashSet::new(),
        &ReachOptions {
            ignore_distances: vec![1],
            canal_player: None,
        },
    );
    score(state, &found.unit_ids(), true, Domain::Land, true)
}

/// Land strength `e` could ferry to `target` with transports in range.
fn amphibious_strength(state: &GameState, target: TerritoryId, e: PlayerId, tf: bool) -> f32 {
    let graph = state.graph();
    let landings = graph.neighbors_matching(target, |t| state.territory(t).is_water);
    if landings.is_empty() {
        return 0.0;
    }
    let reach = state
        .units()
        .iter()
        .filter(|u| u.owner == e && u.can_move() && state.type_of(u).is_transport())
        .map(|u| u.movement_left)
        .max()
        .unwrap_or(0);
    if reach == 0 {
        return 0.0;
    }

    let transportable = unit::owned_by(e)
        .and(unit::is_transportable(state))
        .and(unit::can_move());
    let allied_to_e: TerritoryPred<'_> = terr::is_allied(state, e);
    let mut already_loaded: HashSet<UnitId> = HashSet::new();
    let mut total = 0.0;

    for zone in graph.neighbors_within(target, reach) {
        if !state.territory(zone).is_water {
            continue;
        }
        let transports: Vec<UnitId> = state
            .units_in(zone)
            .filter(|u| u.owner == e && u.can_move() && state.type_of(u).is_transport())
            .map(|u| u.id)
            .collect();
        if transports.is_empty() {
            continue;
        }
        let can_land = landings.iter().any(|&w| {
            w == zone
                || max_sea_route(state, zone, w, e, true, reach).is_some_and(|r| r.end() == w)
        });
        if !can_land {
            continue;
        }

        let mut loaded: Vec<UnitId> = Vec::new();
        let (mut inf_slots, mut other_slots) = (0i32, 0i32);
        for &t in &transports {
            let (mut inf, mut other) = (TRANSPORT_INFANTRY_SLOTS, TRANSPORT_OTHER_SLOTS);
            for &cargo in state.transports().transporting(t) {
                inf -= 1;
                if !state.type_of(state.unit(cargo)).is_infantry {
                    other -= 1;
                }
                loaded.push(cargo);
            }
            inf_slots += inf;
            other_slots += other;
        }

        for shore in graph.neighbors_matching(zone, |t| allied_to_e.test(state.territory(t))) {
            let waiting: Vec<UnitId> = state
                .units_in(shore)
                .filter(|u| transportable.test(u) && !already_loaded.contains(&u.id))
                .map(|u| u.id)
                .collect();
            for u in sort_transport_units(state, &waiting) {
                let is_inf = state.type_of(state.unit(u)).is_infantry;
                if is_inf && inf_slots > 0 {
                    inf_slots -= 1;
                } else if !is_inf && inf_slots > 0 && other_slots > 0 {
                    inf_slots -= 1;
                    other_slots -= 1;
                } else {
                    continue;
                }
                loaded.push(u);
                already_loaded.insert(u);
            }
        }
        total += score(state, &loaded, true, Domain::Land, tf);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GameStateBuilder, UnitType};

    #[test]
    fn coalition_discounts_all_but_the_strongest() {
        assert!((combine_coalition(&[10.0, 4.0], 0.4) - 11.6).abs() < 1e-5);
        assert!((combine_coalition(&[4.0, 10.0], 0.4) - 11.6).abs() < 1e-5);
        assert_eq!(combine_coalition(&[], 0.4), 0.0);
        assert_eq!(combine_coalition(&[3.0], 0.4), 3.0);
    }

    #[test]
    fn unknown_target_is_flagged() {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        b.add_land("only", Some(red), 1);
        let state = b.build().unwrap();
        let s = potential_attacker_strength(
            &state,
            TerritoryId(99),
            red,
            &PotentialOpts::default(),
        );
        assert_eq!(s, UNKNOWN_TARGET_STRENGTH);
    }

    /// `target` (red) borders `front` (blue, 1 tank) which borders `rear`
    /// (blue, 1 tank). `sea` touches `target` and `port` (blue, infantry),
    /// with a blue transport in `sea`.
    fn invasion() -> (GameState, TerritoryId, PlayerId) {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let blue = b.add_player("blue", 0);
        let tank = b.add_unit_type(UnitType {
            can_blitz: true,
            ..UnitType::land("tank", 3, 3, 2)
        });
        let infantry = b.add_unit_type(UnitType {
            is_infantry: true,
            artillery_supportable: true,
            ..UnitType::land("infantry", 1, 2, 1)
        });
        let transport = b.add_unit_type(UnitType {
            transport_capacity: 2,
            ..UnitType::sea("transport", 0, 1, 2)
        });
        let target = b.add_land("target", Some(red), 2);
        let front = b.add_land("front", Some(blue), 1);
        let rear = b.add_land("rear", Some(blue), 1);
        let sea = b.add_sea("sea");
        let port = b.add_land("port", Some(blue), 1);
        b.connect(target, front)
            .connect(front, rear)
            .connect(target, sea)
            .connect(sea, port);
        b.add_unit(front, tank, blue);
        b.add_unit(rear, tank, blue);
        b.add_unit(sea, transport, blue);
        b.add_units(port, infantry, blue, 3);
        (b.build().unwrap(), target, red)
    }

    #[test]
    fn sums_adjacent_blitz_and_amphibious() {
        let (state, target, red) = invasion();
        let per_enemy = enemy_strengths(&state, target, red, &PotentialOpts::default()).unwrap();
        assert_eq!(per_enemy.len(), 1);
        // front tank 4, rear tank blitzing 4, two ferried infantry 2 + 2
        assert!((per_enemy[0].1 - 12.0).abs() < 1e-5, "got {}", per_enemy[0].1);
    }

    #[test]
    fn ignored_territories_drop_out() {
        let (state, target, red) = invasion();
        let front = state.find_territory("front").unwrap();
        let opts = PotentialOpts {
            ignore: [front].into_iter().collect(),
            ..PotentialOpts::default()
        };
        let s = potential_attacker_strength(&state, target, red, &opts);
        assert!((s - 8.0).abs() < 1e-5, "got {s}");
    }

    #[test]
    fn transports_alone_do_not_threaten_water() {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let blue = b.add_player("blue", 0);
        let transport = b.add_unit_type(UnitType {
            transport_capacity: 2,
            ..UnitType::sea("transport", 0, 1, 2)
        });
        let target = b.add_sea("target");
        let next = b.add_sea("next");
        b.connect(target, next);
        b.add_unit(next, transport, blue);
        let lone = b.build().unwrap();
        assert_eq!(
            potential_attacker_strength(&lone, target, red, &PotentialOpts::default()),
            0.0
        );

        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let blue = b.add_player("blue", 0);
        let transport = b.add_unit_type(UnitType {
            transport_capacity: 2,
            ..UnitType::sea("transport", 0, 1, 2)
        });
        let destroyer = b.add_unit_type(UnitType::sea("destroyer", 2, 2, 2));
        let target = b.add_sea("target");
        let next = b.add_sea("next");
        b.connect(target, next);
        b.add_unit(next, transport, blue);
        b.add_unit(next, destroyer, blue);
        let escorted = b.build().unwrap();
        assert!(potential_attacker_strength(&escorted, target, red, &PotentialOpts::default()) > 0.0);
    }

    #[test]
    fn territory_strength_by_owner_or_side() {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let pink = b.add_player("pink", 0);
        b.ally(red, pink);
        let infantry = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
        let t = b.add_land("t", Some(red), 1);
        b.add_unit(t, infantry, red);
        b.add_unit(t, infantry, pink);
        let state = b.build().unwrap();

        assert_eq!(strength_of_territory(&state, t, red, false, false, false), 3.0);
        assert_eq!(strength_of_territory(&state, t, red, false, true, false), 6.0);
        assert_eq!(strength_of_territory(&state, t, red, true, true, false), 4.0);
    }

    /// coast - bay - mid - lurk, with a red destroyer in `bay` and a blue
    /// destroyer, battleship and two transports in `lurk`.
    #[test]
    fn ship_threat_nets_out_both_fleets() {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let blue = b.add_player("blue", 0);
        let destroyer = b.add_unit_type(UnitType::sea("destroyer", 2, 2, 2));
        let battleship = b.add_unit_type(UnitType {
            is_two_hit: true,
            ..UnitType::sea("battleship", 4, 4, 2)
        });
        let transport = b.add_unit_type(UnitType {
            transport_capacity: 2,
            ..UnitType::sea("transport", 0, 1, 2)
        });
        let coast = b.add_land("coast", Some(red), 2);
        let inland = b.add_land("inland", Some(red), 1);
        let bay = b.add_sea("bay");
        let mid = b.add_sea("mid");
        let lurk = b.add_sea("lurk");
        b.connect(coast, bay)
            .connect(coast, inland)
            .connect(bay, mid)
            .connect(mid, lurk);
        b.add_unit(bay, destroyer, red);
        b.add_unit(lurk, destroyer, blue);
        b.add_unit(lurk, battleship, blue);
        b.add_units(lurk, transport, blue, 2);
        let state = b.build().unwrap();

        // destroyer 1 + battleship 2 - red destroyer 1
        assert_eq!(ship_threat_to_territory(&state, coast, red, false), Some(2));
        assert_eq!(ship_threat_to_territory(&state, coast, red, true), Some(3));
        assert_eq!(ship_threat_to_territory(&state, inland, red, false), None);
    }

    #[test]
    fn threat_map_matches_single_queries() {
        let (state, target, red) = invasion();
        let front = state.find_territory("front").unwrap();
        let opts = PotentialOpts::default();
        let map = threat_map(&state, red, &[target, front], &opts);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&target], potential_attacker_strength(&state, target, red, &opts));
    }
}
