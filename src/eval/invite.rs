//! Gathering units for an attack.
//!
//! The `invite_*` helpers walk the territories around a target and pull in
//! unused units of `player` until the strength they add exceeds what the
//! caller asked for. Each returned [`MoveRecommendation`] is one group of
//! units with the route it should take.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::threat::{potential_attacker_strength, strength_of_territory, PotentialOpts};
use crate::board::{GameState, PlayerId, Route, TerritoryId, Unit, UnitId};
use crate::combat::{score, unit_score, Domain};
use crate::matches::{terr, unit, TerritoryPred, UnitPred};
use crate::search::{exact_neighbors, max_sea_route, nearest, two_hop_route};

const SHIP_SEARCH_RADIUS: u32 = 4;
const PLANE_SEARCH_RADIUS: u32 = 4;
/// Farthest source zone for transports and escorts.
const TRANSPORT_SEARCH_RADIUS: u32 = 3;
const BOMBARD_SEARCH_RADIUS: u32 = 3;

/// A group of units and the route they should take.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecommendation {
    pub units: Vec<UnitId>,
    pub route: Route,
    /// Strength this group adds to the attack.
    pub strength: f32,
}

/// Total strength added by a list of recommendations.
pub fn total_strength(moves: &[MoveRecommendation]) -> f32 {
    moves.iter().map(|m| m.strength).sum()
}

/// Groups `units` by remaining movement, fastest group first. Empty groups
/// are omitted.
pub fn break_units_by_speed(state: &GameState, units: &[UnitId]) -> Vec<Vec<UnitId>> {
    let mut speeds: Vec<u32> = units.iter().map(|&u| state.unit(u).movement_left).collect();
    speeds.sort_unstable_by(|a, b| b.cmp(a));
    speeds.dedup();
    speeds
        .into_iter()
        .map(|speed| {
            units
                .iter()
                .copied()
                .filter(|&u| state.unit(u).movement_left == speed)
                .collect()
        })
        .collect()
}

/// Orders units for loading so that each artillery-supportable infantry
/// is followed by a partner: armor first, then artillery, then anything
/// else, each taken from the back of its list. Leftover artillery, others
/// and armor follow in input order.
pub fn sort_transport_units(state: &GameState, units: &[UnitId]) -> Vec<UnitId> {
    let mut infantry = Vec::new();
    let mut artillery = Vec::new();
    let mut armor = Vec::new();
    let mut others = Vec::new();
    for &u in units {
        let ut = state.type_of(state.unit(u));
        if ut.artillery_supportable {
            infantry.push(u);
        } else if ut.is_artillery {
            artillery.push(u);
        } else if ut.can_blitz {
            armor.push(u);
        } else {
            others.push(u);
        }
    }

    let mut sorted = Vec::with_capacity(units.len());
    for inf in infantry {
        sorted.push(inf);
        if let Some(partner) = armor
            .pop()
            .or_else(|| artillery.pop())
            .or_else(|| others.pop())
        {
            sorted.push(partner);
        }
    }
    sorted.extend(artillery);
    sorted.extend(others);
    sorted.extend(armor);
    sorted
}

fn enemy_units_around(
    state: &GameState,
    t: TerritoryId,
    player: PlayerId,
    already_attacked: &HashSet<TerritoryId>,
) -> usize {
    let enemy = unit::is_enemy(state, player);
    state
        .graph()
        .neighbors(t)
        .iter()
        .filter(|n| !already_attacked.contains(n))
        .map(|&n| state.units_in(n).filter(|u| enemy.test(u)).count())
        .sum()
}

/// Land units of `player` from adjacent allied territory that can attack
/// `target`, until their strength exceeds `required`.
///
/// Staging territories facing the fewest enemy units (outside
/// `already_attacked`) are drained first. Infantry is scored together with
/// the unit loaded after it so artillery support is counted.
pub fn invite_land_attack(
    state: &GameState,
    player: PlayerId,
    target: TerritoryId,
    required: f32,
    already_moved: &mut HashSet<UnitId>,
    already_attacked: &HashSet<TerritoryId>,
    attacking: bool,
) -> Vec<MoveRecommendation> {
    let staging_ok = terr::is_allied(state, player).and(terr::is_passable_land(state));
    let mut staging: Vec<TerritoryId> = exact_neighbors(state, target, 1, false)
        .into_iter()
        .filter(|&t| staging_ok.test(state.territory(t)))
        .collect();
    staging.sort_by_cached_key(|&t| enemy_units_around(state, t, player, already_attacked));

    let land_unit: UnitPred<'_> = unit::owned_by(player)
        .and(unit::is_land(state))
        .and(!unit::is_infrastructure(state))
        .and(unit::can_move())
        .and(UnitPred::new(|u| !state.type_of(u).is_aa));
    let land = terr::is_land();

    let mut moves = Vec::new();
    let mut total = 0.0;
    for from in staging {
        let Some(route) = state.graph().route(from, target, |t| land.test(state.territory(t)))
        else {
            continue;
        };
        let ready: Vec<UnitId> = state
            .units_in(from)
            .filter(|u| land_unit.test(u) && !already_moved.contains(&u.id))
            .map(|u| u.id)
            .collect();
        let sorted = sort_transport_units(state, &ready);

        let mut group = Vec::new();
        let mut group_strength = 0.0;
        let mut it = sorted.into_iter();
        while required > total {
            let Some(u) = it.next() else { break };
            let added = if state.type_of(state.unit(u)).is_infantry {
                match it.next() {
                    Some(partner) => {
                        let pair = [u, partner];
                        group.extend(pair);
                        score(state, &pair, attacking, Domain::Land, false)
                    }
                    None => {
                        group.push(u);
                        unit_score(state, u, attacking, Domain::Land, false)
                    }
                }
            } else {
                group.push(u);
                unit_score(state, u, attacking, Domain::Land, false)
            };
            total += added;
            group_strength += added;
        }
        if group.is_empty() {
            continue;
        }
        already_moved.extend(group.iter().copied());
        moves.push(MoveRecommendation {
            units: group,
            route,
            strength: group_strength,
        });
    }
    moves
}

/// Blitz units of `player` two hops from `target` that can run through an
/// empty intermediate territory into it, until their strength exceeds
/// `required`.
///
/// Unless `forced`, a staging territory next to enemy land units is left
/// alone so the blitzers keep covering it. In `non_combat` mode staging
/// territories only need an allied midpoint to qualify; the recommended
/// route always goes through territory free of enemy units.
#[allow(clippy::too_many_arguments)]
pub fn invite_blitz_attack(
    state: &GameState,
    player: PlayerId,
    target: TerritoryId,
    required: f32,
    already_moved: &mut HashSet<UnitId>,
    attacking: bool,
    non_combat: bool,
    forced: bool,
) -> Vec<MoveRecommendation> {
    let no_blocks = HashSet::new();
    let allied_mid: TerritoryPred<'_> =
        terr::is_allied(state, player).and(terr::is_passable_land(state));
    let clear_mid: TerritoryPred<'_> =
        terr::has_no_enemy_units(state, player).and(terr::is_passable_land(state));
    let qualify = if non_combat { &allied_mid } else { &clear_mid };

    let blitzer = unit::owned_by(player)
        .and(unit::can_blitz(state))
        .and(unit::can_move());
    let enemy_land_units = unit::is_enemy(state, player).and(unit::is_land(state));

    let mut moves = Vec::new();
    let mut total = 0.0;
    for from in exact_neighbors(state, target, 2, false) {
        if two_hop_route(state, from, target, qualify, &no_blocks).is_none() {
            continue;
        }
        if !forced {
            let exposed = state.graph().neighbors(from).iter().any(|&n| {
                state.units_in(n).any(|u| enemy_land_units.test(u))
            });
            if exposed {
                continue;
            }
        }
        let Some(route) = two_hop_route(state, from, target, &clear_mid, &no_blocks) else {
            continue;
        };

        let mut group = Vec::new();
        let mut group_strength = 0.0;
        for u in state.units_in(from) {
            if required <= total {
                break;
            }
            if !blitzer.test(u) || already_moved.contains(&u.id) {
                continue;
            }
            let s = unit_score(state, u.id, attacking, Domain::Land, false);
            total += s;
            group_strength += s;
            group.push(u.id);
        }
        if group.is_empty() {
            continue;
        }
        already_moved.extend(group.iter().copied());
        moves.push(MoveRecommendation {
            units: group,
            route,
            strength: group_strength,
        });
    }
    moves
}

struct Flotilla {
    route: Route,
    ships: Vec<UnitId>,
    ship_strength: f32,
    carriers: Vec<UnitId>,
    carrier_strength: f32,
}

impl Flotilla {
    fn strength(&self) -> f32 {
        self.ship_strength + self.carrier_strength
    }
}

/// Warships of `player` within four hops of the water territory `target`,
/// until their strength exceeds `required`.
///
/// Zones in `fought` are left alone. Each zone offers its warships first,
/// then its carriers together with the carrier planes beside them; the
/// carrier group only sails if every carrier can make the trip. The
/// weakest zones are drained first. Transports are left home unless
/// `include_transports`.
#[allow(clippy::too_many_arguments)]
pub fn invite_ship_attack(
    state: &GameState,
    player: PlayerId,
    target: TerritoryId,
    required: f32,
    already_moved: &mut HashSet<UnitId>,
    fought: &HashSet<TerritoryId>,
    attacking: bool,
    transports_first: bool,
    include_transports: bool,
) -> Vec<MoveRecommendation> {
    let graph = state.graph();
    if !graph.contains(target) || !state.territory(target).is_water {
        return Vec::new();
    }
    let ready = unit::owned_by(player).and(unit::can_move());

    let mut fleets: Vec<Flotilla> = Vec::new();
    for zone in graph.neighbors_within(target, SHIP_SEARCH_RADIUS) {
        if fought.contains(&zone) || !state.territory(zone).is_water {
            continue;
        }
        let mine: Vec<&Unit> = state
            .units_in(zone)
            .filter(|u| ready.test(u) && !already_moved.contains(&u.id))
            .collect();
        let reach = mine
            .iter()
            .filter(|u| state.type_of(u).is_sea)
            .map(|u| u.movement_left)
            .max()
            .unwrap_or(0);
        let Some(route) = max_sea_route(state, zone, target, player, attacking, reach)
            .filter(|r| r.end() == target)
        else {
            continue;
        };
        let hops = route.len() as u32;

        let mut ships = Vec::new();
        let mut carriers = Vec::new();
        let mut planes = Vec::new();
        let mut stranded = false;
        for u in mine {
            let ut = state.type_of(u);
            if ut.is_carrier() {
                stranded |= u.movement_left < hops;
                carriers.push(u.id);
            } else if ut.can_land_on_carrier() {
                planes.push(u.id);
            } else if ut.is_sea
                && u.movement_left >= hops
                && (include_transports || !ut.is_transport())
            {
                ships.push(u.id);
            }
        }
        if stranded {
            carriers.clear();
        } else if !carriers.is_empty() {
            carriers.extend(planes);
        }
        if ships.is_empty() && carriers.is_empty() {
            continue;
        }
        fleets.push(Flotilla {
            ship_strength: score(state, &ships, attacking, Domain::Sea, transports_first),
            carrier_strength: score(state, &carriers, attacking, Domain::Sea, transports_first),
            route,
            ships,
            carriers,
        });
    }
    fleets.sort_by(|a, b| a.strength().partial_cmp(&b.strength()).unwrap_or(Ordering::Equal));

    let mut moves = Vec::new();
    let mut total = 0.0;
    for fleet in fleets {
        let groups = [
            (fleet.ships, fleet.ship_strength),
            (fleet.carriers, fleet.carrier_strength),
        ];
        for (units, strength) in groups {
            if required <= total || units.is_empty() {
                continue;
            }
            total += strength;
            already_moved.extend(units.iter().copied());
            moves.push(MoveRecommendation {
                units,
                route: fleet.route.clone(),
                strength,
            });
        }
        if required <= total {
            break;
        }
    }
    moves
}

/// Deck space left on `player`'s side in `zone` after the planes already
/// parked there.
fn free_carrier_space(state: &GameState, zone: TerritoryId, player: PlayerId) -> u32 {
    let (capacity, used) = state
        .units_in(zone)
        .filter(|u| state.is_allied(player, u.owner))
        .fold((0, 0), |(capacity, used), u| {
            let ut = state.type_of(u);
            let parked = if ut.is_air { ut.carrier_cost } else { 0 };
            (capacity + ut.carrier_capacity, used + parked)
        });
    capacity.saturating_sub(used)
}

/// Planes of `player` within four hops of `target`, until their strength
/// exceeds `required`.
///
/// In combat a plane must keep enough movement to fly on from `target` to
/// the nearest allied land, or for carrier planes to the nearest allied
/// carrier. In `non_combat` mode planes end their move at `target`: allied
/// land takes any number, a sea zone only as many carrier planes as its
/// free deck space allows. Over a sea target planes based at sea are asked
/// first. `fighters_only` restricts the search to carrier planes.
pub fn invite_plane_attack(
    state: &GameState,
    player: PlayerId,
    target: TerritoryId,
    required: f32,
    already_moved: &mut HashSet<UnitId>,
    non_combat: bool,
    fighters_only: bool,
) -> Vec<MoveRecommendation> {
    let graph = state.graph();
    if !graph.contains(target) {
        return Vec::new();
    }
    let here = state.territory(target);
    let domain = Domain::of(here);
    let air_ok = terr::is_passable(state);

    let (landing_leg, carrier_leg, mut deck_space) = if non_combat {
        let allied_land = here.is_land() && terr::is_allied(state, player).test(here);
        (
            allied_land.then_some(0),
            here.is_water.then_some(0),
            Some(free_carrier_space(state, target, player)),
        )
    } else {
        let land_site = terr::is_allied(state, player).and(terr::is_passable_land(state));
        let carrier_site = terr::is_water().and(terr::has_units_matching(
            state,
            unit::is_allied(state, player).and(unit::is_carrier(state)),
        ));
        (
            nearest(state, target, &land_site, &air_ok).map(|r| r.len() as u32),
            nearest(state, target, &carrier_site, &air_ok).map(|r| r.len() as u32),
            None,
        )
    };

    let mut zones = graph.neighbors_within(target, PLANE_SEARCH_RADIUS);
    if here.is_water {
        zones.sort_by_key(|&z| !state.territory(z).is_water);
    }
    let plane = unit::owned_by(player)
        .and(unit::is_air(state))
        .and(unit::can_move());

    let mut moves = Vec::new();
    let mut total = 0.0;
    for zone in zones {
        if required <= total {
            break;
        }
        let Some(route) = graph.route(zone, target, |t| air_ok.test(state.territory(t))) else {
            continue;
        };
        let out = route.len() as u32;

        let mut group = Vec::new();
        let mut group_strength = 0.0;
        for u in state.units_in(zone) {
            if required <= total {
                break;
            }
            if !plane.test(u) || already_moved.contains(&u.id) {
                continue;
            }
            let ut = state.type_of(u);
            let carrier_plane = ut.can_land_on_carrier();
            if fighters_only && !carrier_plane {
                continue;
            }
            let lands = landing_leg.is_some_and(|leg| u.movement_left >= out + leg);
            let docks = carrier_plane
                && carrier_leg.is_some_and(|leg| u.movement_left >= out + leg)
                && deck_space.map_or(true, |space| space >= ut.carrier_cost);
            if !lands && !docks {
                continue;
            }
            if !lands {
                if let Some(space) = deck_space.as_mut() {
                    *space -= ut.carrier_cost;
                }
            }
            let s = unit_score(state, u.id, !non_combat, domain, false);
            total += s;
            group_strength += s;
            group.push(u.id);
        }
        if group.is_empty() {
            continue;
        }
        already_moved.extend(group.iter().copied());
        moves.push(MoveRecommendation {
            units: group,
            route,
            strength: group_strength,
        });
    }
    moves
}

/// Transports of `player` in `zone` that carry cargo, none of it moved yet.
fn loaded_transports(
    state: &GameState,
    zone: TerritoryId,
    player: PlayerId,
    already_moved: &HashSet<UnitId>,
) -> Vec<UnitId> {
    let transport = unit::owned_by(player)
        .and(unit::is_transport(state))
        .and(unit::can_move());
    state
        .units_in(zone)
        .filter(|u| transport.test(u) && !already_moved.contains(&u.id))
        .filter(|u| {
            let cargo = state.transports().transporting(u.id);
            !cargo.is_empty() && !cargo.iter().any(|c| already_moved.contains(c))
        })
        .map(|u| u.id)
        .collect()
}

/// A transport together with its cargo, scored by what the cargo adds to a
/// land attack.
fn ferry(state: &GameState, transport: UnitId, route: Route) -> MoveRecommendation {
    let cargo = state.transports().transporting(transport);
    let mut units = Vec::with_capacity(cargo.len() + 1);
    units.push(transport);
    units.extend_from_slice(cargo);
    MoveRecommendation {
        strength: score(state, cargo, true, Domain::Land, false),
        units,
        route,
    }
}

/// Loaded transports of `player` that can bring their cargo beside the land
/// territory `target`, until the cargo's strength exceeds `required`.
///
/// Landing zones are the water territories touching `target`, those next
/// to an allied factory first. Unless `allow_enemy` they must be free of
/// hostile units. Transports already in a landing zone stay there on a
/// zero-hop route; the rest sail in from water two or three hops from
/// `target`, and a source zone serves only one landing zone. A landing
/// zone that receives transports also gets warships as escorts, with zero
/// strength, until its defence matches what the enemy could send at it.
pub fn invite_transports(
    state: &GameState,
    player: PlayerId,
    target: TerritoryId,
    required: f32,
    already_moved: &mut HashSet<UnitId>,
    allow_enemy: bool,
    opts: &PotentialOpts,
) -> Vec<MoveRecommendation> {
    let graph = state.graph();
    if !graph.contains(target) || state.territory(target).is_water {
        return Vec::new();
    }
    let open = terr::is_open_sea(state, player);
    let factory = terr::is_allied_factory(state, player);
    let mut landings = graph.neighbors_matching(target, |t| {
        let zone = state.territory(t);
        zone.is_water && (allow_enemy || open.test(zone))
    });
    landings.sort_by_key(|&lz| {
        !graph
            .neighbors(lz)
            .iter()
            .any(|&n| factory.test(state.territory(n)))
    });
    let sources: Vec<TerritoryId> = graph
        .neighbors_within(target, TRANSPORT_SEARCH_RADIUS)
        .into_iter()
        .filter(|&t| state.territory(t).is_water && !graph.is_adjacent(target, t))
        .collect();

    let mut used_sources: HashSet<TerritoryId> = HashSet::new();
    let mut moves = Vec::new();
    let mut total = 0.0;
    for lz in landings {
        if required <= total {
            break;
        }
        let mut landed = false;
        for t in loaded_transports(state, lz, player, already_moved) {
            if required <= total {
                break;
            }
            let m = ferry(state, t, Route::new(lz));
            total += m.strength;
            already_moved.extend(m.units.iter().copied());
            moves.push(m);
            landed = true;
        }
        for &source in &sources {
            if required <= total {
                break;
            }
            if used_sources.contains(&source) {
                continue;
            }
            for t in loaded_transports(state, source, player, already_moved) {
                if required <= total {
                    break;
                }
                let reach = state.unit(t).movement_left;
                let Some(route) = max_sea_route(state, source, lz, player, allow_enemy, reach)
                    .filter(|r| r.end() == lz)
                else {
                    continue;
                };
                let m = ferry(state, t, route);
                total += m.strength;
                already_moved.extend(m.units.iter().copied());
                moves.push(m);
                used_sources.insert(source);
                landed = true;
            }
        }
        if landed {
            moves.extend(escorts(state, player, lz, already_moved, opts));
        }
    }
    moves
}

/// Warships sent to `lz` until the defence there reaches the enemy's
/// potential attack on it.
fn escorts(
    state: &GameState,
    player: PlayerId,
    lz: TerritoryId,
    already_moved: &mut HashSet<UnitId>,
    opts: &PotentialOpts,
) -> Vec<MoveRecommendation> {
    let threat = potential_attacker_strength(state, lz, player, opts);
    let mut guard = strength_of_territory(state, lz, player, false, true, opts.transports_first);
    let warship = unit::owned_by(player)
        .and(unit::is_sea(state))
        .and(unit::can_move())
        .and(!unit::is_transport(state));

    let mut moves = Vec::new();
    for zone in state.graph().neighbors_within(lz, TRANSPORT_SEARCH_RADIUS) {
        if guard >= threat {
            break;
        }
        if !state.territory(zone).is_water {
            continue;
        }
        let mut group = Vec::new();
        let mut sailing: Option<Route> = None;
        for u in state.units_in(zone) {
            if guard >= threat {
                break;
            }
            if !warship.test(u) || already_moved.contains(&u.id) {
                continue;
            }
            let Some(route) = max_sea_route(state, zone, lz, player, false, u.movement_left)
                .filter(|r| r.end() == lz)
            else {
                continue;
            };
            guard += unit_score(state, u.id, false, Domain::Sea, opts.transports_first);
            group.push(u.id);
            sailing = Some(route);
        }
        let Some(route) = sailing else { continue };
        already_moved.extend(group.iter().copied());
        moves.push(MoveRecommendation {
            units: group,
            route,
            strength: 0.0,
        });
    }
    moves
}

/// Ships of `player` able to bombard that can reach the water territory
/// `zone`, until their attack pips exceed `required`. Ships already in
/// `zone` come first, then those within three hops.
pub fn invite_bombard_escort(
    state: &GameState,
    player: PlayerId,
    zone: TerritoryId,
    required: f32,
    already_moved: &mut HashSet<UnitId>,
) -> Vec<MoveRecommendation> {
    let graph = state.graph();
    if !graph.contains(zone) || !state.territory(zone).is_water {
        return Vec::new();
    }
    let bombarder = unit::owned_by(player)
        .and(unit::can_move())
        .and(UnitPred::new(|u| state.type_of(u).can_bombard));

    let mut origins = vec![zone];
    origins.extend(graph.neighbors_within(zone, BOMBARD_SEARCH_RADIUS));
    let mut moves = Vec::new();
    let mut total = 0.0;
    for from in origins {
        if required <= total {
            break;
        }
        let mut group = Vec::new();
        let mut group_strength = 0.0;
        let mut sailing: Option<Route> = None;
        for u in state.units_in(from) {
            if required <= total {
                break;
            }
            if !bombarder.test(u) || already_moved.contains(&u.id) {
                continue;
            }
            let Some(route) = max_sea_route(state, from, zone, player, false, u.movement_left)
                .filter(|r| r.end() == zone)
            else {
                continue;
            };
            let ut = state.type_of(u);
            let pips = (ut.attack(u.owner) * ut.attack_rolls(u.owner)) as f32;
            total += pips;
            group_strength += pips;
            group.push(u.id);
            sailing = Some(route);
        }
        let Some(route) = sailing else { continue };
        already_moved.extend(group.iter().copied());
        moves.push(MoveRecommendation {
            units: group,
            route,
            strength: group_strength,
        });
    }
    moves
}

/// Territories next to `t` through which a blitz-capable unit hostile to
/// `player`, standing two hops out, could reach `t`.
pub fn possible_blitz_territories(
    state: &GameState,
    t: TerritoryId,
    player: PlayerId,
) -> Vec<TerritoryId> {
    let hostile_blitzer = unit::is_enemy(state, player).and(unit::can_blitz(state));
    let ring: HashSet<TerritoryId> = exact_neighbors(state, t, 1, false).into_iter().collect();
    let mut out = Vec::new();
    for from in exact_neighbors(state, t, 2, false) {
        if !state.units_in(from).any(|u| hostile_blitzer.test(u)) {
            continue;
        }
        for mid in exact_neighbors(state, from, 1, false) {
            if ring.contains(&mid) && !out.contains(&mid) {
                out.push(mid);
            }
        }
    }
    out
}

/// Enemy land strength two hops from `t` that a blitz-based estimate does
/// not already cover.
///
/// Territories reachable from `t` only through a blitz lane are skipped
/// when that lane is empty of `player`'s allies; the rest contribute the
/// attack strength of their enemy units if they are enemy-held land.
pub fn two_away_strength_not_counted(state: &GameState, player: PlayerId, t: TerritoryId) -> f32 {
    let lanes = possible_blitz_territories(state, t, player);
    let graph = state.graph();
    let mut second_ring: Vec<TerritoryId> = Vec::new();
    for &lane in &lanes {
        for &n in graph.neighbors(lane) {
            if n != t && !lanes.contains(&n) && !second_ring.contains(&n) {
                second_ring.push(n);
            }
        }
    }

    let passable_land = terr::is_passable_land(state);
    let allied_unit = unit::is_allied(state, player);
    let enemy_land = terr::is_enemy_land(state, player);
    let enemy_unit = unit::is_enemy(state, player);
    let mut strength = 0.0;
    for far in second_ring {
        let covered = graph.neighbors(far).iter().any(|&n| {
            passable_land.test(state.territory(n))
                && lanes.contains(&n)
                && !state.units_in(n).any(|u| allied_unit.test(u))
        });
        if covered || !enemy_land.test(state.territory(far)) {
            continue;
        }
        let theirs: Vec<UnitId> = state
            .units_in(far)
            .filter(|u| enemy_unit.test(u))
            .map(|u| u.id)
            .collect();
        strength += score(state, &theirs, true, Domain::Land, false);
    }
    strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GameStateBuilder, UnitType, UnitTypeId};

    struct Kit {
        b: GameStateBuilder,
        red: PlayerId,
        blue: PlayerId,
        infantry: UnitTypeId,
        artillery: UnitTypeId,
        tank: UnitTypeId,
        truck: UnitTypeId,
    }

    fn kit() -> Kit {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let blue = b.add_player("blue", 0);
        let infantry = b.add_unit_type(UnitType {
            is_infantry: true,
            artillery_supportable: true,
            ..UnitType::land("infantry", 1, 2, 1)
        });
        let artillery = b.add_unit_type(UnitType {
            is_artillery: true,
            ..UnitType::land("artillery", 2, 2, 1)
        });
        let tank = b.add_unit_type(UnitType {
            can_blitz: true,
            ..UnitType::land("tank", 3, 3, 2)
        });
        let truck = b.add_unit_type(UnitType::land("truck", 0, 1, 2));
        Kit {
            b,
            red,
            blue,
            infantry,
            artillery,
            tank,
            truck,
        }
    }

    #[test]
    fn transport_order_interleaves_partners() {
        let mut k = kit();
        let home = k.b.add_land("home", Some(k.red), 1);
        let i1 = k.b.add_unit(home, k.infantry, k.red);
        let a1 = k.b.add_unit(home, k.artillery, k.red);
        let t1 = k.b.add_unit(home, k.tank, k.red);
        let i2 = k.b.add_unit(home, k.infantry, k.red);
        let t2 = k.b.add_unit(home, k.tank, k.red);
        let i3 = k.b.add_unit(home, k.infantry, k.red);
        let x1 = k.b.add_unit(home, k.truck, k.red);
        let a2 = k.b.add_unit(home, k.artillery, k.red);
        let state = k.b.build().unwrap();

        let order = sort_transport_units(&state, &[i1, a1, t1, i2, t2, i3, x1, a2]);
        assert_eq!(order, vec![i1, t2, i2, t1, i3, a2, a1, x1]);
    }

    #[test]
    fn speed_groups_fastest_first() {
        let mut k = kit();
        let home = k.b.add_land("home", Some(k.red), 1);
        let slow = k.b.add_unit(home, k.infantry, k.red);
        let fast = k.b.add_unit(home, k.tank, k.red);
        let fast2 = k.b.add_unit(home, k.truck, k.red);
        let tired = k.b.add_unit(home, k.tank, k.red);
        k.b.set_movement_left(tired, 0);
        let state = k.b.build().unwrap();

        let groups = break_units_by_speed(&state, &[slow, fast, tired, fast2]);
        assert_eq!(groups, vec![vec![fast, fast2], vec![slow], vec![tired]]);
        assert!(break_units_by_speed(&state, &[]).is_empty());
    }

    #[test]
    fn land_attack_stops_once_strong_enough() {
        let mut k = kit();
        let target = k.b.add_land("target", Some(k.blue), 2);
        let west = k.b.add_land("west", Some(k.red), 1);
        let east = k.b.add_land("east", Some(k.red), 1);
        k.b.connect(target, west).connect(target, east);
        k.b.add_unit(target, k.infantry, k.blue);
        let i1 = k.b.add_unit(west, k.infantry, k.red);
        let a1 = k.b.add_unit(west, k.artillery, k.red);
        k.b.add_units(west, k.tank, k.red, 2);
        k.b.add_units(east, k.tank, k.red, 2);
        let state = k.b.build().unwrap();

        let mut moved = HashSet::new();
        // Loading order is infantry, tank, artillery, tank. The infantry and
        // tank pair gives 2 + 4, the artillery 3 more, which meets 9.
        let moves =
            invite_land_attack(&state, k.red, target, 9.0, &mut moved, &HashSet::new(), true);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].route.territories(), &[west, target]);
        assert_eq!(moves[0].units.len(), 3);
        assert!(moves[0].units.contains(&i1) && moves[0].units.contains(&a1));
        assert!((total_strength(&moves) - 9.0).abs() < 1e-5);
        assert_eq!(moved.len(), 3);

        // A second call only sees what is left.
        let more =
            invite_land_attack(&state, k.red, target, 100.0, &mut moved, &HashSet::new(), true);
        let count: usize = more.iter().map(|m| m.units.len()).sum();
        assert_eq!(count, 3);
    }

    /// from - mid - target, with `guard` hanging off `from`.
    fn blitz_lane(guarded: bool) -> (GameState, PlayerId, [TerritoryId; 3], Vec<UnitId>) {
        let mut k = kit();
        let target = k.b.add_land("target", Some(k.blue), 2);
        let mid = k.b.add_land("mid", Some(k.blue), 1);
        let from = k.b.add_land("from", Some(k.red), 1);
        let guard = k.b.add_land("guard", Some(k.blue), 1);
        k.b.connect(target, mid).connect(mid, from).connect(from, guard);
        let tanks = k.b.add_units(from, k.tank, k.red, 3);
        if guarded {
            k.b.add_unit(guard, k.infantry, k.blue);
        }
        (k.b.build().unwrap(), k.red, [from, mid, target], tanks)
    }

    #[test]
    fn blitz_attack_routes_through_empty_midpoint() {
        let (state, red, [from, mid, target], tanks) = blitz_lane(false);
        let mut moved = HashSet::new();
        let moves = invite_blitz_attack(&state, red, target, 5.0, &mut moved, true, false, false);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].route.territories(), &[from, mid, target]);
        assert_eq!(moves[0].units, tanks[..2].to_vec());
    }

    #[test]
    fn exposed_blitzers_stay_home_unless_forced() {
        let (state, red, [.., target], _) = blitz_lane(true);
        let mut moved = HashSet::new();
        assert!(invite_blitz_attack(&state, red, target, 5.0, &mut moved, true, false, false).is_empty());
        let forced = invite_blitz_attack(&state, red, target, 5.0, &mut moved, true, false, true);
        assert_eq!(forced.len(), 1);
    }

    struct Navy {
        destroyer: UnitTypeId,
        carrier: UnitTypeId,
        transport: UnitTypeId,
        cruiser: UnitTypeId,
        fighter: UnitTypeId,
        bomber: UnitTypeId,
    }

    fn navy(b: &mut GameStateBuilder) -> Navy {
        Navy {
            destroyer: b.add_unit_type(UnitType {
                is_destroyer: true,
                ..UnitType::sea("destroyer", 2, 2, 2)
            }),
            carrier: b.add_unit_type(UnitType {
                carrier_capacity: 2,
                ..UnitType::sea("carrier", 1, 2, 2)
            }),
            transport: b.add_unit_type(UnitType {
                transport_capacity: 2,
                ..UnitType::sea("transport", 0, 1, 2)
            }),
            cruiser: b.add_unit_type(UnitType {
                can_bombard: true,
                ..UnitType::sea("cruiser", 3, 3, 2)
            }),
            fighter: b.add_unit_type(UnitType {
                carrier_cost: 1,
                ..UnitType::air("fighter", 3, 4, 4)
            }),
            bomber: b.add_unit_type(UnitType::air("bomber", 4, 1, 6)),
        }
    }

    /// `z1` holds a destroyer and a transport, `z2` a carrier with a
    /// fighter. Both touch `target`.
    fn two_squadrons() -> (GameState, PlayerId, [TerritoryId; 3], [UnitId; 4]) {
        let mut k = kit();
        let n = navy(&mut k.b);
        let target = k.b.add_sea("target");
        let z1 = k.b.add_sea("z1");
        let z2 = k.b.add_sea("z2");
        k.b.connect(target, z1).connect(target, z2);
        k.b.add_unit(target, n.destroyer, k.blue);
        let d = k.b.add_unit(z1, n.destroyer, k.red);
        let t = k.b.add_unit(z1, n.transport, k.red);
        let c = k.b.add_unit(z2, n.carrier, k.red);
        let f = k.b.add_unit(z2, n.fighter, k.red);
        (k.b.build().unwrap(), k.red, [target, z1, z2], [d, t, c, f])
    }

    #[test]
    fn ship_attack_drains_weakest_zone_first() {
        let (state, red, [target, z1, z2], [d, t, c, f]) = two_squadrons();
        let none = HashSet::new();

        let mut moved = HashSet::new();
        let moves =
            invite_ship_attack(&state, red, target, 2.0, &mut moved, &none, true, false, false);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].units, vec![d]);
        assert_eq!(moves[0].route.territories(), &[z1, target]);
        assert_eq!(moves[0].strength, 3.0);

        // Destroyer 3, then carrier 2 and fighter 4 as one group.
        let mut moved = HashSet::new();
        let moves =
            invite_ship_attack(&state, red, target, 5.0, &mut moved, &none, true, false, false);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[1].units, vec![c, f]);
        assert_eq!(moves[1].route.territories(), &[z2, target]);
        assert!((total_strength(&moves) - 9.0).abs() < 1e-5);
        assert!(!moved.contains(&t));
    }

    #[test]
    fn ship_attack_skips_fought_zones_and_can_take_transports() {
        let (state, red, [target, z1, _], [d, t, c, _]) = two_squadrons();

        let fought: HashSet<TerritoryId> = [z1].into_iter().collect();
        let mut moved = HashSet::new();
        let moves =
            invite_ship_attack(&state, red, target, 50.0, &mut moved, &fought, true, false, false);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].units[0], c);

        let mut moved = HashSet::new();
        let moves = invite_ship_attack(
            &state,
            red,
            target,
            2.0,
            &mut moved,
            &HashSet::new(),
            true,
            false,
            true,
        );
        assert_eq!(moves[0].units, vec![d, t]);
    }

    /// target - mid - home, with a fighter at `mid` and a fighter and a
    /// tired bomber at `home`.
    fn airfield() -> (GameState, PlayerId, [TerritoryId; 3], [UnitId; 3]) {
        let mut k = kit();
        let n = navy(&mut k.b);
        let target = k.b.add_land("target", Some(k.blue), 2);
        let mid = k.b.add_land("mid", Some(k.red), 1);
        let home = k.b.add_land("home", Some(k.red), 3);
        k.b.connect(target, mid).connect(mid, home);
        k.b.add_unit(target, k.infantry, k.blue);
        let near = k.b.add_unit(mid, n.fighter, k.red);
        let far = k.b.add_unit(home, n.fighter, k.red);
        let bomber = k.b.add_unit(home, n.bomber, k.red);
        k.b.set_movement_left(bomber, 2);
        (k.b.build().unwrap(), k.red, [target, mid, home], [near, far, bomber])
    }

    #[test]
    fn plane_attack_needs_fuel_to_get_home() {
        let (state, red, [target, mid, home], [near, far, bomber]) = airfield();

        let mut moved = HashSet::new();
        let moves = invite_plane_attack(&state, red, target, 3.0, &mut moved, false, false);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].units, vec![near]);
        assert_eq!(moves[0].strength, 4.0);

        // The bomber would need three moves to strike and land back at `mid`.
        let mut moved = HashSet::new();
        let moves = invite_plane_attack(&state, red, target, 100.0, &mut moved, false, false);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[1].units, vec![far]);
        assert_eq!(moves[1].route.territories(), &[home, mid, target]);
        assert!(!moved.contains(&bomber));
    }

    #[test]
    fn non_combat_planes_only_need_to_arrive() {
        let (state, red, [_, mid, _], [_, far, bomber]) = airfield();

        let mut moved = HashSet::new();
        let moves = invite_plane_attack(&state, red, mid, 100.0, &mut moved, true, false);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].units, vec![far, bomber]);

        let mut moved = HashSet::new();
        let moves = invite_plane_attack(&state, red, mid, 100.0, &mut moved, true, true);
        assert_eq!(moves[0].units, vec![far]);
    }

    #[test]
    fn carrier_deck_space_limits_landings() {
        let mut k = kit();
        let n = navy(&mut k.b);
        let bay = k.b.add_sea("bay");
        let dock = k.b.add_land("dock", Some(k.red), 1);
        k.b.connect(bay, dock);
        k.b.add_unit(bay, n.carrier, k.red);
        k.b.add_unit(bay, n.fighter, k.red);
        let f1 = k.b.add_unit(dock, n.fighter, k.red);
        k.b.add_unit(dock, n.fighter, k.red);
        k.b.add_unit(dock, n.bomber, k.red);
        let state = k.b.build().unwrap();

        let mut moved = HashSet::new();
        let moves = invite_plane_attack(&state, k.red, bay, 100.0, &mut moved, true, false);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].units, vec![f1]);
        assert_eq!(moves[0].strength, 5.0);
    }

    /// beach - bay - mid - far, plus `lurk` beside `bay`. `bay` holds a
    /// loaded transport, `far` another with a destroyer, `lurk` a blue
    /// destroyer.
    fn landing() -> (GameState, PlayerId, [TerritoryId; 4], [UnitId; 3]) {
        let mut k = kit();
        let n = navy(&mut k.b);
        let beach = k.b.add_land("beach", Some(k.blue), 2);
        let bay = k.b.add_sea("bay");
        let mid = k.b.add_sea("mid");
        let far = k.b.add_sea("far");
        let lurk = k.b.add_sea("lurk");
        k.b.connect(beach, bay)
            .connect(bay, mid)
            .connect(mid, far)
            .connect(bay, lurk);
        let t1 = k.b.add_unit(bay, n.transport, k.red);
        for _ in 0..2 {
            let i = k.b.add_unit(bay, k.infantry, k.red);
            k.b.load(t1, i);
        }
        let t2 = k.b.add_unit(far, n.transport, k.red);
        let i = k.b.add_unit(far, k.infantry, k.red);
        k.b.load(t2, i);
        let escort = k.b.add_unit(far, n.destroyer, k.red);
        k.b.add_unit(lurk, n.destroyer, k.blue);
        (k.b.build().unwrap(), k.red, [beach, bay, mid, far], [t1, t2, escort])
    }

    #[test]
    fn transports_offshore_stay_put() {
        let (state, red, [beach, bay, ..], [t1, ..]) = landing();
        let mut moved = HashSet::new();
        let moves = invite_transports(
            &state,
            red,
            beach,
            3.0,
            &mut moved,
            false,
            &PotentialOpts::default(),
        );
        assert_eq!(moves[0].units[0], t1);
        assert_eq!(moves[0].units.len(), 3);
        assert_eq!(moves[0].route, Route::new(bay));
        assert_eq!(moves[0].strength, 4.0);
        assert!(moves[1..].iter().all(|m| m.strength == 0.0));
    }

    #[test]
    fn transports_sail_in_with_an_escort() {
        let (state, red, [beach, bay, mid, far], [t1, t2, escort]) = landing();
        let mut moved = HashSet::new();
        let moves = invite_transports(
            &state,
            red,
            beach,
            10.0,
            &mut moved,
            false,
            &PotentialOpts::default(),
        );
        assert_eq!(moves.len(), 3);
        assert_eq!(moves[0].units[0], t1);
        assert_eq!(moves[1].units[0], t2);
        assert_eq!(moves[1].route.territories(), &[far, mid, bay]);
        assert_eq!(moves[2].units, vec![escort]);
        assert_eq!(moves[2].strength, 0.0);
        assert!((total_strength(&moves) - 6.0).abs() < 1e-5);
    }

    #[test]
    fn bombard_escort_prefers_ships_on_station() {
        let mut k = kit();
        let n = navy(&mut k.b);
        let z: Vec<TerritoryId> = (0..5).map(|i| k.b.add_sea(&format!("z{i}"))).collect();
        for w in z.windows(2) {
            k.b.connect(w[0], w[1]);
        }
        let here = k.b.add_unit(z[0], n.cruiser, k.red);
        let near = k.b.add_unit(z[2], n.cruiser, k.red);
        k.b.add_unit(z[4], n.cruiser, k.red);
        k.b.add_unit(z[1], n.destroyer, k.red);
        let state = k.b.build().unwrap();

        let mut moved = HashSet::new();
        let moves = invite_bombard_escort(&state, k.red, z[0], 2.0, &mut moved);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].units, vec![here]);
        assert_eq!(moves[0].route, Route::new(z[0]));

        // The cruiser at z4 is four hops out, past the search.
        let mut moved = HashSet::new();
        let moves = invite_bombard_escort(&state, k.red, z[0], 100.0, &mut moved);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[1].units, vec![near]);
        assert_eq!(moves[1].route.territories(), &[z[2], z[1], z[0]]);
        assert_eq!(total_strength(&moves), 6.0);
    }

    #[test]
    fn blitz_lanes_and_second_ring() {
        let (state, red, [_, mid, target], _) = blitz_lane(false);
        // From blue's side, red tanks at `from` can blitz through `mid`.
        let blue = PlayerId(1);
        assert_eq!(possible_blitz_territories(&state, target, blue), vec![mid]);
        assert!(possible_blitz_territories(&state, target, red).is_empty());
        // `from` is reached through the empty lane `mid`, so it is covered.
        assert_eq!(two_away_strength_not_counted(&state, blue, target), 0.0);
    }
}
