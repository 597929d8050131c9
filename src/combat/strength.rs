//! Combat strength scoring.
//!
//! Strength is a rough, additive measure of how much a group of units is
//! worth in a battle: one point per fighting unit plus its pips for the
//! role, with small penalties for units that cannot hit anything. It is
//! used to compare forces, not to predict exact outcomes.

use serde::{Deserialize, Serialize};

use crate::board::{GameState, PlayerId, Territory, UnitId, UnitType};

/// Whether a battle is fought on land or at sea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Land,
    Sea,
}

impl Domain {
    pub fn of(t: &Territory) -> Domain {
        if t.is_water {
            Domain::Sea
        } else {
            Domain::Land
        }
    }

    #[inline]
    pub fn is_sea(self) -> bool {
        self == Domain::Sea
    }
}

/// Contribution of one unit of type `ut` owned by `owner`.
fn contribution(
    ut: &UnitType,
    owner: PlayerId,
    attacking: bool,
    domain: Domain,
    transports_count: bool,
) -> f32 {
    if ut.is_infrastructure {
        return 0.0;
    }
    let attack = ut.attack(owner);
    if ut.is_sea == domain.is_sea() {
        let hits = if ut.is_two_hit { 2 } else { 1 };
        let mut s = 1.0;
        if attacking {
            s += (attack * hits * ut.attack_rolls(owner)) as f32;
            if attack == 0 {
                s -= 0.5;
            }
        } else {
            s += (ut.defense(owner) * hits) as f32;
        }
        if attack == 0 && ut.is_transport() && !transports_count {
            s -= 0.5;
        }
        s
    } else if ut.is_air && domain.is_sea() {
        if attacking {
            1.0 + (attack * ut.attack_rolls(owner)) as f32
        } else {
            1.0 + ut.defense(owner) as f32
        }
    } else {
        0.0
    }
}

/// Strength of `units` attacking or defending in `domain`.
///
/// Returns zero for an empty set, and also when no unit reaches 1 in the
/// stat for its role. Attacking on land adds one point per
/// artillery/supportable-infantry pair.
pub fn score(
    state: &GameState,
    units: &[UnitId],
    attacking: bool,
    domain: Domain,
    transports_count: bool,
) -> f32 {
    if units.is_empty() {
        return 0.0;
    }
    let can_hit = units.iter().any(|&id| {
        let u = state.unit(id);
        let ut = state.type_of(u);
        if attacking {
            ut.attack(u.owner) >= 1
        } else {
            ut.defense(u.owner) >= 1
        }
    });
    if !can_hit {
        return 0.0;
    }

    let mut total = 0.0;
    let mut artillery = 0u32;
    let mut supportable = 0u32;
    for &id in units {
        let u = state.unit(id);
        let ut = state.type_of(u);
        if ut.is_artillery {
            artillery += 1;
        }
        if ut.artillery_supportable {
            supportable += 1;
        }
        total += contribution(ut, u.owner, attacking, domain, transports_count);
    }
    if attacking && domain == Domain::Land {
        total += artillery.min(supportable) as f32;
    }
    total
}

/// Strength of a single unit, without the set-level short-circuit.
pub fn unit_score(
    state: &GameState,
    unit: UnitId,
    attacking: bool,
    domain: Domain,
    transports_count: bool,
) -> f32 {
    let u = state.unit(unit);
    contribution(state.type_of(u), u.owner, attacking, domain, transports_count)
}

/// Flat air strength: one point per plane plus its attack or defense.
pub fn air_score(state: &GameState, units: &[UnitId], attacking: bool) -> f32 {
    units
        .iter()
        .map(|&id| {
            let u = state.unit(id);
            let ut = state.type_of(u);
            let pips = if attacking {
                ut.attack(u.owner)
            } else {
                ut.defense(u.owner)
            };
            1.0 + pips as f32
        })
        .sum()
}

/// Takes units in order until their strength exceeds `max`.
///
/// If the whole set is weaker than `max`, it is returned unchanged.
pub fn units_up_to_strength(
    state: &GameState,
    max: f32,
    units: &[UnitId],
    attacking: bool,
    domain: Domain,
) -> Vec<UnitId> {
    if score(state, units, attacking, domain, false) < max {
        return units.to_vec();
    }
    let mut picked = Vec::new();
    for &u in units {
        picked.push(u);
        if score(state, &picked, attacking, domain, false) > max {
            break;
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GameStateBuilder, TerritoryId, UnitTypeId};

    struct Fixture {
        state: GameState,
        here: TerritoryId,
    }

    fn fixture(types: Vec<UnitType>, place: &[(usize, usize)]) -> (Fixture, Vec<UnitTypeId>) {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let ids: Vec<UnitTypeId> = types.into_iter().map(|t| b.add_unit_type(t)).collect();
        let here = b.add_land("here", Some(red), 1);
        for &(ty, n) in place {
            b.add_units(here, ids[ty], red, n);
        }
        (
            Fixture {
                state: b.build().unwrap(),
                here,
            },
            ids,
        )
    }

    fn all(f: &Fixture) -> Vec<UnitId> {
        f.state.territory(f.here).units.clone()
    }

    #[test]
    fn empty_set_scores_zero() {
        let (f, _) = fixture(vec![], &[]);
        for attacking in [true, false] {
            for domain in [Domain::Land, Domain::Sea] {
                for tf in [true, false] {
                    assert_eq!(score(&f.state, &[], attacking, domain, tf), 0.0);
                }
            }
        }
    }

    #[test]
    fn zero_attack_set_scores_zero_when_attacking() {
        let (f, _) = fixture(
            vec![UnitType::land("wall", 0, 4, 1), UnitType::land("cook", 0, 1, 1)],
            &[(0, 2), (1, 1)],
        );
        assert_eq!(score(&f.state, &all(&f), true, Domain::Land, false), 0.0);
        assert!(score(&f.state, &all(&f), false, Domain::Land, false) > 0.0);
    }

    #[test]
    fn two_hit_defender_counts_double() {
        let (f, _) = fixture(
            vec![UnitType {
                is_two_hit: true,
                ..UnitType::land("fortress", 0, 2, 1)
            }],
            &[(0, 1)],
        );
        assert_eq!(score(&f.state, &all(&f), false, Domain::Land, false), 5.0);
    }

    #[test]
    fn attack_rolls_multiply_pips() {
        let (f, _) = fixture(
            vec![UnitType {
                attack_rolls: 2,
                ..UnitType::land("rocket", 3, 1, 1)
            }],
            &[(0, 1)],
        );
        assert_eq!(score(&f.state, &all(&f), true, Domain::Land, false), 7.0);
    }

    #[test]
    fn artillery_pairs_add_on_land_attack_only() {
        let (f, _) = fixture(
            vec![
                UnitType {
                    artillery_supportable: true,
                    is_infantry: true,
                    ..UnitType::land("infantry", 1, 2, 1)
                },
                UnitType {
                    is_artillery: true,
                    ..UnitType::land("artillery", 2, 2, 1)
                },
            ],
            &[(0, 3), (1, 2)],
        );
        // 3 * (1 + 1) + 2 * (1 + 2) + min(2, 3)
        assert_eq!(score(&f.state, &all(&f), true, Domain::Land, false), 14.0);
        // 3 * 3 + 2 * 3, no bonus
        assert_eq!(score(&f.state, &all(&f), false, Domain::Land, false), 15.0);
    }

    #[test]
    fn transports_and_infrastructure() {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 0);
        let transport = b.add_unit_type(UnitType {
            transport_capacity: 2,
            ..UnitType::sea("transport", 0, 1, 2)
        });
        let destroyer = b.add_unit_type(UnitType::sea("destroyer", 2, 2, 2));
        let fighter = b.add_unit_type(UnitType::air("fighter", 3, 4, 4));
        let factory = b.add_unit_type(UnitType {
            is_infrastructure: true,
            ..UnitType::land("factory", 0, 0, 0)
        });
        let sea = b.add_sea("sea");
        let port = b.add_land("port", Some(red), 3);
        let t = b.add_unit(sea, transport, red);
        let d = b.add_unit(sea, destroyer, red);
        let f = b.add_unit(sea, fighter, red);
        let fac = b.add_unit(port, factory, red);
        let state = b.build().unwrap();

        // destroyer 3, transport 1 - 0.5 - 0.5, fighter 1 + 3
        assert_eq!(score(&state, &[t, d, f], true, Domain::Sea, false), 7.0);
        assert_eq!(score(&state, &[t, d, f], true, Domain::Sea, true), 7.5);
        // defending transport keeps the capacity penalty only
        assert_eq!(unit_score(&state, t, false, Domain::Sea, false), 1.5);
        assert_eq!(unit_score(&state, fac, true, Domain::Land, false), 0.0);
        // ships do not fight on land
        assert_eq!(unit_score(&state, d, true, Domain::Land, false), 0.0);
        assert_eq!(air_score(&state, &[f], false), 5.0);
    }

    #[test]
    fn up_to_strength_stops_once_exceeded() {
        let (f, _) = fixture(vec![UnitType::land("tank", 3, 3, 2)], &[(0, 5)]);
        let units = all(&f);
        let picked = units_up_to_strength(&f.state, 7.0, &units, true, Domain::Land);
        assert_eq!(picked.len(), 2, "two tanks score 8 > 7");
        let everything = units_up_to_strength(&f.state, 100.0, &units, true, Domain::Land);
        assert_eq!(everything.len(), 5);
    }
}
