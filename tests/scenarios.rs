//! End-to-end scenarios on small hand-built maps.

use std::collections::HashSet;

use warplan::board::{GameState, GameStateBuilder, PlayerId, TerritoryId, UnitType};
use warplan::combat::{BattleSide, Domain};
use warplan::eval::{invite_land_attack, rank_territories, PotentialOpts, RankOptions};
use warplan::matches::{terr, TerritoryPred};
use warplan::purchase::PurchaseRequest;
use warplan::search::{distance_to_enemy, frontier_at_distance, nearest};
use warplan::{Advisor, AdvisorConfig};

fn advisor(seed: u64) -> Advisor {
    Advisor::new(AdvisorConfig {
        seed,
        ..AdvisorConfig::default()
    })
    .unwrap()
}

/// W - X - Y - Z, red holds W and X, blue holds Y and Z.
fn line() -> (GameState, [TerritoryId; 4], PlayerId, PlayerId) {
    let mut b = GameStateBuilder::new();
    let red = b.add_player("red", 0);
    let blue = b.add_player("blue", 0);
    let inf = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
    let w = b.add_land("W", Some(red), 1);
    let x = b.add_land("X", Some(red), 2);
    let y = b.add_land("Y", Some(blue), 2);
    let z = b.add_land("Z", Some(blue), 3);
    b.connect(w, x).connect(x, y).connect(y, z);
    b.add_units(x, inf, red, 2);
    b.add_units(y, inf, blue, 1);
    (b.build().unwrap(), [w, x, y, z], red, blue)
}

#[test]
fn line_graph_searches() {
    let (state, [w, x, y, z], red, _) = line();

    let route = nearest(&state, w, &terr::is_enemy(&state, red), &terr::is_land()).unwrap();
    assert_eq!(route.territories(), &[w, x, y]);

    assert_eq!(distance_to_enemy(&state, w, red, true), Some(2));

    let all = TerritoryPred::always();
    assert_eq!(frontier_at_distance(&state, w, &all, &all, 3), vec![z]);
    assert!(frontier_at_distance(&state, w, &all, &all, 0).is_empty());
    assert_eq!(frontier_at_distance(&state, z, &all, &all, 2), vec![x]);
}

#[test]
fn line_graph_ranking_buckets() {
    let (state, [w, x, y, z], red, _) = line();
    let ranking = rank_territories(&state, red, &RankOptions::default());
    assert_eq!(ranking.enemy.len(), 2);
    assert!(ranking.enemy.contains(&y) && ranking.enemy.contains(&z));
    assert_eq!(ranking.friendly, vec![x, w], "front line first");
    assert!(ranking.scores[&x] > ranking.scores[&w]);
    assert!(ranking.neutral.is_empty());
}

#[test]
fn coalition_threat_discounts_the_weaker_enemy() {
    let mut b = GameStateBuilder::new();
    let red = b.add_player("red", 0);
    let blue = b.add_player("blue", 0);
    let green = b.add_player("green", 0);
    let tank = b.add_unit_type(UnitType::land("tank", 3, 3, 2));
    let inf = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
    let target = b.add_land("target", Some(red), 2);
    let east = b.add_land("east", Some(blue), 1);
    let west = b.add_land("west", Some(green), 1);
    b.connect(target, east).connect(target, west);
    b.add_units(east, tank, blue, 2);
    b.add_unit(east, inf, blue);
    b.add_units(west, inf, green, 2);
    let state = b.build().unwrap();

    // blue: 2 tanks at 4 plus infantry at 2; green: two infantry at 2.
    let threat = advisor(1).threat(&state, target, red);
    assert!((threat - 11.6).abs() < 1e-4, "got {threat}");

    let map = advisor(1).threat_map(&state, red, &[target]);
    assert!((map[&target] - threat).abs() < 1e-6);
}

#[test]
fn hand_computed_purchase() {
    let mut b = GameStateBuilder::new();
    let red = b.add_player("red", 30);
    let inf = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
    let tank = b.add_unit_type(UnitType {
        can_blitz: true,
        ..UnitType::land("tank", 3, 2, 2)
    });
    b.add_production_rule("buyInfantry", inf, 3);
    b.add_production_rule("buyTank", tank, 5);
    let state = b.build().unwrap();

    let request = PurchaseRequest {
        player: red,
        budget: 30,
        max_units: 10,
        rules: state.production_rules().to_vec(),
        escort_fighters: 0,
    };
    let mix = advisor(99).plan_purchase(&state, &request).unwrap();
    assert_eq!(mix.attack.quantities, vec![0, 6]);
    assert_eq!(mix.attack.named(&request.rules), vec![("buyTank", 6)]);
    assert_eq!(mix.attack.cost(&request.rules), 30);
}

#[test]
fn more_attackers_never_win_less_often() {
    let mut b = GameStateBuilder::new();
    let red = b.add_player("red", 0);
    let blue = b.add_player("blue", 0);
    let inf = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
    let tank = b.add_unit_type(UnitType::land("tank", 3, 3, 2));
    let state = b.build().unwrap();
    let defenders = BattleSide::new(blue, [(inf, 2)].into_iter().collect());

    let mut advisor = advisor(2024);
    let mut previous = 0.0;
    for tanks in 1..=4 {
        let attackers = BattleSide::new(red, [(tank, tanks)].into_iter().collect());
        let rate = advisor.win_rate(&state, &attackers, &defenders, Domain::Land, 400);
        assert!(rate + 0.05 >= previous, "{tanks} tanks: {rate} < {previous}");
        previous = rate;
    }
    assert!(previous > 0.95);
}

#[test]
fn land_attack_invitation_moves_units_once() {
    let mut b = GameStateBuilder::new();
    let red = b.add_player("red", 0);
    let blue = b.add_player("blue", 0);
    let inf = b.add_unit_type(UnitType {
        is_infantry: true,
        ..UnitType::land("infantry", 1, 2, 1)
    });
    let camp = b.add_land("camp", Some(red), 1);
    let target = b.add_land("target", Some(blue), 2);
    b.connect(camp, target);
    b.add_units(camp, inf, red, 3);
    let state = b.build().unwrap();

    let mut moved = HashSet::new();
    let first = invite_land_attack(&state, red, target, 100.0, &mut moved, &HashSet::new(), true);
    assert_eq!(first.iter().map(|m| m.units.len()).sum::<usize>(), 3);
    assert!(first.iter().all(|m| m.route.start() == camp && m.route.end() == target));

    let again = invite_land_attack(&state, red, target, 100.0, &mut moved, &HashSet::new(), true);
    assert!(again.is_empty());
}

#[test]
fn ignoring_the_only_front_removes_the_threat() {
    let (state, [_, x, y, _], red, _) = line();
    let opts = PotentialOpts {
        ignore: [y].into_iter().collect(),
        ..PotentialOpts::default()
    };
    assert_eq!(
        warplan::eval::potential_attacker_strength(&state, x, red, &opts),
        0.0
    );
    assert!(advisor(3).threat(&state, x, red) > 0.0);
}
