//! Quick round-based battle estimate.
//!
//! Each round converts both sides' pips into hits (six pips per hit) and
//! turns the leftover pips into at most one extra hit by sampling six
//! weighted trials. Casualties are taken worst-first until one side is
//! gone. Rounds run in a loop bounded by [`EstimatorConfig::max_rounds`];
//! running out of rounds counts as a loss for the attacker.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::strength::Domain;
use crate::board::{GameState, PlayerId, UnitId, UnitType, UnitTypeId};

/// Units per type on one side of a battle.
pub type UnitCounts = BTreeMap<UnitTypeId, u32>;

/// Pips per guaranteed hit.
const PIPS_PER_HIT: u32 = 6;

/// Weighted trials drawn per sampling pass.
const TRIALS: u32 = 6;

/// Successes out of [`TRIALS`] needed for the extra hit.
const EXTRA_HIT_SUCCESSES: u32 = 4;

/// Sampling passes before leftover pips are given up on.
const MAX_SAMPLING_PASSES: u32 = 256;

/// Tuning for [`estimate_battle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Rounds simulated before giving up and scoring an attacker loss.
    pub max_rounds: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig { max_rounds: 200 }
    }
}

/// One side of a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSide {
    pub player: PlayerId,
    pub units: UnitCounts,
}

impl BattleSide {
    pub fn new(player: PlayerId, units: UnitCounts) -> Self {
        BattleSide { player, units }
    }

    /// Builds a side from concrete units, grouped by type.
    pub fn from_units(state: &GameState, player: PlayerId, units: &[UnitId]) -> Self {
        BattleSide {
            player,
            units: counts_of(state, units),
        }
    }
}

/// Result of [`estimate_battle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleEstimate {
    pub attacker_wins: bool,
    /// Surviving attackers; every type that started the battle is present.
    pub attackers: UnitCounts,
    /// Surviving defenders; every type that started the battle is present.
    pub defenders: UnitCounts,
    pub rounds: u32,
    /// True if the round limit ended the estimate.
    pub exhausted: bool,
}

/// Groups units by type.
pub fn counts_of(state: &GameState, units: &[UnitId]) -> UnitCounts {
    let mut counts = UnitCounts::new();
    for &id in units {
        *counts.entry(state.unit(id).unit_type).or_insert(0) += 1;
    }
    counts
}

fn total(counts: &UnitCounts) -> u32 {
    counts.values().sum()
}

fn alive<'a>(
    state: &'a GameState,
    counts: &'a UnitCounts,
) -> impl Iterator<Item = (&'a UnitType, u32)> + 'a {
    counts
        .iter()
        .filter(|(_, &n)| n > 0)
        .map(move |(&ty, &n)| (state.unit_type(ty), n))
}

/// Attacking pips for one round, with the parts the sub rule needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AttackPips {
    total: u32,
    air: u32,
    planes_only: bool,
    destroyer: bool,
}

/// Pips of every live attacker plus one per infantry/artillery pair.
///
/// Infantry and artillery are counted per unit, not per unit type, so three
/// infantry and two artillery earn two support pips.
fn attack_pips(state: &GameState, attacker: PlayerId, attackers: &UnitCounts) -> AttackPips {
    let mut pips = AttackPips {
        planes_only: true,
        ..AttackPips::default()
    };
    let mut infantry = 0u32;
    let mut artillery = 0u32;
    for (ut, n) in alive(state, attackers) {
        let p = ut.attack_rolls(attacker) * ut.attack(attacker) * n;
        pips.total += p;
        if ut.is_infantry {
            infantry += n;
        }
        if ut.is_artillery {
            artillery += n;
        }
        if ut.is_air {
            pips.air += p;
        } else {
            pips.planes_only = false;
        }
        pips.destroyer |= ut.is_destroyer;
    }
    pips.total += infantry.min(artillery);
    pips
}

/// Hits scored by each side in one round: `(on_attacker, on_defender)`.
///
/// The combined-arms bonus comes from [`attack_pips`] and uses unit counts.
fn round_hits<R: Rng + ?Sized>(
    state: &GameState,
    attacker: PlayerId,
    attackers: &UnitCounts,
    defender: PlayerId,
    defenders: &UnitCounts,
    rng: &mut R,
) -> (u32, u32) {
    let AttackPips {
        total: mut attack,
        air: air_attack,
        planes_only,
        destroyer,
    } = attack_pips(state, attacker, attackers);

    let mut defense = 0u32;
    let mut subs_only = true;
    for (ut, n) in alive(state, defenders) {
        let pips = ut.defense_rolls(defender) * ut.defense(defender) * n;
        if ut.is_sub {
            if !planes_only {
                defense += pips;
            }
        } else {
            subs_only = false;
            defense += pips;
        }
    }
    if state.rules().restricted_subs && subs_only && !destroyer {
        attack = attack.saturating_sub(air_attack);
    }

    let mut on_defender = attack / PIPS_PER_HIT;
    let mut on_attacker = defense / PIPS_PER_HIT;
    let rem_attack = attack % PIPS_PER_HIT;
    let rem_defense = defense % PIPS_PER_HIT;

    if on_defender == 0 && on_attacker == 0 && rem_attack <= 2 && rem_defense <= 2 && rem_attack == rem_defense {
        // Small equal forces trade one unit each instead of stalling.
        return (1, 1);
    }

    let p_attack = rem_attack as f64 / PIPS_PER_HIT as f64;
    let p_defense = rem_defense as f64 / PIPS_PER_HIT as f64;
    let (mut succ_attack, mut succ_defense) = (0u32, 0u32);
    let mut passes = 0;
    while succ_attack == 0
        && succ_defense == 0
        && (rem_attack > 0 || rem_defense > 0)
        && passes < MAX_SAMPLING_PASSES
    {
        for trial in 1..=TRIALS {
            if rng.gen_bool(p_defense) {
                succ_defense += 1;
            }
            // The defender gets the first trial to itself.
            if trial > 1 && rng.gen_bool(p_attack) {
                succ_attack += 1;
            }
        }
        passes += 1;
    }
    if succ_defense >= EXTRA_HIT_SUCCESSES {
        on_attacker += 1;
    }
    if succ_attack >= EXTRA_HIT_SUCCESSES {
        on_defender += 1;
    }
    (on_attacker, on_defender)
}

/// Removal priority at equal pips: lower dies first.
fn keep_rank(ut: &UnitType) -> u8 {
    if ut.is_infantry || ut.is_artillery {
        2
    } else if ut.can_blitz {
        1
    } else {
        0
    }
}

/// Removes `hits` units worst-first. In land battles bombard-capable types
/// take no part and are dropped outright.
fn take_casualties(
    state: &GameState,
    counts: &mut UnitCounts,
    attacking: bool,
    mut hits: u32,
    player: PlayerId,
    domain: Domain,
) {
    let mut order: Vec<(UnitTypeId, u32, u8)> = Vec::with_capacity(counts.len());
    for (&ty, n) in counts.iter_mut() {
        let ut = state.unit_type(ty);
        if domain == Domain::Land && ut.can_bombard {
            *n = 0;
            continue;
        }
        let pip = if attacking {
            ut.attack(player)
        } else {
            ut.defense(player)
        };
        order.push((ty, pip, keep_rank(ut)));
    }
    order.sort_by_key(|&(_, pip, rank)| (pip, rank));

    for (ty, _, _) in order {
        if hits == 0 {
            break;
        }
        if let Some(n) = counts.get_mut(&ty) {
            let dead = (*n).min(hits);
            *n -= dead;
            hits -= dead;
        }
    }
}

/// Plays rounds until one side is destroyed.
///
/// A sea battle is won if any attacker survives; a land battle only if a
/// non-air attacker survives.
pub fn estimate_battle<R: Rng + ?Sized>(
    state: &GameState,
    attacker: &BattleSide,
    defender: &BattleSide,
    domain: Domain,
    rng: &mut R,
    config: &EstimatorConfig,
) -> BattleEstimate {
    let mut attackers = attacker.units.clone();
    let mut defenders = defender.units.clone();
    let mut rounds = 0;

    loop {
        let (on_attacker, on_defender) = round_hits(
            state,
            attacker.player,
            &attackers,
            defender.player,
            &defenders,
            rng,
        );
        take_casualties(state, &mut attackers, true, on_attacker, attacker.player, domain);
        take_casualties(state, &mut defenders, false, on_defender, defender.player, domain);
        rounds += 1;

        if total(&attackers) == 0 || total(&defenders) == 0 {
            break;
        }
        if rounds >= config.max_rounds {
            warn!(rounds, "battle estimate hit the round limit, scoring attacker loss");
            return BattleEstimate {
                attacker_wins: false,
                attackers,
                defenders,
                rounds,
                exhausted: true,
            };
        }
    }

    let attacker_wins = match domain {
        Domain::Sea => total(&attackers) > 0,
        Domain::Land => alive(state, &attackers).any(|(ut, _)| !ut.is_air),
    };
    BattleEstimate {
        attacker_wins,
        attackers,
        defenders,
        rounds,
        exhausted: false,
    }
}

/// Fraction of `trials` estimates the attacker wins.
pub fn win_rate<R: Rng + ?Sized>(
    state: &GameState,
    attacker: &BattleSide,
    defender: &BattleSide,
    domain: Domain,
    trials: u32,
    rng: &mut R,
    config: &EstimatorConfig,
) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    let wins = (0..trials)
        .filter(|_| estimate_battle(state, attacker, defender, domain, rng, config).attacker_wins)
        .count();
    wins as f64 / trials as f64
}
