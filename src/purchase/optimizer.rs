//! Exhaustive purchase enumeration under a wall-clock deadline.
//!
//! Every quantity vector within budget and unit cap is visited once, in rule
//! order with the last rule counting fastest. Each visited purchase is scored
//! with derated stats and offered to five independent objectives.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ledger::{MixScore, PurchaseLedger, PurchaseMix};
use crate::board::{BoardError, GameState, PlayerId, ProductionRule, UnitType};

/// Above this many `max_units × rules`, each level may halve its cap.
const HALVING_THRESHOLD: u64 = 1000;

/// Attack added per fighter riding on a purchased carrier.
const CARRIED_ATTACK: u32 = 3;

/// Defense added per fighter riding on a purchased carrier.
const CARRIED_DEFENSE: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("no production rules to choose from")]
    NoRules,

    #[error("nothing affordable within a budget of {budget}")]
    NothingAffordable { budget: u32 },

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Search bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseConfig {
    pub time_limit_ms: u64,
    /// Purchases evaluated between deadline checks.
    pub check_interval: u64,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        PurchaseConfig {
            time_limit_ms: 150_000,
            check_interval: 64,
        }
    }
}

/// What a player may spend this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub player: PlayerId,
    pub budget: u32,
    pub max_units: u32,
    pub rules: Vec<ProductionRule>,
    /// Fighters waiting at home that purchased carriers could take aboard.
    pub escort_fighters: u32,
}

/// Per-rule stats, derated and flattened for the inner loop.
#[derive(Debug, Clone, Copy)]
struct RuleProfile {
    cost: u32,
    attack: u32,
    defense: u32,
    rolls: u32,
    movement: u32,
    two_hit: bool,
    carrier_capacity: u32,
    artillery: bool,
    supportable: bool,
    infantry: bool,
    non_infantry: bool,
}

/// Discourages units the planner cannot use well: submarines, immobile
/// units, and specialists whose attack and defense are far apart.
fn derate(ut: &UnitType, player: PlayerId) -> (u32, u32) {
    let (base_atk, base_def) = (ut.attack(player), ut.defense(player));
    let (mut atk, mut def) = (base_atk, base_def);

    if ut.is_sub {
        if atk >= 1 {
            atk -= 1;
        } else if def >= 1 {
            def -= 1;
        }
    }
    if ut.movement(player) == 0 {
        atk = 0;
    }

    let def_gap = base_def.saturating_sub(base_atk);
    if (base_atk == 0 || def_gap >= 4) && base_def >= 1 {
        def = def.saturating_sub(1);
        if def_gap >= 4 {
            def = def.saturating_sub(1);
        }
    }
    let atk_gap = base_atk.saturating_sub(base_def);
    if (base_def == 0 || atk_gap >= 4) && base_atk >= 1 {
        atk = atk.saturating_sub(1);
        if atk_gap >= 4 {
            atk = atk.saturating_sub(1);
        }
    }
    (atk, def)
}

impl RuleProfile {
    fn new(state: &GameState, player: PlayerId, rule: &ProductionRule) -> Result<Self, BoardError> {
        let ut = state.try_unit_type(rule.unit_type)?;
        let (attack, defense) = derate(ut, player);
        Ok(RuleProfile {
            cost: rule.cost,
            attack,
            defense,
            rolls: ut.attack_rolls(player),
            movement: ut.movement(player),
            two_hit: ut.is_two_hit,
            carrier_capacity: ut.carrier_capacity,
            artillery: ut.is_artillery,
            supportable: ut.artillery_supportable,
            infantry: ut.is_infantry,
            non_infantry: ut.can_be_transported && !ut.is_infantry && !ut.is_aa,
        })
    }
}

/// Best purchase seen so far for one objective.
#[derive(Debug, Clone)]
struct Best {
    score: MixScore,
    quantities: Vec<u32>,
}

impl Best {
    fn new(rules: usize) -> Self {
        Best {
            score: MixScore::default(),
            quantities: vec![0; rules],
        }
    }

    fn take(&mut self, score: &MixScore, quantities: &[u32]) {
        self.score = *score;
        self.quantities.copy_from_slice(quantities);
    }

    fn into_ledger(self) -> PurchaseLedger {
        PurchaseLedger {
            quantities: self.quantities,
        }
    }
}

#[derive(Debug, Clone)]
struct Objectives {
    attack: Best,
    defense: Best,
    max_units: Best,
    transport: Best,
    mobile_attack: Best,
}

impl Objectives {
    fn new(rules: usize) -> Self {
        Objectives {
            attack: Best::new(rules),
            defense: Best::new(rules),
            max_units: Best::new(rules),
            transport: Best::new(rules),
            mobile_attack: Best::new(rules),
        }
    }

    fn offer<R: Rng>(&mut self, s: &MixScore, quantities: &[u32], rng: &mut R) {
        let best = self.attack.score.attack;
        if s.attack > best || (s.attack == best && rng.gen_bool(0.5)) {
            self.attack.take(s, quantities);
        }

        let best = self.defense.score.defense;
        if s.defense > best || (s.defense == best && rng.gen_bool(0.5)) {
            self.defense.take(s, quantities);
        }

        let best = self.max_units.score;
        if s.attack > best.attack && s.units >= best.units {
            self.max_units.take(s, quantities);
        }

        if s.attack > self.transport.score.attack && s.is_balanced() {
            self.transport.take(s, quantities);
        }

        let best = self.mobile_attack.score;
        if (s.attack >= best.attack && s.movement > best.movement)
            || (s.attack > best.attack && s.movement >= best.movement)
        {
            self.mobile_attack.take(s, quantities);
        }
    }
}

/// Searches production-rule quantities for the five purchase objectives.
#[derive(Debug, Clone)]
pub struct PurchaseOptimizer {
    profiles: Vec<RuleProfile>,
    budget: u32,
    max_units: u32,
    escort_fighters: u32,
    config: PurchaseConfig,
}

impl PurchaseOptimizer {
    pub fn new(
        state: &GameState,
        request: &PurchaseRequest,
        config: PurchaseConfig,
    ) -> Result<Self, PurchaseError> {
        if request.rules.is_empty() {
            return Err(PurchaseError::NoRules);
        }
        let profiles = request
            .rules
            .iter()
            .map(|r| RuleProfile::new(state, request.player, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PurchaseOptimizer {
            profiles,
            budget: request.budget,
            max_units: request.max_units,
            escort_fighters: request.escort_fighters,
            config,
        })
    }

    /// Scores a purchase the way the search does.
    ///
    /// Every second unit of a rule adds one to each non-zero stat. Carriers
    /// take unassigned escort fighters aboard in rule order, and artillery
    /// gains one attack per unit while supportable infantry bought so far
    /// outnumbers it.
    pub fn score(&self, ledger: &PurchaseLedger) -> MixScore {
        self.score_quantities(&ledger.quantities)
    }

    fn score_quantities(&self, quantities: &[u32]) -> MixScore {
        let mut s = MixScore::default();
        let mut fighters_left = self.escort_fighters;
        let mut supportable = 0u32;

        for (p, &q) in self.profiles.iter().zip(quantities) {
            for i in 1..=q {
                s.cost += p.cost as u64;
                s.units += 1;
                if p.infantry {
                    s.infantry += 1;
                } else if p.non_infantry {
                    s.non_infantry += 1;
                }
                if p.supportable {
                    supportable += 1;
                }

                let carried = p.carrier_capacity.min(fighters_left);
                fighters_left -= carried;
                let even = i % 2 == 0;

                let mut bonus_attack = CARRIED_ATTACK * carried;
                if p.two_hit {
                    bonus_attack += p.attack;
                }
                if p.attack > 0 && even {
                    bonus_attack += 1;
                }
                if p.artillery && i <= supportable {
                    bonus_attack += 1;
                }

                let mut bonus_defense = CARRIED_DEFENSE * carried;
                if p.two_hit {
                    bonus_defense += p.defense;
                }
                if p.defense > 0 && even {
                    bonus_defense += 1;
                }

                s.attack += p.attack * p.rolls + bonus_attack;
                s.defense += p.defense * p.rolls + bonus_defense;
                s.movement += p.movement;
            }
        }
        s
    }

    fn halves_caps(&self) -> bool {
        self.max_units as u64 * self.profiles.len() as u64 > HALVING_THRESHOLD
    }

    fn level_cap<R: Rng>(&self, halving: bool, rng: &mut R) -> u32 {
        if halving && rng.gen_bool(0.5) {
            self.max_units / 2
        } else {
            self.max_units
        }
    }

    /// Moves `current` to the next purchase within budget and cap.
    ///
    /// Digits past the one that advanced are zero, so the cost and unit
    /// count only need the prefix. Returns false once every purchase has
    /// been visited.
    fn advance<R: Rng>(
        &self,
        current: &mut [u32],
        caps: &mut [u32],
        halving: bool,
        rng: &mut R,
    ) -> bool {
        for i in (0..current.len()).rev() {
            current[i] += 1;
            let units_before: u32 = current[..i].iter().sum();
            let cost: u64 = current[..=i]
                .iter()
                .zip(&self.profiles)
                .map(|(&q, p)| q as u64 * p.cost as u64)
                .sum();
            if current[i] <= caps[i].saturating_sub(units_before) && cost <= self.budget as u64 {
                for cap in &mut caps[i + 1..] {
                    *cap = self.level_cap(halving, rng);
                }
                return true;
            }
            current[i] = 0;
        }
        false
    }

    /// Runs the search. Hitting the deadline is not an error: the best
    /// purchases found so far are returned with `timed_out` set.
    pub fn optimize<R: Rng>(&self, rng: &mut R) -> Result<PurchaseMix, PurchaseError> {
        let start = Instant::now();
        let deadline = start + Duration::from_millis(self.config.time_limit_ms);
        let interval = self.config.check_interval.max(1);

        let n = self.profiles.len();
        let halving = self.halves_caps();
        let mut caps: Vec<u32> = (0..n).map(|_| self.level_cap(halving, rng)).collect();
        let mut current = vec![0u32; n];
        let mut objectives = Objectives::new(n);
        let mut points: u64 = 0;
        let mut affordable = false;
        let mut timed_out = false;

        loop {
            if points % interval == 0 && Instant::now() >= deadline {
                timed_out = true;
                break;
            }
            points += 1;

            let score = self.score_quantities(&current);
            if score.cost > 0 {
                affordable = true;
                objectives.offer(&score, &current, rng);
            }

            if !self.advance(&mut current, &mut caps, halving, rng) {
                break;
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if timed_out {
            warn!(points, elapsed_ms, "purchase search hit its deadline; keeping best so far");
        } else if !affordable {
            return Err(PurchaseError::NothingAffordable {
                budget: self.budget,
            });
        }

        debug!(
            points,
            elapsed_ms,
            attack = objectives.attack.score.attack,
            defense = objectives.defense.score.defense,
            "purchase search finished"
        );

        Ok(PurchaseMix {
            attack: objectives.attack.into_ledger(),
            defense: objectives.defense.into_ledger(),
            max_units: objectives.max_units.into_ledger(),
            transport: objectives.transport.into_ledger(),
            mobile_attack: objectives.mobile_attack.into_ledger(),
            timed_out,
            points,
        })
    }
}
