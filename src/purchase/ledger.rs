//! Purchase ledgers and the scores they are ranked by.

use serde::{Deserialize, Serialize};

use crate::board::ProductionRule;

/// Quantity bought per production rule, aligned with the request's rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PurchaseLedger {
    pub quantities: Vec<u32>,
}

impl PurchaseLedger {
    pub fn zeroed(rules: usize) -> Self {
        PurchaseLedger {
            quantities: vec![0; rules],
        }
    }

    /// Quantity bought of rule `i`; zero for out-of-range indices.
    pub fn get(&self, i: usize) -> u32 {
        self.quantities.get(i).copied().unwrap_or(0)
    }

    pub fn units(&self) -> u32 {
        self.quantities.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units() == 0
    }

    pub fn cost(&self, rules: &[ProductionRule]) -> u64 {
        self.quantities
            .iter()
            .zip(rules)
            .map(|(&q, r)| q as u64 * r.cost as u64)
            .sum()
    }

    /// `(rule name, quantity)` for every rule bought at least once.
    pub fn named<'r>(&self, rules: &'r [ProductionRule]) -> Vec<(&'r str, u32)> {
        self.quantities
            .iter()
            .zip(rules)
            .filter(|(q, _)| **q > 0)
            .map(|(&q, r)| (r.name.as_str(), q))
            .collect()
    }
}

/// Totals of one enumerated purchase, after derating and bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MixScore {
    pub cost: u64,
    pub units: u32,
    pub attack: u32,
    pub defense: u32,
    pub movement: u32,
    pub infantry: u32,
    /// Transportable units that are neither infantry nor anti-air.
    pub non_infantry: u32,
}

impl MixScore {
    /// Infantry and transportable non-infantry differ by at most one.
    pub fn is_balanced(&self) -> bool {
        self.infantry.abs_diff(self.non_infantry) <= 1
    }
}

/// The best purchase found for each objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseMix {
    /// Highest attack.
    pub attack: PurchaseLedger,
    /// Highest defense.
    pub defense: PurchaseLedger,
    /// Highest attack among purchases with at least as many units as the
    /// previous best.
    pub max_units: PurchaseLedger,
    /// Highest attack with infantry balanced against other cargo.
    pub transport: PurchaseLedger,
    /// Highest attack, trading off against total movement.
    pub mobile_attack: PurchaseLedger,
    /// The deadline cut enumeration short.
    pub timed_out: bool,
    /// Purchases evaluated.
    pub points: u64,
}
