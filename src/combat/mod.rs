//! Combat power and battle estimation.

pub mod estimator;
pub mod strength;

pub use estimator::{
    counts_of, estimate_battle, win_rate, BattleEstimate, BattleSide, EstimatorConfig, UnitCounts,
};
pub use strength::{air_score, score, unit_score, units_up_to_strength, Domain};
