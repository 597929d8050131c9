//! Warplan: decision support for territory-conquest AIs.
//!
//! Reads a [`board::GameState`] snapshot and answers the questions an
//! automated player asks each turn: where the enemy can strike and how hard,
//! which territories are worth taking or holding, which units should move,
//! how a battle is likely to go, and what to buy. Nothing here mutates the
//! game; every answer is a recommendation for the host to apply.

pub mod advisor;
pub mod board;
pub mod combat;
pub mod config;
pub mod error;
pub mod eval;
pub mod matches;
pub mod purchase;
pub mod search;

pub use advisor::Advisor;
pub use config::AdvisorConfig;
pub use error::{Error, Result};
