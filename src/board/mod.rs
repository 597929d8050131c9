//! Board representation and snapshot types.
//!
//! Contains the territory graph, territories, units, players and the
//! overall game-state snapshot that every assessment reads.

pub mod graph;
pub mod player;
pub mod route;
pub mod state;
pub mod territory;
pub mod unit;

pub use graph::TerritoryGraph;
pub use player::{Diplomacy, Player, PlayerId};
pub use route::Route;
pub use state::{
    BoardError, Canal, GameRules, GameState, GameStateBuilder, ProductionRule, TransportTracker,
};
pub use territory::{Territory, TerritoryId};
pub use unit::{StatBonus, Unit, UnitId, UnitType, UnitTypeId};
