//! Territory definitions.
//!
//! A territory is a node of the strategic map: land or water, optionally
//! impassable, with a production value, an owner and the units present.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::unit::UnitId;

/// Index into the snapshot's territory table and the adjacency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerritoryId(pub u32);

impl TerritoryId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of the strategic map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub is_water: bool,
    pub impassable: bool,
    /// Production value credited to the owner each turn.
    pub production: u32,
    /// `None` for neutral land and unowned sea zones.
    pub owner: Option<PlayerId>,
    pub victory_city: bool,
    /// Set when this territory is the capital of the given player.
    pub capital_of: Option<PlayerId>,
    pub units: Vec<UnitId>,
}

impl Territory {
    pub fn new(id: TerritoryId, name: &str, is_water: bool) -> Self {
        Territory {
            id,
            name: name.to_string(),
            is_water,
            impassable: false,
            production: 0,
            owner: None,
            victory_city: false,
            capital_of: None,
            units: Vec::new(),
        }
    }

    #[inline]
    pub fn is_land(&self) -> bool {
        !self.is_water
    }

    /// Unowned land.
    #[inline]
    pub fn is_neutral(&self) -> bool {
        !self.is_water && self.owner.is_none()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
