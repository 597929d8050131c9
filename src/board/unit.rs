//! Unit types and unit instances.
//!
//! A [`UnitType`] is immutable value data shared by every unit of that
//! type. Stats can be modified per player (technology, national bonuses),
//! so all stat reads go through the player-parameterized accessors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Index into the snapshot's unit-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

impl UnitTypeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the snapshot's unit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Signed per-player adjustment applied on top of a unit type's base stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatBonus {
    pub attack: i32,
    pub defense: i32,
    pub attack_rolls: i32,
    pub defense_rolls: i32,
    pub movement: i32,
}

/// Static description of a kind of unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitType {
    pub name: String,
    pub attack: u32,
    pub defense: u32,
    pub attack_rolls: u32,
    pub defense_rolls: u32,
    pub movement: u32,
    pub is_air: bool,
    pub is_sea: bool,
    /// Factories, AA guns and similar: never counted as combat strength.
    pub is_infrastructure: bool,
    pub is_two_hit: bool,
    pub can_blitz: bool,
    pub is_sub: bool,
    pub is_destroyer: bool,
    /// Number of fighters this unit can carry; zero for non-carriers.
    pub carrier_capacity: u32,
    /// Carrier space used by this unit; non-zero means it can land on carriers.
    pub carrier_cost: u32,
    pub is_artillery: bool,
    pub artillery_supportable: bool,
    /// Transport space offered; zero for non-transports.
    pub transport_capacity: u32,
    pub transport_cost: u32,
    pub can_be_transported: bool,
    pub is_infantry: bool,
    pub is_aa: bool,
    pub can_bombard: bool,
    /// Production facility.
    pub can_produce: bool,
    pub bonuses: HashMap<PlayerId, StatBonus>,
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType {
            name: String::new(),
            attack: 0,
            defense: 0,
            attack_rolls: 1,
            defense_rolls: 1,
            movement: 1,
            is_air: false,
            is_sea: false,
            is_infrastructure: false,
            is_two_hit: false,
            can_blitz: false,
            is_sub: false,
            is_destroyer: false,
            carrier_capacity: 0,
            carrier_cost: 0,
            is_artillery: false,
            artillery_supportable: false,
            transport_capacity: 0,
            transport_cost: 0,
            can_be_transported: false,
            is_infantry: false,
            is_aa: false,
            can_bombard: false,
            can_produce: false,
            bonuses: HashMap::new(),
        }
    }
}

#[inline]
fn apply(base: u32, delta: i32) -> u32 {
    (base as i64 + delta as i64).max(0) as u32
}

impl UnitType {
    /// Creates a land unit type with the given stats and defaults elsewhere.
    pub fn land(name: &str, attack: u32, defense: u32, movement: u32) -> Self {
        UnitType {
            name: name.to_string(),
            attack,
            defense,
            movement,
            can_be_transported: true,
            ..UnitType::default()
        }
    }

    /// Creates a sea unit type.
    pub fn sea(name: &str, attack: u32, defense: u32, movement: u32) -> Self {
        UnitType {
            name: name.to_string(),
            attack,
            defense,
            movement,
            is_sea: true,
            ..UnitType::default()
        }
    }

    /// Creates an air unit type.
    pub fn air(name: &str, attack: u32, defense: u32, movement: u32) -> Self {
        UnitType {
            name: name.to_string(),
            attack,
            defense,
            movement,
            is_air: true,
            ..UnitType::default()
        }
    }

    fn bonus(&self, player: PlayerId) -> StatBonus {
        self.bonuses.get(&player).copied().unwrap_or_default()
    }

    pub fn attack(&self, player: PlayerId) -> u32 {
        apply(self.attack, self.bonus(player).attack)
    }

    pub fn defense(&self, player: PlayerId) -> u32 {
        apply(self.defense, self.bonus(player).defense)
    }

    pub fn attack_rolls(&self, player: PlayerId) -> u32 {
        apply(self.attack_rolls, self.bonus(player).attack_rolls)
    }

    pub fn defense_rolls(&self, player: PlayerId) -> u32 {
        apply(self.defense_rolls, self.bonus(player).defense_rolls)
    }

    pub fn movement(&self, player: PlayerId) -> u32 {
        apply(self.movement, self.bonus(player).movement)
    }

    #[inline]
    pub fn is_land(&self) -> bool {
        !self.is_sea && !self.is_air
    }

    #[inline]
    pub fn is_carrier(&self) -> bool {
        self.carrier_capacity > 0
    }

    #[inline]
    pub fn is_transport(&self) -> bool {
        self.transport_capacity > 0
    }

    /// Air unit that is able to land on a carrier.
    #[inline]
    pub fn can_land_on_carrier(&self) -> bool {
        self.is_air && self.carrier_cost > 0
    }
}

/// A single unit on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    /// Movement points still available this turn.
    pub movement_left: u32,
}

impl Unit {
    #[inline]
    pub fn can_move(&self) -> bool {
        self.movement_left > 0
    }
}
