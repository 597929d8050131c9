//! Game-state snapshot.
//!
//! [`GameState`] bundles the map graph, territories, units, unit types,
//! players and diplomacy that one assessment call reads. It is immutable
//! once built: hosts assemble it through [`GameStateBuilder`] from their
//! authoritative engine and hand out shared references.

use std::collections::{HashMap, HashSet};

use super::graph::TerritoryGraph;
use super::player::{Diplomacy, Player, PlayerId};
use super::territory::{Territory, TerritoryId};
use super::unit::{Unit, UnitId, UnitType, UnitTypeId};

/// Errors raised while assembling or querying a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("duplicate territory name '{0}'")]
    DuplicateTerritory(String),

    #[error("unknown territory id {0}")]
    UnknownTerritory(u32),

    #[error("unknown unit type id {0}")]
    UnknownUnitType(u16),

    #[error("unknown player id {0}")]
    UnknownPlayer(u16),

    #[error("unknown unit id {0}")]
    UnknownUnit(u32),

    #[error("unit {0} has no transport capacity")]
    NotATransport(u32),
}

/// Rule switches that change how threats and battles are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    /// Resource cost to enter a neutral territory; zero means free.
    pub neutral_charge: u32,
    /// Air units cannot hit submarines unless a destroyer is present.
    pub restricted_subs: bool,
    /// Neutral land blocks land and air movement.
    pub neutrals_impassable: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            neutral_charge: 0,
            restricted_subs: true,
            neutrals_impassable: false,
        }
    }
}

/// A canal joining two sea zones, usable only by players allied with the
/// owners of every controlling land territory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canal {
    pub name: String,
    pub seas: (TerritoryId, TerritoryId),
    pub controls: Vec<TerritoryId>,
}

impl Canal {
    pub fn joins(&self, a: TerritoryId, b: TerritoryId) -> bool {
        (self.seas.0 == a && self.seas.1 == b) || (self.seas.0 == b && self.seas.1 == a)
    }
}

/// Maps each transport to the units it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportTracker {
    loads: HashMap<UnitId, Vec<UnitId>>,
    carried_by: HashMap<UnitId, UnitId>,
}

impl TransportTracker {
    pub fn load(&mut self, transport: UnitId, cargo: UnitId) {
        self.loads.entry(transport).or_default().push(cargo);
        self.carried_by.insert(cargo, transport);
    }

    /// Units loaded on `transport`; empty if none.
    pub fn transporting(&self, transport: UnitId) -> &[UnitId] {
        self.loads.get(&transport).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_loaded(&self, unit: UnitId) -> bool {
        self.carried_by.contains_key(&unit)
    }

    pub fn carrier_of(&self, unit: UnitId) -> Option<UnitId> {
        self.carried_by.get(&unit).copied()
    }
}

/// A purchasable unit and its price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRule {
    pub name: String,
    pub unit_type: UnitTypeId,
    pub cost: u32,
}

/// Read-only view of the game at one decision point.
#[derive(Debug, Clone)]
pub struct GameState {
    graph: TerritoryGraph,
    territories: Vec<Territory>,
    unit_types: Vec<UnitType>,
    units: Vec<Unit>,
    players: Vec<Player>,
    diplomacy: Diplomacy,
    canals: Vec<Canal>,
    transports: TransportTracker,
    production_rules: Vec<ProductionRule>,
    rules: GameRules,
}

impl GameState {
    #[inline]
    pub fn graph(&self) -> &TerritoryGraph {
        &self.graph
    }

    /// Returns the territory with the given id.
    ///
    /// Panics if the id was not issued for this snapshot; use
    /// [`GameState::try_territory`] for ids from an outside source.
    #[inline]
    pub fn territory(&self, id: TerritoryId) -> &Territory {
        &self.territories[id.index()]
    }

    pub fn try_territory(&self, id: TerritoryId) -> Result<&Territory, BoardError> {
        self.territories
            .get(id.index())
            .ok_or(BoardError::UnknownTerritory(id.0))
    }

    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    pub fn find_territory(&self, name: &str) -> Option<TerritoryId> {
        self.territories.iter().find(|t| t.name == name).map(|t| t.id)
    }

    #[inline]
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    #[inline]
    pub fn unit_type(&self, id: UnitTypeId) -> &UnitType {
        &self.unit_types[id.index()]
    }

    #[inline]
    pub fn type_of(&self, unit: &Unit) -> &UnitType {
        self.unit_type(unit.unit_type)
    }

    pub fn try_unit_type(&self, id: UnitTypeId) -> Result<&UnitType, BoardError> {
        self.unit_types
            .get(id.index())
            .ok_or(BoardError::UnknownUnitType(id.0))
    }

    pub fn unit_types(&self) -> &[UnitType] {
        &self.unit_types
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Units currently in `t`.
    pub fn units_in(&self, t: TerritoryId) -> impl Iterator<Item = &Unit> + '_ {
        self.territory(t).units.iter().map(move |&u| self.unit(u))
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Panics on an id from another snapshot, like [`GameState::territory`].
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn try_player(&self, id: PlayerId) -> Result<&Player, BoardError> {
        self.players
            .get(id.index())
            .ok_or(BoardError::UnknownPlayer(id.0))
    }

    pub fn diplomacy(&self) -> &Diplomacy {
        &self.diplomacy
    }

    #[inline]
    pub fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        self.diplomacy.is_allied(a, b)
    }

    /// Every player not allied with `player`, in player-table order.
    pub fn enemies_of(&self, player: PlayerId) -> Vec<PlayerId> {
        self.players
            .iter()
            .map(|p| p.id)
            .filter(|&p| !self.is_allied(player, p))
            .collect()
    }

    pub fn capital_of(&self, player: PlayerId) -> Option<TerritoryId> {
        self.territories
            .iter()
            .find(|t| t.capital_of == Some(player))
            .map(|t| t.id)
    }

    /// Capitals of players opposed to `player` that are still held by a
    /// player opposed to `player`.
    pub fn enemy_capitals(&self, player: PlayerId) -> Vec<TerritoryId> {
        self.enemies_of(player)
            .into_iter()
            .filter_map(|e| self.capital_of(e))
            .filter(|&c| self.diplomacy.is_enemy_owner(player, self.territory(c).owner))
            .collect()
    }

    pub fn canals(&self) -> &[Canal] {
        &self.canals
    }

    /// True if moving `from -> to` crosses a canal `player` may not use.
    pub fn canal_blocks(&self, from: TerritoryId, to: TerritoryId, player: PlayerId) -> bool {
        self.canals.iter().filter(|c| c.joins(from, to)).any(|c| {
            c.controls
                .iter()
                .any(|&t| !self.diplomacy.is_allied_owner(player, self.territory(t).owner))
        })
    }

    pub fn transports(&self) -> &TransportTracker {
        &self.transports
    }

    pub fn production_rules(&self) -> &[ProductionRule] {
        &self.production_rules
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }
}

/// Incremental constructor for [`GameState`].
///
/// Ids handed out by the builder are only validated in [`build`], so
/// callers can wire the map in any order.
///
/// [`build`]: GameStateBuilder::build
#[derive(Debug, Default)]
pub struct GameStateBuilder {
    territories: Vec<Territory>,
    edges: Vec<(TerritoryId, TerritoryId)>,
    unit_types: Vec<UnitType>,
    units: Vec<(Unit, TerritoryId)>,
    players: Vec<Player>,
    diplomacy: Diplomacy,
    canals: Vec<Canal>,
    loads: Vec<(UnitId, UnitId)>,
    production_rules: Vec<ProductionRule>,
    rules: GameRules,
}

impl GameStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, name: &str, resources: u32) -> PlayerId {
        let id = PlayerId(self.players.len() as u16);
        self.players.push(Player {
            id,
            name: name.to_string(),
            resources,
        });
        id
    }

    pub fn ally(&mut self, a: PlayerId, b: PlayerId) -> &mut Self {
        self.diplomacy.ally(a, b);
        self
    }

    pub fn add_unit_type(&mut self, unit_type: UnitType) -> UnitTypeId {
        self.unit_types.push(unit_type);
        UnitTypeId((self.unit_types.len() - 1) as u16)
    }

    fn push_territory(&mut self, name: &str, is_water: bool) -> TerritoryId {
        let id = TerritoryId(self.territories.len() as u32);
        self.territories.push(Territory::new(id, name, is_water));
        id
    }

    /// Adds a land territory.
    pub fn add_land(&mut self, name: &str, owner: Option<PlayerId>, production: u32) -> TerritoryId {
        let id = self.push_territory(name, false);
        let t = &mut self.territories[id.index()];
        t.owner = owner;
        t.production = production;
        id
    }

    /// Adds an unowned sea zone.
    pub fn add_sea(&mut self, name: &str) -> TerritoryId {
        self.push_territory(name, true)
    }

    /// Mutable access for flags not covered by the helpers.
    ///
    /// Panics if `id` was not issued by this builder.
    pub fn territory_mut(&mut self, id: TerritoryId) -> &mut Territory {
        &mut self.territories[id.index()]
    }

    pub fn set_capital(&mut self, t: TerritoryId, player: PlayerId) -> &mut Self {
        self.territory_mut(t).capital_of = Some(player);
        self
    }

    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) -> &mut Self {
        self.edges.push((a, b));
        self
    }

    /// Places a unit with full movement for its owner.
    pub fn add_unit(&mut self, t: TerritoryId, unit_type: UnitTypeId, owner: PlayerId) -> UnitId {
        let movement = self
            .unit_types
            .get(unit_type.index())
            .map_or(0, |ut| ut.movement(owner));
        let id = UnitId(self.units.len() as u32);
        self.units.push((
            Unit {
                id,
                unit_type,
                owner,
                movement_left: movement,
            },
            t,
        ));
        id
    }

    /// Places `count` identical units and returns their ids.
    pub fn add_units(
        &mut self,
        t: TerritoryId,
        unit_type: UnitTypeId,
        owner: PlayerId,
        count: usize,
    ) -> Vec<UnitId> {
        (0..count).map(|_| self.add_unit(t, unit_type, owner)).collect()
    }

    pub fn set_movement_left(&mut self, unit: UnitId, movement: u32) -> &mut Self {
        if let Some((u, _)) = self.units.get_mut(unit.index()) {
            u.movement_left = movement;
        }
        self
    }

    pub fn load(&mut self, transport: UnitId, cargo: UnitId) -> &mut Self {
        self.loads.push((transport, cargo));
        self
    }

    pub fn add_canal(&mut self, canal: Canal) -> &mut Self {
        self.canals.push(canal);
        self
    }

    pub fn add_production_rule(&mut self, name: &str, unit_type: UnitTypeId, cost: u32) -> usize {
        self.production_rules.push(ProductionRule {
            name: name.to_string(),
            unit_type,
            cost,
        });
        self.production_rules.len() - 1
    }

    pub fn rules(&mut self, rules: GameRules) -> &mut Self {
        self.rules = rules;
        self
    }

    /// Validates every id and produces the snapshot.
    pub fn build(self) -> Result<GameState, BoardError> {
        let n_terr = self.territories.len();
        let n_players = self.players.len();
        let check_t = |t: TerritoryId| {
            if t.index() < n_terr {
                Ok(())
            } else {
                Err(BoardError::UnknownTerritory(t.0))
            }
        };
        let check_p = |p: PlayerId| {
            if p.index() < n_players {
                Ok(())
            } else {
                Err(BoardError::UnknownPlayer(p.0))
            }
        };

        let mut names = HashSet::new();
        for t in &self.territories {
            if !names.insert(t.name.as_str()) {
                return Err(BoardError::DuplicateTerritory(t.name.clone()));
            }
            if let Some(o) = t.owner {
                check_p(o)?;
            }
            if let Some(c) = t.capital_of {
                check_p(c)?;
            }
        }

        let mut graph = TerritoryGraph::with_nodes(n_terr);
        for &(a, b) in &self.edges {
            check_t(a)?;
            check_t(b)?;
            graph.connect(a, b);
        }

        let mut territories = self.territories;
        let mut units = Vec::with_capacity(self.units.len());
        for (unit, t) in self.units {
            check_t(t)?;
            check_p(unit.owner)?;
            if unit.unit_type.index() >= self.unit_types.len() {
                return Err(BoardError::UnknownUnitType(unit.unit_type.0));
            }
            territories[t.index()].units.push(unit.id);
            units.push(unit);
        }

        let mut transports = TransportTracker::default();
        for (transport, cargo) in self.loads {
            let tu = units
                .get(transport.index())
                .ok_or(BoardError::UnknownUnit(transport.0))?;
            if cargo.index() >= units.len() {
                return Err(BoardError::UnknownUnit(cargo.0));
            }
            if !self.unit_types[tu.unit_type.index()].is_transport() {
                return Err(BoardError::NotATransport(transport.0));
            }
            transports.load(transport, cargo);
        }

        for canal in &self.canals {
            check_t(canal.seas.0)?;
            check_t(canal.seas.1)?;
            for &c in &canal.controls {
                check_t(c)?;
            }
        }
        for rule in &self.production_rules {
            if rule.unit_type.index() >= self.unit_types.len() {
                return Err(BoardError::UnknownUnitType(rule.unit_type.0));
            }
        }

        Ok(GameState {
            graph,
            territories,
            unit_types: self.unit_types,
            units,
            players: self.players,
            diplomacy: self.diplomacy,
            canals: self.canals,
            transports,
            production_rules: self.production_rules,
            rules: self.rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_map() -> (GameStateBuilder, PlayerId, PlayerId) {
        let mut b = GameStateBuilder::new();
        let red = b.add_player("red", 20);
        let blue = b.add_player("blue", 20);
        (b, red, blue)
    }

    #[test]
    fn build_places_units_in_territories() {
        let (mut b, red, _) = two_player_map();
        let inf = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
        let home = b.add_land("home", Some(red), 3);
        let ids = b.add_units(home, inf, red, 3);
        let state = b.build().unwrap();
        assert_eq!(state.territory(home).units, ids);
        assert_eq!(state.units_in(home).count(), 3);
        assert!(state.units_in(home).all(|u| u.movement_left == 1));
    }

    #[test]
    fn foreign_ids_are_errors_through_try_lookups() {
        let (mut b, red, _) = two_player_map();
        b.add_land("home", Some(red), 3);
        let state = b.build().unwrap();
        assert_eq!(state.try_player(red).unwrap().name, "red");
        assert!(matches!(state.try_player(PlayerId(7)), Err(BoardError::UnknownPlayer(7))));
        assert!(matches!(
            state.try_territory(TerritoryId(3)),
            Err(BoardError::UnknownTerritory(3))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut b, red, _) = two_player_map();
        b.add_land("home", Some(red), 3);
        b.add_land("home", Some(red), 1);
        assert!(matches!(b.build(), Err(BoardError::DuplicateTerritory(n)) if n == "home"));
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let (mut b, red, _) = two_player_map();
        let home = b.add_land("home", Some(red), 3);
        b.connect(home, TerritoryId(9));
        assert!(matches!(b.build(), Err(BoardError::UnknownTerritory(9))));
    }

    #[test]
    fn loading_requires_transport_capacity() {
        let (mut b, red, _) = two_player_map();
        let inf = b.add_unit_type(UnitType::land("infantry", 1, 2, 1));
        let home = b.add_land("home", Some(red), 3);
        let a = b.add_unit(home, inf, red);
        let c = b.add_unit(home, inf, red);
        b.load(a, c);
        assert!(matches!(b.build(), Err(BoardError::NotATransport(0))));
    }

    #[test]
    fn canal_blocks_players_without_control() {
        let (mut b, red, blue) = two_player_map();
        let west = b.add_sea("west");
        let east = b.add_sea("east");
        let isthmus = b.add_land("isthmus", Some(red), 1);
        b.connect(west, east);
        b.add_canal(Canal {
            name: "cut".into(),
            seas: (west, east),
            controls: vec![isthmus],
        });
        let state = b.build().unwrap();
        assert!(!state.canal_blocks(west, east, red));
        assert!(state.canal_blocks(east, west, blue));
    }

    #[test]
    fn enemy_capitals_skip_captured_ones() {
        let (mut b, red, blue) = two_player_map();
        let green = b.add_player("green", 0);
        let blue_cap = b.add_land("blue_cap", Some(blue), 8);
        let green_cap = b.add_land("green_cap", Some(red), 8);
        b.set_capital(blue_cap, blue).set_capital(green_cap, green);
        let state = b.build().unwrap();
        assert_eq!(state.enemies_of(red), vec![blue, green]);
        assert_eq!(state.enemy_capitals(red), vec![blue_cap]);
    }
}
