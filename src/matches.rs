//! Composable predicates over territories and units.
//!
//! A [`Pred`] is an immutable, cheaply clonable boolean test. Searches take
//! predicates as parameters and combine them with [`Pred::and`],
//! [`Pred::or`] and `!`, so call sites state their constraints without
//! building ad hoc closures for every query.
//!
//! The factory functions in [`terr`] and [`unit`] cover the conditions the
//! assessment layer needs. Those that depend on unit types or diplomacy
//! borrow the snapshot for their lifetime.

use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use crate::board::{Territory, Unit};

/// A shareable boolean test on `T`.
pub struct Pred<'a, T: ?Sized> {
    f: Arc<dyn Fn(&T) -> bool + Send + Sync + 'a>,
}

pub type TerritoryPred<'a> = Pred<'a, Territory>;
pub type UnitPred<'a> = Pred<'a, Unit>;

impl<T: ?Sized> Clone for Pred<'_, T> {
    fn clone(&self) -> Self {
        Pred {
            f: Arc::clone(&self.f),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Pred<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pred")
    }
}

impl<'a, T: ?Sized + 'a> Pred<'a, T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'a,
    {
        Pred { f: Arc::new(f) }
    }

    pub fn always() -> Self {
        Pred::new(|_| true)
    }

    pub fn never() -> Self {
        Pred::new(|_| false)
    }

    #[inline]
    pub fn test(&self, value: &T) -> bool {
        (self.f)(value)
    }

    pub fn and(self, other: Pred<'a, T>) -> Self {
        Pred::new(move |v| self.test(v) && other.test(v))
    }

    pub fn or(self, other: Pred<'a, T>) -> Self {
        Pred::new(move |v| self.test(v) || other.test(v))
    }

    /// Conjunction of every predicate; true when empty.
    pub fn all(preds: Vec<Pred<'a, T>>) -> Self {
        Pred::new(move |v| preds.iter().all(|p| p.test(v)))
    }

    /// Disjunction of every predicate; false when empty.
    pub fn any(preds: Vec<Pred<'a, T>>) -> Self {
        Pred::new(move |v| preds.iter().any(|p| p.test(v)))
    }
}

impl<'a, T: ?Sized + 'a> Not for Pred<'a, T> {
    type Output = Pred<'a, T>;

    fn not(self) -> Self::Output {
        Pred::new(move |v| !self.test(v))
    }
}

/// Territory predicates.
pub mod terr {
    use std::collections::HashSet;

    use super::{TerritoryPred, UnitPred};
    use crate::board::{GameState, PlayerId, TerritoryId};

    pub fn is_water<'a>() -> TerritoryPred<'a> {
        TerritoryPred::new(|t| t.is_water)
    }

    pub fn is_land<'a>() -> TerritoryPred<'a> {
        TerritoryPred::new(|t| t.is_land())
    }

    pub fn is_neutral<'a>() -> TerritoryPred<'a> {
        TerritoryPred::new(|t| t.is_neutral())
    }

    pub fn is_victory_city<'a>() -> TerritoryPred<'a> {
        TerritoryPred::new(|t| t.victory_city)
    }

    pub fn is<'a>(id: TerritoryId) -> TerritoryPred<'a> {
        TerritoryPred::new(move |t| t.id == id)
    }

    pub fn in_set(set: &HashSet<TerritoryId>) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| set.contains(&t.id))
    }

    /// Not impassable, and not neutral land when the rules close neutrals.
    pub fn is_passable(state: &GameState) -> TerritoryPred<'_> {
        let closed_neutrals = state.rules().neutrals_impassable;
        TerritoryPred::new(move |t| !t.impassable && !(closed_neutrals && t.is_neutral()))
    }

    /// Land a land unit may enter.
    pub fn is_passable_land(state: &GameState) -> TerritoryPred<'_> {
        is_land().and(is_passable(state))
    }

    pub fn owned_by<'a>(player: PlayerId) -> TerritoryPred<'a> {
        TerritoryPred::new(move |t| t.owner == Some(player))
    }

    /// Owned by `player` or one of its allies.
    pub fn is_allied(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| state.diplomacy().is_allied_owner(player, t.owner))
    }

    /// Owned by a player at war with `player`; neutrals do not count.
    pub fn is_enemy(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| state.diplomacy().is_enemy_owner(player, t.owner))
    }

    /// Enemy-owned passable land.
    pub fn is_enemy_land(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        is_enemy(state, player).and(is_passable_land(state))
    }

    pub fn has_units<'a>() -> TerritoryPred<'a> {
        TerritoryPred::new(|t| !t.units.is_empty())
    }

    pub fn has_units_matching<'a>(state: &'a GameState, pred: UnitPred<'a>) -> TerritoryPred<'a> {
        TerritoryPred::new(move |t| t.units.iter().any(|&u| pred.test(state.unit(u))))
    }

    /// Holds more than `min` units accepted by `pred`.
    pub fn has_more_than<'a>(
        state: &'a GameState,
        pred: UnitPred<'a>,
        min: usize,
    ) -> TerritoryPred<'a> {
        TerritoryPred::new(move |t| {
            t.units.iter().filter(|&&u| pred.test(state.unit(u))).count() > min
        })
    }

    /// No unit belonging to a player at war with `player`.
    pub fn has_no_enemy_units(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| {
            t.units
                .iter()
                .all(|&u| state.is_allied(player, state.unit(u).owner))
        })
    }

    /// Water holding no combat unit hostile to `player`.
    pub fn is_open_sea(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| {
            t.is_water
                && t.units.iter().all(|&u| {
                    let unit = state.unit(u);
                    state.is_allied(player, unit.owner) || state.type_of(unit).is_infrastructure
                })
        })
    }

    /// Enemy-owned territory with an enemy production facility.
    pub fn is_enemy_factory(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| {
            state.diplomacy().is_enemy_owner(player, t.owner)
                && t.units.iter().any(|&u| {
                    let unit = state.unit(u);
                    !state.is_allied(player, unit.owner) && state.type_of(unit).can_produce
                })
        })
    }

    /// Allied territory with an allied production facility.
    pub fn is_allied_factory(state: &GameState, player: PlayerId) -> TerritoryPred<'_> {
        TerritoryPred::new(move |t| {
            state.diplomacy().is_allied_owner(player, t.owner)
                && t.units.iter().any(|&u| {
                    let unit = state.unit(u);
                    state.is_allied(player, unit.owner) && state.type_of(unit).can_produce
                })
        })
    }
}

/// Unit predicates.
pub mod unit {
    use super::UnitPred;
    use crate::board::{GameState, PlayerId, UnitType};

    fn typed<F>(state: &GameState, f: F) -> UnitPred<'_>
    where
        F: Fn(&UnitType) -> bool + Send + Sync + 'static,
    {
        UnitPred::new(move |u| f(state.type_of(u)))
    }

    pub fn owned_by<'a>(player: PlayerId) -> UnitPred<'a> {
        UnitPred::new(move |u| u.owner == player)
    }

    pub fn is_allied(state: &GameState, player: PlayerId) -> UnitPred<'_> {
        UnitPred::new(move |u| state.is_allied(player, u.owner))
    }

    pub fn is_enemy(state: &GameState, player: PlayerId) -> UnitPred<'_> {
        UnitPred::new(move |u| !state.is_allied(player, u.owner))
    }

    pub fn can_move<'a>() -> UnitPred<'a> {
        UnitPred::new(|u| u.can_move())
    }

    pub fn is_air(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_air)
    }

    pub fn is_sea(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_sea)
    }

    pub fn is_land(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_land())
    }

    pub fn can_blitz(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.can_blitz)
    }

    pub fn is_transport(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_transport())
    }

    pub fn is_carrier(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_carrier())
    }

    pub fn is_infantry(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_infantry)
    }

    pub fn is_infrastructure(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.is_infrastructure)
    }

    pub fn can_produce(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.can_produce)
    }

    /// Can ride a transport and is not an anti-aircraft gun.
    pub fn is_transportable(state: &GameState) -> UnitPred<'_> {
        typed(state, |t| t.can_be_transported && !t.is_aa)
    }

    pub fn attack_at_least(state: &GameState, min: u32) -> UnitPred<'_> {
        UnitPred::new(move |u| state.type_of(u).attack(u.owner) >= min)
    }

    pub fn defense_at_least(state: &GameState, min: u32) -> UnitPred<'_> {
        UnitPred::new(move |u| state.type_of(u).defense(u.owner) >= min)
    }
}
