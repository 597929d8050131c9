//! Players and the alliance relation between them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Identifies a player by index into the snapshot's player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

impl PlayerId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Unspent production currency.
    pub resources: u32,
}

/// Symmetric alliance relation.
///
/// Every player is allied with itself. Neutral territory (no owner) is
/// allied with nobody, so callers that take an `Option<PlayerId>` owner
/// should go through [`Diplomacy::is_allied_owner`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diplomacy {
    pairs: HashSet<(PlayerId, PlayerId)>,
}

impl Diplomacy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an alliance between two players.
    pub fn ally(&mut self, a: PlayerId, b: PlayerId) {
        if a != b {
            self.pairs.insert(Self::key(a, b));
        }
    }

    /// Returns true if the two players are on the same side.
    #[inline]
    pub fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        a == b || self.pairs.contains(&Self::key(a, b))
    }

    /// Returns true if `owner` is present and allied with `player`.
    #[inline]
    pub fn is_allied_owner(&self, player: PlayerId, owner: Option<PlayerId>) -> bool {
        owner.is_some_and(|o| self.is_allied(player, o))
    }

    /// Returns true if `owner` is a real player at war with `player`.
    /// Neutral (no owner) is not counted as an enemy.
    #[inline]
    pub fn is_enemy_owner(&self, player: PlayerId, owner: Option<PlayerId>) -> bool {
        owner.is_some_and(|o| !self.is_allied(player, o))
    }

    fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alliance_is_symmetric_and_reflexive() {
        let mut d = Diplomacy::new();
        let (a, b, c) = (PlayerId(0), PlayerId(1), PlayerId(2));
        d.ally(b, a);
        assert!(d.is_allied(a, b));
        assert!(d.is_allied(b, a));
        assert!(d.is_allied(c, c));
        assert!(!d.is_allied(a, c));
    }

    #[test]
    fn neutral_owner_is_neither_allied_nor_enemy() {
        let d = Diplomacy::new();
        let p = PlayerId(0);
        assert!(!d.is_allied_owner(p, None));
        assert!(!d.is_enemy_owner(p, None));
        assert!(d.is_enemy_owner(p, Some(PlayerId(3))));
    }
}
