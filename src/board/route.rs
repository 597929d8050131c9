//! Ordered hop sequences between territories.

use super::territory::TerritoryId;

/// A path over the map, starting at its origin.
///
/// `len()` is the hop count, so a route holding only its origin has
/// length zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    steps: Vec<TerritoryId>,
}

impl Route {
    /// Creates a zero-length route at `start`.
    pub fn new(start: TerritoryId) -> Self {
        Route { steps: vec![start] }
    }

    /// Builds a route from a full step list. Returns `None` for an empty list.
    pub fn from_steps(steps: Vec<TerritoryId>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Route { steps })
        }
    }

    pub fn push(&mut self, t: TerritoryId) {
        self.steps.push(t);
    }

    #[inline]
    pub fn start(&self) -> TerritoryId {
        self.steps[0]
    }

    #[inline]
    pub fn end(&self) -> TerritoryId {
        self.steps[self.steps.len() - 1]
    }

    /// Number of hops.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len() - 1
    }

    /// True for a route that never leaves its origin.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.len() == 1
    }

    pub fn territories(&self) -> &[TerritoryId] {
        &self.steps
    }

    pub fn contains(&self, t: TerritoryId) -> bool {
        self.steps.contains(&t)
    }

    /// Keeps at most `hops` hops from the origin.
    pub fn truncate(&mut self, hops: usize) {
        self.steps.truncate(hops + 1);
    }
}
