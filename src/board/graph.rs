//! Adjacency graph over territories.
//!
//! Edges are undirected and stored as per-node neighbor lists in insertion
//! order. Every traversal visits neighbors in that order, which makes ties
//! between equally short results deterministic for a given map build.
//!
//! Predicates passed to the distance and route queries are applied to every
//! territory after the origin, including the destination.

use std::collections::VecDeque;

use super::route::Route;
use super::territory::TerritoryId;

/// Undirected adjacency lists indexed by `TerritoryId`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerritoryGraph {
    adj: Vec<Vec<TerritoryId>>,
}

impl TerritoryGraph {
    /// Creates a graph of `n` isolated nodes.
    pub fn with_nodes(n: usize) -> Self {
        TerritoryGraph {
            adj: vec![Vec::new(); n],
        }
    }

    /// Appends an isolated node and returns its id.
    pub fn add_node(&mut self) -> TerritoryId {
        self.adj.push(Vec::new());
        TerritoryId((self.adj.len() - 1) as u32)
    }

    /// Connects two nodes. Self-loops and duplicate edges are ignored.
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        if a == b || self.is_adjacent(a, b) {
            return;
        }
        self.adj[a.index()].push(b);
        self.adj[b.index()].push(a);
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    pub fn contains(&self, t: TerritoryId) -> bool {
        t.index() < self.adj.len()
    }

    #[inline]
    pub fn neighbors(&self, t: TerritoryId) -> &[TerritoryId] {
        &self.adj[t.index()]
    }

    #[inline]
    pub fn is_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.adj[a.index()].contains(&b)
    }

    /// Neighbors of `t` accepted by `pred`.
    pub fn neighbors_matching<F>(&self, t: TerritoryId, pred: F) -> Vec<TerritoryId>
    where
        F: Fn(TerritoryId) -> bool,
    {
        self.neighbors(t).iter().copied().filter(|&n| pred(n)).collect()
    }

    /// All territories within `hops` steps of `t`, excluding `t`, in BFS order.
    pub fn neighbors_within(&self, t: TerritoryId, hops: u32) -> Vec<TerritoryId> {
        let mut dist = vec![u32::MAX; self.adj.len()];
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        dist[t.index()] = 0;
        queue.push_back(t);

        while let Some(cur) = queue.pop_front() {
            let d = dist[cur.index()];
            if d >= hops {
                continue;
            }
            for &n in self.neighbors(cur) {
                if dist[n.index()] == u32::MAX {
                    dist[n.index()] = d + 1;
                    out.push(n);
                    queue.push_back(n);
                }
            }
        }
        out
    }

    /// Unrestricted hop distance.
    pub fn distance(&self, a: TerritoryId, b: TerritoryId) -> Option<u32> {
        self.distance_matching(a, b, |_| true)
    }

    /// Hop distance over territories accepted by `pred`.
    pub fn distance_matching<F>(&self, a: TerritoryId, b: TerritoryId, pred: F) -> Option<u32>
    where
        F: Fn(TerritoryId) -> bool,
    {
        self.route(a, b, pred).map(|r| r.len() as u32)
    }

    /// Shortest route over territories accepted by `pred`.
    pub fn route<F>(&self, a: TerritoryId, b: TerritoryId, pred: F) -> Option<Route>
    where
        F: Fn(TerritoryId) -> bool,
    {
        self.route_by_step(a, b, |_, to| pred(to))
    }

    /// Shortest route where each hop `(from, to)` must be accepted by `step`.
    pub fn route_by_step<F>(&self, a: TerritoryId, b: TerritoryId, step: F) -> Option<Route>
    where
        F: Fn(TerritoryId, TerritoryId) -> bool,
    {
        if a == b {
            return Some(Route::new(a));
        }
        let mut parent: Vec<Option<TerritoryId>> = vec![None; self.adj.len()];
        let mut seen = vec![false; self.adj.len()];
        let mut queue = VecDeque::new();
        seen[a.index()] = true;
        queue.push_back(a);

        while let Some(cur) = queue.pop_front() {
            for &n in self.neighbors(cur) {
                if seen[n.index()] || !step(cur, n) {
                    continue;
                }
                seen[n.index()] = true;
                parent[n.index()] = Some(cur);
                if n == b {
                    return Some(unwind(a, b, |t| parent[t.index()]));
                }
                queue.push_back(n);
            }
        }
        None
    }
}

/// Rebuilds the route from `start` to `end` by following parent links.
pub(crate) fn unwind<F>(start: TerritoryId, end: TerritoryId, parent: F) -> Route
where
    F: Fn(TerritoryId) -> Option<TerritoryId>,
{
    let mut steps = vec![end];
    let mut cur = end;
    while cur != start {
        match parent(cur) {
            Some(p) => {
                steps.push(p);
                cur = p;
            }
            None => break,
        }
    }
    steps.reverse();
    // `steps` always holds at least `end`.
    Route::from_steps(steps).unwrap_or_else(|| Route::new(start))
}
