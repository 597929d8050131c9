//! Constrained graph search.
//!
//! Breadth-first primitives that the assessment layer builds on: nearest
//! match, frontier at an exact distance, units able to reach a territory
//! within their movement, and air reach with landing constraints.

pub mod air;
pub mod bfs;

pub use air::plane_attackers_that_can_land;
pub use bfs::{
    distance_to_enemy, exact_neighbors, frontier_at_distance, max_sea_route, nearest,
    nearest_non_empty, nearest_with_minimum_occupancy, reachable_units_within_movement,
    two_hop_route, units_within, ReachOptions, Reachable,
};
