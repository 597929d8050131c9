//! Strategic assessment.
//!
//! Threat estimation, territory ranking, attack invitations, unit value
//! and ordering helpers built on the search and combat layers.

pub mod invite;
pub mod rank;
pub mod reorder;
pub mod threat;
pub mod value;

pub use invite::{
    break_units_by_speed, invite_blitz_attack, invite_bombard_escort, invite_land_attack,
    invite_plane_attack, invite_ship_attack, invite_transports, possible_blitz_territories,
    sort_transport_units, total_strength, two_away_strength_not_counted, MoveRecommendation,
};
pub use rank::{
    rank_amphibious_reinforcement, rank_territories, threatened_allied_factory_neighbor,
    RankOptions, TerritoryRanking,
};
pub use reorder::{reorder, reorder_or_zero, AssessError};
pub use threat::{
    combine_coalition, enemy_strengths, potential_attacker_strength, ship_threat_to_territory,
    strength_of_territory, threat_map, PotentialOpts, DEFAULT_COALITION_DISCOUNT,
    UNKNOWN_TARGET_STRENGTH,
};
pub use value::{attack_trades_favorably, find_factory_territory, player_tuv, tuv, unit_costs};
