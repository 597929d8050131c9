//! Per-player advisor.
//!
//! Holds the configuration and the random source shared by the battle
//! estimator and the purchase search, and exposes the assessment queries
//! with those settings applied. The advisor never keeps a game snapshot:
//! every query takes the [`GameState`] to read.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::debug;

use crate::board::{GameState, PlayerId, TerritoryId, UnitId};
use crate::combat::{self, BattleEstimate, BattleSide, Domain};
use crate::config::{AdvisorConfig, ConfigError};
use crate::error::Result;
use crate::eval::{self, RankOptions, TerritoryRanking};
use crate::purchase::{PurchaseMix, PurchaseOptimizer, PurchaseRequest};

pub struct Advisor {
    config: AdvisorConfig,
    rng: SmallRng,
}

fn rng_for(seed: u64) -> SmallRng {
    if seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(seed)
    }
}

impl Advisor {
    /// Validates `config` and seeds the random source from it.
    pub fn new(config: AdvisorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = rng_for(config.seed);
        Ok(Advisor { config, rng })
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Restarts the random source; 0 reseeds from entropy.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = rng_for(seed);
    }

    /// Combined strength `player`'s enemies could bring against `target`.
    pub fn threat(&self, state: &GameState, target: TerritoryId, player: PlayerId) -> f32 {
        eval::potential_attacker_strength(state, target, player, &self.config.potential_opts())
    }

    pub fn threat_map(
        &self,
        state: &GameState,
        player: PlayerId,
        territories: &[TerritoryId],
    ) -> HashMap<TerritoryId, f32> {
        eval::threat_map(state, player, territories, &self.config.potential_opts())
    }

    pub fn rank(&self, state: &GameState, player: PlayerId, non_combat: bool) -> TerritoryRanking {
        let opts = RankOptions {
            potential: self.config.potential_opts(),
            non_combat,
        };
        eval::rank_territories(state, player, &opts)
    }

    pub fn amphibious_targets(&self, state: &GameState, player: PlayerId) -> HashMap<TerritoryId, f32> {
        eval::rank_amphibious_reinforcement(state, player, &self.config.potential_opts())
    }

    pub fn estimate_battle(
        &mut self,
        state: &GameState,
        attacker: &BattleSide,
        defender: &BattleSide,
        domain: Domain,
    ) -> BattleEstimate {
        combat::estimate_battle(state, attacker, defender, domain, &mut self.rng, &self.config.battle)
    }

    /// Fraction of `trials` sampled battles the attacker wins.
    pub fn win_rate(
        &mut self,
        state: &GameState,
        attacker: &BattleSide,
        defender: &BattleSide,
        domain: Domain,
        trials: u32,
    ) -> f64 {
        combat::win_rate(
            state,
            attacker,
            defender,
            domain,
            trials,
            &mut self.rng,
            &self.config.battle,
        )
    }

    /// Whether attacking `target` is worth the value it is expected to cost.
    pub fn trade_is_favorable(
        &mut self,
        state: &GameState,
        target: TerritoryId,
        player: PlayerId,
        attackers: &[UnitId],
        defenders: &[UnitId],
        aggressive: bool,
    ) -> bool {
        eval::attack_trades_favorably(
            state,
            target,
            player,
            attackers,
            defenders,
            aggressive,
            self.config.transports_first,
            &mut self.rng,
            &self.config.battle,
        )
    }

    pub fn factory_site(&self, state: &GameState, player: PlayerId, coastal: bool) -> Option<TerritoryId> {
        eval::find_factory_territory(state, player, coastal)
    }

    pub fn plan_purchase(&mut self, state: &GameState, request: &PurchaseRequest) -> Result<PurchaseMix> {
        let optimizer = PurchaseOptimizer::new(state, request, self.config.purchase)?;
        let mix = optimizer.optimize(&mut self.rng)?;
        debug!(
            player = request.player.0,
            budget = request.budget,
            points = mix.points,
            "purchase planned"
        );
        Ok(mix)
    }
}
