//! Advisor configuration, loadable from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::EstimatorConfig;
use crate::eval::{PotentialOpts, DEFAULT_COALITION_DISCOUNT};
use crate::purchase::PurchaseConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse advisor config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tuning knobs for an [`Advisor`](crate::advisor::Advisor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// RNG seed; 0 seeds from entropy.
    pub seed: u64,
    /// Weight of every enemy but the strongest when threats are combined.
    pub coalition_discount: f32,
    pub transports_first: bool,
    pub battle: EstimatorConfig,
    pub purchase: PurchaseConfig,
    /// Hop radius searched for enemy blitz units.
    pub blitz_hops: u32,
    /// Hop radius searched for enemy ships and transports.
    pub sea_hops: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        AdvisorConfig {
            seed: 0,
            coalition_discount: DEFAULT_COALITION_DISCOUNT,
            transports_first: false,
            battle: EstimatorConfig::default(),
            purchase: PurchaseConfig::default(),
            blitz_hops: 2,
            sea_hops: 3,
        }
    }
}

impl AdvisorConfig {
    /// Parses and validates a JSON document. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AdvisorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.coalition_discount) {
            return Err(ConfigError::Invalid {
                field: "coalition_discount",
                reason: format!("{} is outside [0, 1]", self.coalition_discount),
            });
        }
        if self.battle.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "battle.max_rounds",
                reason: "must be at least 1".into(),
            });
        }
        if self.purchase.check_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "purchase.check_interval",
                reason: "must be at least 1".into(),
            });
        }
        if self.blitz_hops == 0 || self.sea_hops == 0 {
            return Err(ConfigError::Invalid {
                field: "blitz_hops/sea_hops",
                reason: "hop radii must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Enemy-potential options derived from this config.
    pub fn potential_opts(&self) -> PotentialOpts {
        PotentialOpts {
            transports_first: self.transports_first,
            coalition_discount: self.coalition_discount,
            blitz_hops: self.blitz_hops,
            sea_hops: self.sea_hops,
            ..PotentialOpts::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = AdvisorConfig::from_json("{}").unwrap();
        assert_eq!(config, AdvisorConfig::default());
        assert_eq!(config.purchase.time_limit_ms, 150_000);
        assert_eq!(config.battle.max_rounds, 200);
    }

    #[test]
    fn partial_nested_sections_merge_with_defaults() {
        let config =
            AdvisorConfig::from_json(r#"{"seed": 9, "purchase": {"time_limit_ms": 500}}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.purchase.time_limit_ms, 500);
        assert_eq!(config.purchase.check_interval, 64);
    }

    #[test]
    fn out_of_range_discount_is_rejected() {
        let err = AdvisorConfig::from_json(r#"{"coalition_discount": 1.5}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "coalition_discount",
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AdvisorConfig::from_json("{seed: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn potential_opts_carry_the_knobs() {
        let config = AdvisorConfig {
            transports_first: true,
            sea_hops: 4,
            ..AdvisorConfig::default()
        };
        let opts = config.potential_opts();
        assert!(opts.transports_first);
        assert_eq!(opts.sea_hops, 4);
        assert!(opts.ignore.is_empty());
    }
}
