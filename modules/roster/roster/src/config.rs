//! Configuration for the roster module.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variable prefix; nested keys are separated by `__`,
/// e.g. `ROSTER__DATABASE__URL`.
pub const ENV_PREFIX: &str = "ROSTER__";

/// Module configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterConfig {
    /// Budget for one batch call when the caller supplies none.
    #[serde(with = "humantime_serde")]
    pub batch_timeout: Duration,

    /// bcrypt cost for temporary passwords.
    pub password_hash_cost: u32,

    pub database: DatabaseConfig,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            batch_timeout: Duration::from_secs(60),
            password_hash_cost: bcrypt::DEFAULT_COST,
            database: DatabaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_owned(),
            max_connections: 10,
        }
    }
}

impl RosterConfig {
    /// Layer defaults, an optional YAML file and `ROSTER__*` environment
    /// variables, in that order of precedence.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or a value has the wrong
    /// shape.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load roster configuration")
    }
}
