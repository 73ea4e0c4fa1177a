//! Configuration for the load test.
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. The `API_BASE_URL` environment variable (target host only)
//! 2. Environment variables prefixed with `LOADTEST__`
//! 3. YAML configuration file (path taken from `LOADTEST_CONFIG`)
//! 4. Defaults
//!
//! A `.env` file in the working directory is loaded into the process environment beforehand, see
//! [`load_dotenv`].
//!
//! # Environment Variables
//!
//! Prefixed variables use double underscores (`__`) to denote nested structures:
//!
//! - `LOADTEST__WAIT_TIME__MIN=50ms`
//! - `LOADTEST__WEIGHTS__HEALTH_CHECK=0`
//!
//! # YAML Configuration File
//!
//! ```yaml
//! api_base_url: http://localhost:8080
//! wait_time:
//!   min: 100ms
//!   max: 500ms
//! weights:
//!   resolve: 10
//!   create: 5
//!   health_check: 1
//! ```
//!
//! The command line of the load test itself (users, hatch rate, run time, ...) belongs to goose;
//! `api_base_url` only provides the default for its `--host` flag.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::workload::{Action, Workload};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "LOADTEST__";

/// Environment variable holding the default target host.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Environment variable pointing to an optional YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "LOADTEST_CONFIG";

/// Target host used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Name of the scenario registered with goose.
pub const SCENARIO_NAME: &str = "ShortenItUser";

/// Think time between two actions of a simulated user.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WaitTime {
    /// Lower bound, defaults to `100ms`.
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    /// Upper bound, defaults to `500ms`.
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_millis(500),
        }
    }
}

/// Relative selection weights of the user actions.
///
/// A weight of `0` disables the action.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Weights {
    /// Weight of `POST /backward`, defaults to `10`.
    pub resolve: usize,
    /// Weight of `POST /forward`, defaults to `5`.
    pub create: usize,
    /// Weight of `GET /healthz`, defaults to `1`.
    pub health_check: usize,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            resolve: Action::ResolveShortUrl.default_weight(),
            create: Action::CreateShortUrl.default_weight(),
            health_check: Action::HealthCheck.default_weight(),
        }
    }
}

/// Load test configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Default target host for goose's `--host` flag.
    ///
    /// # Environment Variable
    ///
    /// `API_BASE_URL`, or `LOADTEST__API_BASE_URL` with lower precedence.
    pub api_base_url: String,

    /// Think time between actions.
    pub wait_time: WaitTime,

    /// Relative action weights.
    pub weights: Weights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            wait_time: WaitTime::default(),
            weights: Weights::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from the YAML file at `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&[API_BASE_URL_ENV]))
            .extract()
            .context("invalid load test configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration using the file named by `LOADTEST_CONFIG`, if set.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV);
        Self::load(path.as_deref().map(Path::new))
    }

    fn validate(&self) -> Result<()> {
        if self.wait_time.min > self.wait_time.max {
            bail!(
                "wait_time.min ({:?}) must not exceed wait_time.max ({:?})",
                self.wait_time.min,
                self.wait_time.max
            );
        }

        let weights = &self.weights;
        if weights.resolve == 0 && weights.create == 0 && weights.health_check == 0 {
            bail!("at least one action weight must be non-zero");
        }

        Ok(())
    }

    /// Builds the workload described by this configuration.
    pub fn workload(&self) -> Workload {
        Workload::builder(SCENARIO_NAME)
            .wait_time(self.wait_time.min, self.wait_time.max)
            .action_weights(
                self.weights.create,
                self.weights.resolve,
                self.weights.health_check,
            )
            .build()
    }
}

/// Loads a `.env` file from the working directory (or its parents) into the process environment.
///
/// Returns the path of the loaded file. A missing file is not an error.
pub fn load_dotenv() -> Result<Option<std::path::PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("failed to load .env file"),
    }
}
