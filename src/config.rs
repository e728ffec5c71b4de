use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PredictionError, Result};

pub const ENV_LOOKBACK_DAYS: &str = "FORECAST_LOOKBACK_DAYS";
pub const ENV_FORECAST_DAYS: &str = "FORECAST_FORECAST_DAYS";
pub const ENV_CACHE_TTL_SECS: &str = "FORECAST_CACHE_TTL_SECS";
pub const ENV_SEED: &str = "FORECAST_SEED";
pub const ENV_DATABASE_PATH: &str = "FORECAST_DATABASE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_lookback_days: usize,
    pub default_forecast_days: usize,
    /// Optional expiry for cached results; `None` keeps them until cleared.
    pub cache_ttl_secs: Option<u64>,
    pub cache_max_capacity: u64,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// SQLite file holding daily bars; `None` uses the synthetic provider.
    pub database_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_lookback_days: 90,
            default_forecast_days: 30,
            cache_ttl_secs: None,
            cache_max_capacity: 1_000,
            seed: None,
            database_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PredictionError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays `FORECAST_*` environment variables on top of `self`.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_LOOKBACK_DAYS) {
            self.default_lookback_days = parse_var(ENV_LOOKBACK_DAYS, &v)?;
        }
        if let Some(v) = lookup(ENV_FORECAST_DAYS) {
            self.default_forecast_days = parse_var(ENV_FORECAST_DAYS, &v)?;
        }
        if let Some(v) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = Some(parse_var(ENV_CACHE_TTL_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_SEED) {
            self.seed = Some(parse_var(ENV_SEED, &v)?);
        }
        if let Some(v) = lookup(ENV_DATABASE_PATH) {
            let v = v.trim();
            self.database_path = if v.is_empty() { None } else { Some(v.to_string()) };
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_lookback_days == 0 {
            return Err(PredictionError::Config("default_lookback_days must be greater than 0".to_string()));
        }
        if self.default_forecast_days == 0 {
            return Err(PredictionError::Config("default_forecast_days must be greater than 0".to_string()));
        }
        if self.cache_ttl_secs == Some(0) {
            return Err(PredictionError::Config("cache_ttl_secs must be greater than 0 when set".to_string()));
        }
        if self.cache_max_capacity == 0 {
            return Err(PredictionError::Config("cache_max_capacity must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| PredictionError::Config(format!("{}={:?}: {}", key, value, e)))
}
