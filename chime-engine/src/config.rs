use anyhow::{Context, Result};
use chrono::Duration;
use std::env;

/// Engine tuning, controlled by environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_url: String,              // CHIME_DB_URL
    pub horizon: Duration,           // CHIME_HORIZON_DAYS
    pub fast_path_threshold: Duration, // CHIME_FAST_PATH_SECS
    pub bus_buffer: usize,           // CHIME_BUS_BUFFER
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_url: "sqlite://data/chime.db".to_string(),
            // Native sleep primitives get unreliable past this look-ahead.
            horizon: Duration::days(40),
            fast_path_threshold: Duration::seconds(60),
            bus_buffer: 64,
        }
    }
}

impl EngineConfig {
    /// Build from environment variables, keeping defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let db_url = env::var("CHIME_DB_URL").unwrap_or(defaults.db_url);

        let horizon = match env::var("CHIME_HORIZON_DAYS") {
            Ok(v) => Duration::days(
                v.parse::<i64>()
                    .with_context(|| format!("Invalid CHIME_HORIZON_DAYS: {v}"))?,
            ),
            Err(_) => defaults.horizon,
        };

        let fast_path_threshold = match env::var("CHIME_FAST_PATH_SECS") {
            Ok(v) => Duration::seconds(
                v.parse::<i64>()
                    .with_context(|| format!("Invalid CHIME_FAST_PATH_SECS: {v}"))?,
            ),
            Err(_) => defaults.fast_path_threshold,
        };

        let bus_buffer = match env::var("CHIME_BUS_BUFFER") {
            Ok(v) => v
                .parse::<usize>()
                .with_context(|| format!("Invalid CHIME_BUS_BUFFER: {v}"))?,
            Err(_) => defaults.bus_buffer,
        };

        Ok(Self {
            db_url,
            horizon,
            fast_path_threshold,
            bus_buffer,
        })
    }
}
