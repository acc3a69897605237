//! Configuration management and environment variable loading

use crate::{MedSafeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load environment variables from a .env file
///
/// Looks in the current directory and its parents and returns the path that
/// was loaded, if any. A missing file is not an error; a malformed one is.
/// Runs before logging is set up, so callers report the path themselves.
///
/// # Example
///
/// ```no_run
/// use medsafe_core::load_env;
///
/// let env_file = load_env().ok().flatten();
/// let url = std::env::var("DATABASE_URL").unwrap_or_default();
/// ```
pub fn load_env() -> Result<Option<PathBuf>> {
    env_file_outcome(dotenvy::dotenv())
}

fn env_file_outcome(
    result: std::result::Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::LineParse(line, pos)) => Err(MedSafeError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => Ok(None),
        Err(e) => Err(MedSafeError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(e) => Err(MedSafeError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Tuning knobs for [`InteractionResolver`](crate::InteractionResolver)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum number of cached pair lookups
    pub cache_max_entries: usize,
    /// Hard ceiling on a single graph backend call
    pub graph_timeout: Duration,
    /// How many pair checks run at once within one request
    pub max_concurrent_pairs: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_max_entries: 100,
            graph_timeout: Duration::from_millis(1500),
            max_concurrent_pairs: 8,
        }
    }
}

impl ResolverConfig {
    /// Build from `MEDSAFE_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            cache_max_entries: get_env_int("MEDSAFE_CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            graph_timeout: Duration::from_millis(get_env_int(
                "MEDSAFE_GRAPH_TIMEOUT_MS",
                defaults.graph_timeout.as_millis() as u64,
            )),
            max_concurrent_pairs: get_env_int(
                "MEDSAFE_MAX_CONCURRENT_PAIRS",
                defaults.max_concurrent_pairs,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable a tier outright
    pub fn validate(&self) -> Result<()> {
        if self.graph_timeout.is_zero() {
            return Err(MedSafeError::config("graph_timeout must be non-zero"));
        }
        if self.max_concurrent_pairs == 0 {
            return Err(MedSafeError::config("max_concurrent_pairs must be at least 1"));
        }
        Ok(())
    }
}

/// Settings for the relational fallback store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Below this row count the table is treated as not yet migrated and reseeded
    pub min_seed_rows: i64,
    /// Rows per INSERT statement during seeding
    pub batch_size: usize,
    /// How long a lookup waits for initialization to finish
    pub wait_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_seed_rows: 100,
            batch_size: 50,
            wait_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Build from `MEDSAFE_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            min_seed_rows: get_env_int("MEDSAFE_MIN_SEED_ROWS", defaults.min_seed_rows),
            batch_size: get_env_int("MEDSAFE_SEED_BATCH_SIZE", defaults.batch_size),
            wait_timeout: Duration::from_millis(get_env_int(
                "MEDSAFE_STORE_WAIT_MS",
                defaults.wait_timeout.as_millis() as u64,
            )),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate batch sizing and the wait budget
    pub fn validate(&self) -> Result<()> {
        if self.wait_timeout.is_zero() {
            return Err(MedSafeError::config("wait_timeout must be non-zero"));
        }
        if self.batch_size == 0 {
            return Err(MedSafeError::config("batch_size must be at least 1"));
        }
        if self.min_seed_rows < 0 {
            return Err(MedSafeError::config("min_seed_rows cannot be negative"));
        }
        Ok(())
    }
}

/// Settings for the optional HTTP graph backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL of the graph service; `None` means no graph tier
    pub base_url: Option<String>,
    /// Consecutive failures before the circuit opens
    pub failure_threshold: usize,
    /// How long the circuit stays open before a trial call is allowed
    pub cooldown: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl GraphConfig {
    /// Build from `MEDSAFE_GRAPH_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("MEDSAFE_GRAPH_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            failure_threshold: get_env_int(
                "MEDSAFE_GRAPH_FAILURE_THRESHOLD",
                defaults.failure_threshold,
            ),
            cooldown: Duration::from_secs(get_env_int(
                "MEDSAFE_GRAPH_COOLDOWN_SECS",
                defaults.cooldown.as_secs(),
            )),
        }
    }
}
