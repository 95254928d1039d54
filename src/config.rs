//! Repository configuration.
//!
//! Precedence: explicit path > `ACTIONLITE_CONFIG` > `./actionlite.toml` > defaults, then
//! individual environment overrides on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Upper bound on a single store hand-off. `None` waits for the store.
    pub query_timeout_ms: Option<u64>,
    /// Fail single-result lookups that match more than one action instead of picking one.
    pub strict_unique: bool,
    pub slow_query_ms: u64,
    /// Ceiling applied to caller-supplied page sizes.
    pub max_result_limit: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self { query_timeout_ms: None, strict_unique: false, slow_query_ms: 500, max_result_limit: 10_000 }
    }
}

impl RepositoryConfig {
    /// # Errors
    /// Returns `ActionError::Config` when the TOML is malformed or has wrongly typed keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ActionError> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    /// Returns `ActionError::Config` when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ActionError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| ActionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Loads the first config file found, then applies environment overrides.
    ///
    /// # Errors
    /// Returns `ActionError::Config` if a config file exists but is invalid, or an override
    /// variable does not parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ActionError> {
        let mut cfg = match config_candidates(explicit).into_iter().find(|p| p.exists()) {
            Some(path) => {
                log::debug!("loading repository config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<(), ActionError> {
        if let Some(ms) = env_parse::<u64>("ACTIONLITE_QUERY_TIMEOUT_MS")? {
            self.query_timeout_ms = Some(ms);
        }
        if let Some(strict) = env_parse::<bool>("ACTIONLITE_STRICT_UNIQUE")? {
            self.strict_unique = strict;
        }
        if let Some(ms) = env_parse::<u64>("ACTIONLITE_SLOW_QUERY_MS")? {
            self.slow_query_ms = ms;
        }
        Ok(())
    }
}

fn config_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
        // An explicit path is authoritative; a missing file falls back to defaults.
        return paths;
    }
    if let Ok(p) = std::env::var("ACTIONLITE_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("actionlite.toml"));
    }
    paths
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ActionError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ActionError::Config(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}
