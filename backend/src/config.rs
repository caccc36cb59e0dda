use std::{fmt::Display, path::PathBuf, str::FromStr};
use tracing::info;
use crate::file_store::DEFAULT_DATA_FILE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreBackend,
    pub submit_rate_limit: u32,
    pub submit_rate_window_minutes: i64,
    pub results_cache_seconds: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Unknown VOTE_STORE backend: {0} (expected postgres, file or memory)")]
    UnknownBackend(String),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreBackend::Postgres,
            submit_rate_limit: 10,
            submit_rate_window_minutes: 1,
            results_cache_seconds: 10,
        }
    }
}

impl Settings {
    /// Builds settings from a key lookup (the deployment's secret store),
    /// keeping defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store = match lookup("VOTE_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some("file") => StoreBackend::File(
                lookup("VOTE_DATA_FILE")
                    .filter(|path| !path.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
                    .into(),
            ),
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let submit_rate_limit: u32 = try_load(&lookup, "SUBMIT_RATE_LIMIT", defaults.submit_rate_limit)?;
        let submit_rate_window_minutes: i64 =
            try_load(&lookup, "SUBMIT_RATE_WINDOW_MINUTES", defaults.submit_rate_window_minutes)?;
        if submit_rate_limit == 0 {
            return Err(invalid("SUBMIT_RATE_LIMIT", "0", "must be at least 1"));
        }
        if submit_rate_window_minutes <= 0 {
            return Err(invalid(
                "SUBMIT_RATE_WINDOW_MINUTES",
                &submit_rate_window_minutes.to_string(),
                "must be positive",
            ));
        }

        Ok(Self {
            store,
            submit_rate_limit,
            submit_rate_window_minutes,
            results_cache_seconds: try_load(&lookup, "RESULTS_CACHE_SECONDS", defaults.results_cache_seconds)?,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(key, &raw, e.to_string())),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
