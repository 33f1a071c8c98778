use std::{num::ParseIntError, time::Duration};

use data_model_jse::db::ConnectionPoolError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file or present as an env var")]
    Missing(String),
    #[error("{var} must be a valid number (got '{value}'): {source}")]
    InvalidNumber {
        var: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Couldn't connect to the database: {0}")]
    Database(#[from] ConnectionPoolError),
    #[error("Couldn't build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// True if the environment variable is set and not empty. False otherwise.
pub fn is_env_set(env_var: &str) -> bool {
    match std::env::var(env_var) {
        Ok(val) => !val.trim().is_empty(),
        Err(_) => false,
    }
}

/// Value of the environment variable, or `default` when it is unset or blank.
pub fn env_or(env_var: &str, default: &str) -> String {
    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Value of the environment variable, or `None` when it is unset or blank.
pub fn env_opt(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

/// Retrieves the value of the environment variable as a duration.
pub fn env_duration(units: TimeUnit, env_var: &str, default: u64) -> Result<Duration, ConfigError> {
    let amount = match env_opt(env_var) {
        Some(v) => v.parse::<u64>().map_err(|source| ConfigError::InvalidNumber {
            var: env_var.to_string(),
            value: v.clone(),
            source,
        })?,
        None => default,
    };

    let duration = match units {
        TimeUnit::Seconds => Duration::from_secs(amount),
        TimeUnit::Milliseconds => Duration::from_millis(amount),
    };
    Ok(duration)
}

/// Like `env_duration`, but `None` when the variable is unset.
pub fn env_duration_opt(units: TimeUnit, env_var: &str) -> Result<Option<Duration>, ConfigError> {
    if !is_env_set(env_var) {
        return Ok(None);
    }
    env_duration(units, env_var, 0).map(Some)
}
