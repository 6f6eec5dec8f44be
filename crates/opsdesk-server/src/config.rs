use std::path::PathBuf;

use thiserror::Error;

/// Placeholder JWT secrets that must be replaced before deploying.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your_jwt_secret",
];

const DEFAULT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got '{value}'")]
    InvalidPort { var: &'static str, value: String },
    #[error("JWT_EXPIRATION '{0}' is not a duration like 1h, 30m, 45s, 7d or plain seconds")]
    InvalidDuration(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { var: "PORT", value })?,
            None => 3000,
        };

        let jwt_ttl = match var("JWT_EXPIRATION") {
            Some(value) => parse_duration(&value)?,
            None => chrono::Duration::hours(1),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_path: var("DATABASE_PATH")
                .unwrap_or_else(|| "opsdesk.db".into())
                .into(),
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEFAULT_SECRET.into()),
            jwt_ttl,
        })
    }

    pub fn has_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

/// Parse `1h`, `30m`, `45s`, `7d`, or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<chrono::Duration, ConfigError> {
    let value = value.trim();
    let invalid = || ConfigError::InvalidDuration(value.to_string());

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c)),
        Some(_) => (value, None),
        None => return Err(invalid()),
    };

    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let duration = match unit {
        None | Some('s') => chrono::Duration::try_seconds(amount),
        Some('m') => chrono::Duration::try_minutes(amount),
        Some('h') => chrono::Duration::try_hours(amount),
        Some('d') => chrono::Duration::try_days(amount),
        Some(_) => None,
    };
    duration.ok_or_else(invalid)
}
