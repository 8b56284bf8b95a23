use std::env;
use std::time::Duration;

use crate::blockchain::{ChainError, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};

/// Runtime settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    /// `None` lets a vote mine for as long as it takes.
    pub mining_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ChainError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;

        let difficulty: u32 = parse_or(&lookup, "DIFFICULTY", DEFAULT_DIFFICULTY)?;
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(difficulty));
        }

        let timeout_secs: u64 = parse_or(&lookup, "MINING_TIMEOUT_SECS", 30)?;
        let mining_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(Self {
            host,
            port,
            difficulty,
            mining_timeout,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ChainError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ChainError::InvalidConfig(format!("{key}={raw:?} is not valid"))),
    }
}
