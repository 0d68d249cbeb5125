//! Environment configuration
//!
//! Values come from the process environment (optionally seeded from `.env`
//! by the binaries). Timeouts and degradation attempts are explicit here so a
//! hung backend never stalls a session forever unless asked to.

use crate::error::ConsoleError;
use crate::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 1;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Prefix for the `/hackathon/...` endpoints, without trailing slash
    pub api_base_url: String,
    /// Per-call timeout; `None` leaves calls unbounded
    pub request_timeout: Option<Duration>,
    /// Attempts of the comprehensive analysis before degrading to demo data
    pub max_analysis_attempts: u32,
    pub api_port: u16,
    /// API sessions without transcript activity for this long are discarded;
    /// `None` keeps them until deleted
    pub session_idle_ttl: Option<Duration>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_analysis_attempts: DEFAULT_MAX_ATTEMPTS,
            api_port: DEFAULT_PORT,
            session_idle_ttl: Some(Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS)),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("ANALYSIS_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs: u64 =
            parse_or(&lookup, "ANALYSIS_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let request_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let max_analysis_attempts: u32 =
            parse_or(&lookup, "ANALYSIS_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;

        let api_port: u16 = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ConsoleError::Config(format!("invalid port: {}", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let idle_secs: u64 =
            parse_or(&lookup, "SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS)?;
        let session_idle_ttl = (idle_secs > 0).then(|| Duration::from_secs(idle_secs));

        Ok(Self {
            api_base_url,
            request_timeout,
            max_analysis_attempts: max_analysis_attempts.max(1),
            api_port,
            session_idle_ttl,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConsoleError::Config(format!("{} must be a number, got {:?}", key, raw))),
        _ => Ok(default),
    }
}
