//! Checker configuration
//!
//! Configuration can be read from a JSON file or from the environment:
//! - `ACLCHECK_CACHE_TTL` - group cache TTL in seconds (default: 3600)
//! - `ACLCHECK_MAX_ENTRIES` - maximum number of cached users (default: unbounded)
//! - `ACLCHECK_RETRY_ATTEMPTS` - attempts per group lookup (default: 1)
//! - `ACLCHECK_RETRY_BACKOFF_MS` - delay between attempts (default: 0)
//! - `ACLCHECK_STRIP_DOMAIN` - domain to strip from user and group names

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Retry policy for transient group lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per lookup; 1 means no retry
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }
}

impl RetryConfig {
    /// Delay between attempts
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Whether lookups are retried at all
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

/// Permission checker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// How long group membership is cached, in seconds
    pub cache_ttl_secs: u64,

    /// Maximum number of cached users
    pub max_entries: Option<usize>,

    /// Retry policy for the group lookup
    pub retry: RetryConfig,

    /// Domain stripped from user and group names
    pub strip_domain: Option<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            max_entries: None,
            retry: RetryConfig::default(),
            strip_domain: None,
        }
    }
}

impl CheckerConfig {
    /// Group cache TTL
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| {
            AuthzError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Load configuration from `ACLCHECK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(ttl) = parse_var::<u64>(&var, "ACLCHECK_CACHE_TTL")? {
            config.cache_ttl_secs = ttl;
        }
        config.max_entries = parse_var(&var, "ACLCHECK_MAX_ENTRIES")?;
        if let Some(attempts) = parse_var::<u32>(&var, "ACLCHECK_RETRY_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }
        if let Some(backoff) = parse_var::<u64>(&var, "ACLCHECK_RETRY_BACKOFF_MS")? {
            config.retry.backoff_ms = backoff;
        }
        config.strip_domain = var("ACLCHECK_STRIP_DOMAIN").filter(|d| !d.is_empty());
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the checker cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == Some(0) {
            return Err(AuthzError::Config("max_entries must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(AuthzError::Config("retry.max_attempts must be at least 1".into()));
        }
        if let Some(domain) = &self.strip_domain {
            if domain.starts_with('@') {
                return Err(AuthzError::Config(format!(
                    "strip_domain {:?} must not start with '@'",
                    domain
                )));
            }
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AuthzError::Config(format!("invalid {}={:?}: {}", key, value, e))),
    }
}
