//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;

use quack_jobs::ToolConfig;

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub tool: ToolConfig,
    /// `None` keeps every job for the lifetime of the process.
    pub max_retained_jobs: Option<NonZeroUsize>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            tool: ToolConfig::default(),
            max_retained_jobs: None,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Unset variables take their default. Malformed values are logged and
    /// also fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ToolConfig::default();

        let bind_addr = parse_var(&lookup, "QUACK_BIND_ADDR").unwrap_or_else(default_bind_addr);

        let program = lookup("QUACK_BASEDPYRIGHT_BIN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.program);

        let timeout = parse_var::<NonZeroU64>(&lookup, "QUACK_TOOL_TIMEOUT_SECS")
            .map(|secs| Duration::from_secs(secs.get()))
            .unwrap_or(defaults.timeout);

        let retry_policy = match parse_var::<NonZeroU32>(&lookup, "QUACK_TOOL_MAX_ATTEMPTS") {
            Some(attempts) => defaults.retry_policy.with_max_attempts(attempts.get()),
            None => defaults.retry_policy,
        };

        Self {
            bind_addr,
            tool: ToolConfig::default()
                .with_program(program)
                .with_timeout(timeout)
                .with_retry_policy(retry_policy),
            max_retained_jobs: parse_var(&lookup, "QUACK_MAX_RETAINED_JOBS"),
            debug: flag(&lookup, "QUACK_DEBUG"),
        }
    }
}

/// Whether `QUACK_DEBUG` asks for debug logging.
///
/// Read on its own so the subscriber can be installed before the rest of the
/// configuration logs anything.
pub fn debug_from_env() -> bool {
    flag(&|key: &str| std::env::var(key).ok(), "QUACK_DEBUG")
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key).is_some_and(|v| {
        matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
    })
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, "ignoring invalid configuration value");
            None
        }
    }
}
