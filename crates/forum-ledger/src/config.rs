//! Service configuration from environment variables.

use crate::domain::value_objects::Address;
use crate::errors::ConfigError;
use crate::service::ServiceConfig;
use std::env;
use std::str::FromStr;

/// Program address (20-byte hex, `0x` optional).
pub const ENV_PROGRAM_ADDRESS: &str = "FORUM_PROGRAM_ADDRESS";
/// Initial privileged principal (20-byte hex).
pub const ENV_ADMIN_ADDRESS: &str = "FORUM_ADMIN_ADDRESS";
/// Re-check invariants after each commit.
pub const ENV_VERIFY_INVARIANTS: &str = "FORUM_VERIFY_INVARIANTS";
/// Event bus buffer per subscriber.
pub const ENV_EVENT_CAPACITY: &str = "FORUM_EVENT_CAPACITY";
/// Log level; falls back to `RUST_LOG`.
pub const ENV_LOG_LEVEL: &str = "FORUM_LOG_LEVEL";

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FORUM_PROGRAM_ADDRESS`: program address (default: `0x00..42`)
    /// - `FORUM_ADMIN_ADDRESS`: privileged principal (default: zero address)
    /// - `FORUM_VERIFY_INVARIANTS`: `true`/`false`/`1`/`0` (default: true)
    /// - `FORUM_EVENT_CAPACITY`: event buffer (default: 1000)
    /// - `FORUM_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a variable that is set but does not
    /// parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`ServiceConfig::from_env`], reading from an arbitrary source.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_PROGRAM_ADDRESS) {
            config.forum.program_address = parse_address(ENV_PROGRAM_ADDRESS, &value)?;
        }
        if let Some(value) = lookup(ENV_ADMIN_ADDRESS) {
            config.forum.admin = parse_address(ENV_ADMIN_ADDRESS, &value)?;
        }
        if let Some(value) = lookup(ENV_VERIFY_INVARIANTS) {
            config.verify_invariants = parse_flag(ENV_VERIFY_INVARIANTS, &value)?;
        }
        if let Some(value) = lookup(ENV_EVENT_CAPACITY) {
            config.event_channel_capacity = parse(ENV_EVENT_CAPACITY, &value)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).or_else(|| lookup("RUST_LOG")) {
            config.log_level = level;
        }

        Ok(config)
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    }
}

fn parse<V: FromStr>(var: &str, value: &str) -> Result<V, ConfigError> {
    value.trim().parse().map_err(|_| invalid(var, value))
}

fn parse_address(var: &str, value: &str) -> Result<Address, ConfigError> {
    Address::from_hex(value.trim()).ok_or_else(|| invalid(var, value))
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(var, value)),
    }
}
