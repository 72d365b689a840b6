//! # Node Configuration
//!
//! Runtime parameters for the custody node, read from `CUSTODY_*`
//! environment variables over built-in defaults.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `CUSTODY_DATA_FILE` | `data_file` | `custody-ledger.db` |
//! | `CUSTODY_LOG` | `log_level` | `info` |
//! | `CUSTODY_CLOCK` | `clock` | `logical` |
//! | `CUSTODY_MAX_CONFLICT_RETRIES` | `max_conflict_retries` | `3` |
//! | `CUSTODY_MAX_FIELD_LEN` | `ledger.max_field_len` | `256` |
//! | `CUSTODY_MAX_REMARKS_LEN` | `ledger.max_remarks_len` | `4096` |
//! | `CUSTODY_VERIFY_ON_LOAD` | `ledger.verify_chain_on_load` | `true` |

use custody_ledger::LedgerConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Which time source stamps new entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockKind {
    /// Monotonic counter resumed from the stored history.
    #[default]
    Logical,
    /// Unix seconds.
    System,
}

impl FromStr for ClockKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logical" => Ok(ClockKind::Logical),
            "system" => Ok(ClockKind::System),
            _ => Err(ConfigError::InvalidValue {
                var: "CUSTODY_CLOCK",
                value: s.to_string(),
                reason: "expected `logical` or `system`".to_string(),
            }),
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Ledger file for the file-backed key-value store.
    pub data_file: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Time source for entry timestamps.
    pub clock: ClockKind,
    /// How many times a call that lost an append race is re-run.
    pub max_conflict_retries: u32,
    /// Ledger limits.
    pub ledger: LedgerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("custody-ledger.db"),
            log_level: "info".to_string(),
            clock: ClockKind::default(),
            max_conflict_retries: 3,
            ledger: LedgerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are an
    /// error rather than silently ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = NodeConfig::default();

        if let Some(path) = lookup("CUSTODY_DATA_FILE") {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: "CUSTODY_DATA_FILE",
                    value: path,
                    reason: "must not be empty".to_string(),
                });
            }
            config.data_file = PathBuf::from(path);
        }
        if let Some(level) = lookup("CUSTODY_LOG") {
            config.log_level = level;
        }
        if let Some(clock) = lookup("CUSTODY_CLOCK") {
            config.clock = clock.parse()?;
        }
        if let Some(retries) = lookup("CUSTODY_MAX_CONFLICT_RETRIES") {
            config.max_conflict_retries = parse_var("CUSTODY_MAX_CONFLICT_RETRIES", &retries)?;
        }
        if let Some(len) = lookup("CUSTODY_MAX_FIELD_LEN") {
            config.ledger.max_field_len = parse_var("CUSTODY_MAX_FIELD_LEN", &len)?;
        }
        if let Some(len) = lookup("CUSTODY_MAX_REMARKS_LEN") {
            config.ledger.max_remarks_len = parse_var("CUSTODY_MAX_REMARKS_LEN", &len)?;
        }
        if let Some(verify) = lookup("CUSTODY_VERIFY_ON_LOAD") {
            config.ledger.verify_chain_on_load = parse_var("CUSTODY_VERIFY_ON_LOAD", &verify)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject limits the ledger cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.max_field_len == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CUSTODY_MAX_FIELD_LEN",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.ledger.max_remarks_len < self.ledger.max_field_len {
            return Err(ConfigError::InvalidValue {
                var: "CUSTODY_MAX_REMARKS_LEN",
                value: self.ledger.max_remarks_len.to_string(),
                reason: "must be at least CUSTODY_MAX_FIELD_LEN".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set to something unusable.
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
