use std::time::Duration;

use crate::commander::DEFAULT_STORE_CAPACITY;
use crate::config::helpers::{parse_bool_env, parse_env};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Execution engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum records kept in the execution store.
    pub store_capacity: usize,
    /// Upper bound on a single compliance validator call.
    pub compliance_timeout: Duration,
    /// Bound handler calls by the command's `execution_timeout`.
    pub enforce_timeouts: bool,
    /// Retry failed handler calls according to the command's retry policy.
    pub enforce_retries: bool,
    pub retry_base_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_capacity: DEFAULT_STORE_CAPACITY,
            compliance_timeout: Duration::from_secs(30),
            enforce_timeouts: true,
            enforce_retries: false,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let store_capacity = parse_env::<usize>(
            "BOTCOMMANDER_STORE_CAPACITY",
            settings.engine.store_capacity,
            "a positive integer",
        )?;
        if store_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BOTCOMMANDER_STORE_CAPACITY".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        let compliance_timeout_secs = parse_env::<u64>(
            "BOTCOMMANDER_COMPLIANCE_TIMEOUT_SECS",
            settings.engine.compliance_timeout_secs,
            "a positive integer",
        )?;
        if compliance_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BOTCOMMANDER_COMPLIANCE_TIMEOUT_SECS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        let retry_base_delay_ms = parse_env::<u64>(
            "BOTCOMMANDER_RETRY_BASE_DELAY_MS",
            settings.engine.retry_base_delay_ms,
            "a non-negative integer",
        )?;

        Ok(Self {
            store_capacity,
            compliance_timeout: Duration::from_secs(compliance_timeout_secs),
            enforce_timeouts: parse_bool_env(
                "BOTCOMMANDER_ENFORCE_TIMEOUTS",
                settings.engine.enforce_timeouts,
            )?,
            enforce_retries: parse_bool_env(
                "BOTCOMMANDER_ENFORCE_RETRIES",
                settings.engine.enforce_retries,
            )?,
            retry_base_delay: Duration::from_millis(retry_base_delay_ms),
        })
    }
}
