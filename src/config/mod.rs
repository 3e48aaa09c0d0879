//! Configuration for BotCommander.
//!
//! Settings are loaded with priority: env var > TOML file > default.
//! `.env` files are loaded via dotenvy early in startup and never override
//! variables already present in the process environment.

mod compliance;
mod engine;
pub(crate) mod helpers;
mod logging;

use std::path::Path;

use crate::error::ConfigError;
use crate::settings::Settings;

pub use self::compliance::ComplianceConfig;
pub use self::engine::EngineConfig;
pub use self::logging::{LogFormat, LoggingConfig};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub engine: EngineConfig,
    pub compliance: ComplianceConfig,
    pub logging: LoggingConfig,
}

pub(crate) fn normalize_variant(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

impl Config {
    /// Load from env vars and the default TOML file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_toml(None)
    }

    /// Load from env vars with an optional TOML config file overlay.
    ///
    /// An explicit path must exist and parse. The default path
    /// (`~/.botcommander/config.toml`) is optional and a broken file there is
    /// only logged.
    pub fn from_env_with_toml(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        crate::bootstrap::load_env_files();
        let mut settings = Settings::default();
        Self::apply_toml_overlay(&mut settings, toml_path)?;
        Self::resolve(&settings)
    }

    fn apply_toml_overlay(
        settings: &mut Settings,
        explicit_path: Option<&Path>,
    ) -> Result<(), ConfigError> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Settings::default_toml_path);

        match Settings::load_toml(&path) {
            Ok(Some(toml_settings)) => {
                settings.merge_from(&toml_settings);
                tracing::debug!("Loaded TOML config from {}", path.display());
            }
            Ok(None) => {
                if explicit_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
            }
            Err(e) => {
                if explicit_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Failed to load config file {}: {}",
                        path.display(),
                        e
                    )));
                }
                tracing::warn!("Failed to load default config file: {}", e);
            }
        }
        Ok(())
    }

    /// Resolve every section against env vars, with `settings` as fallback.
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: EngineConfig::resolve(settings)?,
            compliance: ComplianceConfig::resolve(settings)?,
            logging: LoggingConfig::resolve(settings)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 8] = [
        "BOTCOMMANDER_STORE_CAPACITY",
        "BOTCOMMANDER_COMPLIANCE_TIMEOUT_SECS",
        "BOTCOMMANDER_ENFORCE_TIMEOUTS",
        "BOTCOMMANDER_ENFORCE_RETRIES",
        "BOTCOMMANDER_RETRY_BASE_DELAY_MS",
        "BOTCOMMANDER_BLOCKED_TAGS",
        "BOTCOMMANDER_REQUIRED_PARAMS",
        "BOTCOMMANDER_LOG_FORMAT",
    ];

    fn clear_env() {
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            for key in KEYS {
                std::env::remove_var(key);
            }
            std::env::remove_var("BOTCOMMANDER_LOG_LEVEL");
        }
    }

    #[test]
    fn resolves_defaults() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_env();

        let config = Config::resolve(&Settings::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine.store_capacity, 10_000);
        assert_eq!(config.engine.compliance_timeout, Duration::from_secs(30));
        assert!(config.engine.enforce_timeouts);
        assert!(!config.engine.enforce_retries);
        assert!(config.compliance.tag_policy().is_none());
    }

    #[test]
    fn env_overrides_settings() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_env();

        let mut settings = Settings::default();
        settings.engine.store_capacity = 50;
        settings.compliance.blocked_tags = vec!["from_file".to_string()];

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("BOTCOMMANDER_STORE_CAPACITY", "25");
            std::env::set_var("BOTCOMMANDER_ENFORCE_RETRIES", "yes");
            std::env::set_var("BOTCOMMANDER_BLOCKED_TAGS", "market_manipulation, ,spam");
            std::env::set_var("BOTCOMMANDER_REQUIRED_PARAMS", "GDPR=consent");
            std::env::set_var("BOTCOMMANDER_LOG_FORMAT", "JSON");
        }

        let config = Config::resolve(&settings).unwrap();
        clear_env();

        assert_eq!(config.engine.store_capacity, 25);
        assert!(config.engine.enforce_retries);
        assert_eq!(
            config.compliance.blocked_tags,
            vec!["market_manipulation".to_string(), "spam".to_string()]
        );
        assert_eq!(config.compliance.required_params["GDPR"], "consent");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.compliance.tag_policy().is_some());
    }

    #[test]
    fn rejects_invalid_values() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_env();

        let cases = [
            ("BOTCOMMANDER_STORE_CAPACITY", "0"),
            ("BOTCOMMANDER_STORE_CAPACITY", "lots"),
            ("BOTCOMMANDER_COMPLIANCE_TIMEOUT_SECS", "0"),
            ("BOTCOMMANDER_ENFORCE_TIMEOUTS", "maybe"),
            ("BOTCOMMANDER_REQUIRED_PARAMS", "GDPR"),
            ("BOTCOMMANDER_LOG_FORMAT", "xml"),
        ];
        for (key, value) in cases {
            // SAFETY: Guarded by ENV_MUTEX in tests.
            unsafe {
                std::env::set_var(key, value);
            }
            let err = Config::resolve(&Settings::default()).unwrap_err();
            clear_env();
            match err {
                ConfigError::InvalidValue { key: got, .. } => assert_eq!(got, key),
                other => panic!("unexpected error for {key}={value}: {other}"),
            }
        }
    }

    #[test]
    fn explicit_toml_path_is_applied() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[engine]\ncompliance_timeout_secs = 5\nenforce_timeouts = false\n\n\
             [compliance]\nblocked_tags = [\"weapons\"]\n",
        )
        .unwrap();

        let config = Config::from_env_with_toml(Some(&path)).unwrap();
        assert_eq!(config.engine.compliance_timeout, Duration::from_secs(5));
        assert!(!config.engine.enforce_timeouts);
        assert_eq!(config.engine.store_capacity, 10_000);
        assert_eq!(config.compliance.blocked_tags, vec!["weapons".to_string()]);
    }

    #[test]
    fn missing_explicit_toml_is_an_error() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_env_with_toml(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
