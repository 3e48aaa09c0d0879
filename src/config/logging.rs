use crate::config::helpers::optional_env;
use crate::config::normalize_variant;
use crate::error::ConfigError;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str, key: &str) -> Result<Self, ConfigError> {
        match normalize_variant(value).as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "must be one of: pretty, json".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` still wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let level = optional_env("BOTCOMMANDER_LOG_LEVEL")?
            .unwrap_or_else(|| settings.logging.level.clone());
        let format = LogFormat::parse(
            &optional_env("BOTCOMMANDER_LOG_FORMAT")?
                .unwrap_or_else(|| settings.logging.format.clone()),
            "BOTCOMMANDER_LOG_FORMAT",
        )?;
        Ok(Self { level, format })
    }
}
