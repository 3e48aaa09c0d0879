//! Process startup: `.env` loading and tracing subscriber installation.
//!
//! `./.env` is loaded first, then `~/.botcommander/.env`. dotenvy never
//! overwrites variables that are already set, so the real environment wins,
//! then the working directory, then the home directory file.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};
use crate::settings::Settings;

pub fn botcommander_env_path() -> PathBuf {
    Settings::default_dir().join(".env")
}

/// Load `.env` files into the process environment. Missing files are fine.
pub fn load_env_files() {
    let _ = dotenvy::dotenv();
    let path = botcommander_env_path();
    if path.exists()
        && let Err(e) = dotenvy::from_path(&path)
    {
        tracing::warn!("Failed to load {}: {}", path.display(), e);
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns false when a subscriber was already installed (tests, embedders).
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_path_is_under_settings_dir() {
        let path = botcommander_env_path();
        assert!(path.starts_with(Settings::default_dir()));
        assert!(path.ends_with(".env"));
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
