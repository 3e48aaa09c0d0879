//! File-backed settings.
//!
//! Stored as TOML at `~/.botcommander/config.toml`. Every field has a
//! default so partial files are valid; env vars override anything here at
//! resolve time (see [`crate::config`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::commander::DEFAULT_STORE_CAPACITY;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub compliance: ComplianceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub store_capacity: usize,
    pub compliance_timeout_secs: u64,
    pub enforce_timeouts: bool,
    pub enforce_retries: bool,
    pub retry_base_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            store_capacity: DEFAULT_STORE_CAPACITY,
            compliance_timeout_secs: 30,
            enforce_timeouts: true,
            enforce_retries: false,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceSettings {
    pub blocked_tags: Vec<String>,
    /// e.g. `GDPR = "consent"`
    pub required_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Settings {
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".botcommander")
    }

    pub fn default_toml_path() -> PathBuf {
        Self::default_dir().join("config.toml")
    }

    /// Load settings from a TOML file.
    ///
    /// Returns `None` if the file doesn't exist. Returns an error only
    /// if the file exists but can't be read or parsed.
    pub fn load_toml(path: &Path) -> Result<Option<Self>, String> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("failed to read {}: {}", path.display(), e)),
        };

        toml::from_str(&data)
            .map(Some)
            .map_err(|e| format!("invalid TOML in {}: {}", path.display(), e))
    }

    /// Write the settings as a commented TOML file.
    pub fn save_toml(&self, path: &Path) -> Result<(), String> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize settings: {}", e))?;

        let content = format!(
            "# BotCommander configuration file.\n\
             #\n\
             # Priority: env var > this file > defaults.\n\
             \n\
             {raw}"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        std::fs::write(path, content)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))
    }

    /// Overlay the fields of `other` that differ from their defaults.
    pub fn merge_from(&mut self, other: &Self) {
        let (Ok(defaults), Ok(other_json), Ok(mut self_json)) = (
            serde_json::to_value(Self::default()),
            serde_json::to_value(other),
            serde_json::to_value(&*self),
        ) else {
            return;
        };

        merge_non_default(&mut self_json, &other_json, &defaults);

        if let Ok(merged) = serde_json::from_value(self_json) {
            *self = merged;
        }
    }
}

fn merge_non_default(
    target: &mut serde_json::Value,
    other: &serde_json::Value,
    defaults: &serde_json::Value,
) {
    use serde_json::Value;

    match (target, other, defaults) {
        (Value::Object(t), Value::Object(o), Value::Object(d)) => {
            for (key, other_val) in o {
                let default_val = d.get(key).cloned().unwrap_or(Value::Null);
                if let Some(target_val) = t.get_mut(key) {
                    merge_non_default(target_val, other_val, &default_val);
                } else if other_val != &default_val {
                    t.insert(key.clone(), other_val.clone());
                }
            }
        }
        (target, other, defaults) => {
            if other != defaults {
                *target = other.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_path_lives_under_botcommander() {
        let path = Settings::default_toml_path();
        assert!(path.to_string_lossy().contains(".botcommander"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str("[engine]\nenforce_retries = true\n").unwrap();
        assert!(settings.engine.enforce_retries);
        assert_eq!(settings.engine.store_capacity, DEFAULT_STORE_CAPACITY);
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn merge_only_applies_non_default_fields() {
        let mut base = Settings::default();
        base.engine.store_capacity = 42;
        base.logging.format = "json".to_string();

        let mut overlay = Settings::default();
        overlay.engine.compliance_timeout_secs = 5;

        base.merge_from(&overlay);
        assert_eq!(base.engine.store_capacity, 42);
        assert_eq!(base.engine.compliance_timeout_secs, 5);
        assert_eq!(base.logging.format, "json");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.compliance.blocked_tags = vec!["weapons".to_string()];
        settings
            .compliance
            .required_params
            .insert("GDPR".to_string(), "consent".to_string());
        settings.save_toml(&path).unwrap();

        let loaded = Settings::load_toml(&path).unwrap().unwrap();
        assert_eq!(loaded, settings);
        assert!(Settings::load_toml(&dir.path().join("absent.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nstore_capacity = ").unwrap();
        let err = Settings::load_toml(&path).unwrap_err();
        assert!(err.contains("invalid TOML"));
    }
}
