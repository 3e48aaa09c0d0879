use std::collections::BTreeMap;

use crate::commander::TagPolicyCompliance;
use crate::config::helpers::{optional_env, split_list};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Static compliance policy applied by the default validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplianceConfig {
    /// Tags that always reject.
    pub blocked_tags: Vec<String>,
    /// Tag to parameter that must be truthy when the tag is present.
    pub required_params: BTreeMap<String, String>,
}

impl ComplianceConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let blocked_tags = match optional_env("BOTCOMMANDER_BLOCKED_TAGS")? {
            Some(raw) => split_list(&raw),
            None => settings.compliance.blocked_tags.clone(),
        };

        let required_params = match optional_env("BOTCOMMANDER_REQUIRED_PARAMS")? {
            Some(raw) => parse_required_params(&raw)?,
            None => settings.compliance.required_params.clone(),
        };

        Ok(Self {
            blocked_tags,
            required_params,
        })
    }

    /// The configured policy, or `None` when nothing is restricted.
    pub fn tag_policy(&self) -> Option<TagPolicyCompliance> {
        if self.blocked_tags.is_empty() && self.required_params.is_empty() {
            return None;
        }
        let policy = self
            .required_params
            .iter()
            .fold(TagPolicyCompliance::new().block(&self.blocked_tags), |p, (tag, param)| {
                p.require_param(tag, param.clone())
            });
        Some(policy)
    }
}

/// `GDPR=consent,HIPAA=patient_consent`
fn parse_required_params(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((tag, param)) if !tag.trim().is_empty() && !param.trim().is_empty() => {
                Ok((tag.trim().to_string(), param.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: "BOTCOMMANDER_REQUIRED_PARAMS".to_string(),
                message: format!("expected TAG=parameter, got '{pair}'"),
            }),
        })
        .collect()
}
