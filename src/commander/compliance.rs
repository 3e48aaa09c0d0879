//! Compliance validation contract and stock validators.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Serialize;

use crate::commander::execution::Parameters;
use crate::commander::safety::is_truthy;
use crate::error::ComplianceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceVerdict {
    pub approved: bool,
    pub reason: String,
}

impl ComplianceVerdict {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            approved: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: reason.into(),
        }
    }
}

/// Approves or rejects an invocation against a command's compliance tags.
///
/// May be slow or fail; the engine bounds the call with a timeout and treats
/// any error as a failed execution.
#[async_trait]
pub trait ComplianceValidator: Send + Sync {
    async fn validate_command(
        &self,
        requirements: &BTreeSet<String>,
        parameters: &Parameters,
    ) -> Result<ComplianceVerdict, ComplianceError>;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllCompliance;

#[async_trait]
impl ComplianceValidator for AllowAllCompliance {
    async fn validate_command(
        &self,
        _requirements: &BTreeSet<String>,
        _parameters: &Parameters,
    ) -> Result<ComplianceVerdict, ComplianceError> {
        Ok(ComplianceVerdict::approve("compliance validation passed"))
    }
}

/// Static tag policy: blocked tags always reject, and a tag may require a
/// truthy parameter (for example `GDPR` requiring `consent`).
///
/// Tags compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TagPolicyCompliance {
    blocked: BTreeSet<String>,
    required_params: BTreeMap<String, String>,
}

impl TagPolicyCompliance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked
            .extend(tags.into_iter().map(|t| normalize_tag(t.as_ref())));
        self
    }

    pub fn require_param(mut self, tag: &str, parameter: impl Into<String>) -> Self {
        self.required_params
            .insert(normalize_tag(tag), parameter.into());
        self
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase()
}

#[async_trait]
impl ComplianceValidator for TagPolicyCompliance {
    async fn validate_command(
        &self,
        requirements: &BTreeSet<String>,
        parameters: &Parameters,
    ) -> Result<ComplianceVerdict, ComplianceError> {
        for tag in requirements {
            let normalized = normalize_tag(tag);
            if self.blocked.contains(&normalized) {
                return Ok(ComplianceVerdict::reject(format!(
                    "requirement '{tag}' is blocked by policy"
                )));
            }
            if let Some(param) = self.required_params.get(&normalized)
                && !parameters.get(param).is_some_and(is_truthy)
            {
                return Ok(ComplianceVerdict::reject(format!(
                    "requirement '{tag}' needs parameter '{param}'"
                )));
            }
        }
        Ok(ComplianceVerdict::approve("compliance validation passed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn allow_all_approves() {
        let verdict = AllowAllCompliance
            .validate_command(&tags(&["GDPR"]), &Parameters::new())
            .await
            .unwrap();
        assert!(verdict.approved);
    }

    #[tokio::test]
    async fn blocked_tags_reject_case_insensitively() {
        let policy = TagPolicyCompliance::new().block(["market_manipulation"]);
        let verdict = policy
            .validate_command(&tags(&["Market_Manipulation"]), &Parameters::new())
            .await
            .unwrap();
        assert!(!verdict.approved);
        assert!(verdict.reason.contains("blocked"));
    }

    #[tokio::test]
    async fn required_parameter_must_be_truthy() {
        let policy = TagPolicyCompliance::new().require_param("GDPR", "consent");
        let missing = policy
            .validate_command(&tags(&["GDPR", "HIPAA"]), &Parameters::new())
            .await
            .unwrap();
        assert!(!missing.approved);
        assert_eq!(missing.reason, "requirement 'GDPR' needs parameter 'consent'");

        let mut params = Parameters::new();
        params.insert("consent".to_string(), json!(true));
        let granted = policy
            .validate_command(&tags(&["GDPR"]), &params)
            .await
            .unwrap();
        assert!(granted.approved);
    }
}
