//! Local safety-constraint checks run before compliance validation.

use serde::Serialize;
use serde_json::Value;

use crate::commander::command::{BotCommand, SafetyConstraint};
use crate::commander::execution::Parameters;

/// Outcome of a safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyVerdict {
    pub approved: bool,
    pub reason: String,
}

impl SafetyVerdict {
    fn approve() -> Self {
        Self {
            approved: true,
            reason: "all safety constraints satisfied".to_string(),
        }
    }

    fn reject(reason: &str) -> Self {
        Self {
            approved: false,
            reason: reason.to_string(),
        }
    }
}

/// Checks the fixed safety flags in order: human oversight, audit trail,
/// rollback capability. The first failing check is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyValidator;

impl SafetyValidator {
    pub fn validate(&self, command: &BotCommand, parameters: &Parameters) -> SafetyVerdict {
        for constraint in SafetyConstraint::ALL {
            if !command.requires(constraint) {
                continue;
            }
            let (flag, default, reason) = match constraint {
                SafetyConstraint::HumanOversight => {
                    ("human_approval", false, "human oversight required")
                }
                SafetyConstraint::AuditTrail => ("audit_enabled", true, "audit trail required"),
                SafetyConstraint::RollbackCapability => {
                    ("rollback_enabled", true, "rollback required")
                }
            };
            let satisfied = parameters.get(flag).map(is_truthy).unwrap_or(default);
            if !satisfied {
                return SafetyVerdict::reject(reason);
            }
        }
        SafetyVerdict::approve()
    }
}

/// JSON truthiness: null, false, 0, "", [] and {} are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::command::BotCategory;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap_or_default()
    }

    fn guarded() -> BotCommand {
        BotCommand::new(BotCategory::TradingBots, "risk_warden", "Risk Warden")
    }

    #[test]
    fn human_oversight_requires_explicit_approval() {
        let verdict = SafetyValidator.validate(&guarded(), &params(json!({})));
        assert!(!verdict.approved);
        assert_eq!(verdict.reason, "human oversight required");

        let verdict =
            SafetyValidator.validate(&guarded(), &params(json!({"human_approval": false})));
        assert_eq!(verdict.reason, "human oversight required");
    }

    #[test]
    fn audit_and_rollback_default_to_enabled() {
        let verdict =
            SafetyValidator.validate(&guarded(), &params(json!({"human_approval": true})));
        assert!(verdict.approved);
    }

    #[test]
    fn first_failing_check_wins() {
        let all_off = params(json!({
            "human_approval": false,
            "audit_enabled": false,
            "rollback_enabled": false,
        }));
        assert_eq!(
            SafetyValidator.validate(&guarded(), &all_off).reason,
            "human oversight required"
        );

        let audit_off = params(json!({
            "human_approval": true,
            "audit_enabled": false,
            "rollback_enabled": false,
        }));
        assert_eq!(
            SafetyValidator.validate(&guarded(), &audit_off).reason,
            "audit trail required"
        );

        let rollback_off = params(json!({"human_approval": "yes", "rollback_enabled": 0}));
        assert_eq!(
            SafetyValidator.validate(&guarded(), &rollback_off).reason,
            "rollback required"
        );
    }

    #[test]
    fn undeclared_constraints_are_not_checked() {
        let cmd = guarded().with_safety([SafetyConstraint::RollbackCapability]);
        let verdict = SafetyValidator.validate(&cmd, &params(json!({"audit_enabled": false})));
        assert!(verdict.approved);
    }

    #[test]
    fn verdict_is_deterministic() {
        let p = params(json!({"human_approval": true, "audit_enabled": null}));
        let first = SafetyValidator.validate(&guarded(), &p);
        let second = SafetyValidator.validate(&guarded(), &p);
        assert_eq!(first, second);
        assert_eq!(first.reason, "audit trail required");
    }

    #[test]
    fn truthiness_follows_json_semantics() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!({"a": 1})));
    }
}
