//! Execution records and their lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::commander::command::BotCommand;
use crate::error::ExecutionErrorKind;

/// Caller-supplied argument map for one invocation.
pub type Parameters = serde_json::Map<String, Value>;

/// Lifecycle state of an execution.
///
/// `pending -> running -> {completed | failed | cancelled}`. A record may
/// also fail or be cancelled straight from `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Pending,
    Approved,
    Rejected,
    Error,
}

impl ComplianceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }
}

/// Timing and resource figures captured at the terminal transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Seconds between start and end.
    pub execution_time: f64,
    /// Percent, as reported by the configured resource sampler.
    pub memory_usage: f64,
    /// Percent, as reported by the configured resource sampler.
    pub cpu_usage: f64,
}

/// Mutable record of one command invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    pub execution_id: Uuid,
    #[serde(serialize_with = "serialize_command")]
    pub command: Arc<BotCommand>,
    pub parameters: Parameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Parameters>,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub error_kind: Option<ExecutionErrorKind>,
    pub compliance_status: ComplianceStatus,
    pub performance_metrics: Option<PerformanceMetrics>,
    /// Handler invocations made, including retries.
    pub attempts: u32,
}

fn serialize_command<S: Serializer>(
    command: &Arc<BotCommand>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    command.as_ref().serialize(serializer)
}

impl Execution {
    pub fn new(command: Arc<BotCommand>, parameters: Parameters, context: Option<Parameters>) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            command,
            parameters,
            context,
            status: ExecutionStatus::Pending,
            start_time: Utc::now(),
            end_time: None,
            result: None,
            error: None,
            error_kind: None,
            compliance_status: ComplianceStatus::Pending,
            performance_metrics: None,
            attempts: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Compliance passed; the handler may now run.
    pub(crate) fn start_running(&mut self) -> bool {
        if self.status != ExecutionStatus::Pending {
            return false;
        }
        self.compliance_status = ComplianceStatus::Approved;
        self.status = ExecutionStatus::Running;
        true
    }

    pub(crate) fn complete(&mut self, result: Value) -> bool {
        if self.status != ExecutionStatus::Running {
            return false;
        }
        self.status = ExecutionStatus::Completed;
        self.result = Some(result);
        self.end_time = Some(Utc::now());
        true
    }

    pub(crate) fn fail(&mut self, kind: ExecutionErrorKind, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        match kind {
            ExecutionErrorKind::SafetyRejected | ExecutionErrorKind::ComplianceRejected => {
                self.compliance_status = ComplianceStatus::Rejected;
            }
            ExecutionErrorKind::ComplianceValidatorError => {
                self.compliance_status = ComplianceStatus::Error;
            }
            _ => {}
        }
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.error_kind = Some(kind);
        self.end_time = Some(Utc::now());
        true
    }

    pub(crate) fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = ExecutionStatus::Cancelled;
        self.error_kind = Some(ExecutionErrorKind::Cancelled);
        self.end_time = Some(Utc::now());
        true
    }

    /// Stamp metrics once the record is terminal. Later calls are ignored.
    pub(crate) fn record_metrics(&mut self, memory_usage: f64, cpu_usage: f64) {
        if self.performance_metrics.is_some() {
            return;
        }
        let Some(end) = self.end_time else {
            return;
        };
        let elapsed = (end - self.start_time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.performance_metrics = Some(PerformanceMetrics {
            execution_time: elapsed,
            memory_usage,
            cpu_usage,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::command::BotCategory;
    use serde_json::json;

    fn execution() -> Execution {
        let cmd = BotCommand::new(BotCategory::GameBots, "bug_reporter", "Bug Reporter");
        Execution::new(Arc::new(cmd), Parameters::new(), None)
    }

    #[test]
    fn happy_path_transitions() {
        let mut exec = execution();
        assert_eq!(exec.status, ExecutionStatus::Pending);
        assert!(exec.start_running());
        assert_eq!(exec.compliance_status, ComplianceStatus::Approved);
        assert!(exec.complete(json!({"ok": true})));
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert!(exec.end_time.unwrap() >= exec.start_time);
        assert!(exec.error.is_none());
    }

    #[test]
    fn terminal_states_never_regress() {
        let mut exec = execution();
        exec.start_running();
        exec.fail(ExecutionErrorKind::HandlerExecution, "boom");

        assert!(!exec.start_running());
        assert!(!exec.complete(json!(1)));
        assert!(!exec.cancel());
        assert!(!exec.fail(ExecutionErrorKind::Timeout, "late"));
        assert_eq!(exec.status, ExecutionStatus::Failed);
        assert_eq!(exec.error.as_deref(), Some("boom"));
        assert!(exec.result.is_none());
    }

    #[test]
    fn rejection_sets_compliance_status() {
        let mut exec = execution();
        exec.fail(ExecutionErrorKind::SafetyRejected, "human oversight required");
        assert_eq!(exec.compliance_status, ComplianceStatus::Rejected);

        let mut exec = execution();
        exec.fail(ExecutionErrorKind::ComplianceValidatorError, "policy engine down");
        assert_eq!(exec.compliance_status, ComplianceStatus::Error);
    }

    #[test]
    fn complete_requires_running() {
        let mut exec = execution();
        assert!(!exec.complete(json!(null)));
        assert_eq!(exec.status, ExecutionStatus::Pending);
    }

    #[test]
    fn metrics_are_stamped_once() {
        let mut exec = execution();
        exec.record_metrics(1.0, 1.0);
        assert!(exec.performance_metrics.is_none());

        exec.cancel();
        exec.record_metrics(10.0, 20.0);
        exec.record_metrics(99.0, 99.0);
        let metrics = exec.performance_metrics.unwrap();
        assert_eq!(metrics.memory_usage, 10.0);
        assert!(metrics.execution_time >= 0.0);
    }

    #[test]
    fn serializes_with_command_metadata() {
        let exec = execution();
        let value = serde_json::to_value(&exec).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["command"]["command_id"], "bug_reporter");
        assert_eq!(value["command"]["category"], "game_bots");
        assert!(value.get("context").is_none());
    }
}
