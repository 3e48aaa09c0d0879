//! Error types for BotCommander.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commander::BotCategory;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Compliance error: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Directive error: {0}")]
    Directive(#[from] DirectiveError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registry and lookup errors. These are the only failures surfaced to
/// callers of `execute_command` as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Command not found: {category}:{command_id}")]
    NotFound { category: String, command_id: String },

    #[error("Command already registered: {category}:{command_id}")]
    Duplicate {
        category: BotCategory,
        command_id: String,
    },

    #[error("Invalid command {command_id}: {reason}")]
    InvalidCommand { command_id: String, reason: String },

    #[error("Unknown bot category: {0}")]
    UnknownCategory(String),
}

/// Failures raised by a compliance validator implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComplianceError {
    #[error("Policy engine unavailable: {0}")]
    Unavailable(String),

    #[error("Compliance check timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("{0}")]
    Failed(String),
}

/// Failures raised by a category handler.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerError {
    /// The handler does not implement this command id.
    #[error("Unknown {category} command: {command_id}")]
    UnknownCommand {
        category: BotCategory,
        command_id: String,
    },

    /// The handler ran and failed. The message is recorded verbatim.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// An unknown command id fails identically on every attempt.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Failures from metrics and history sinks. Always logged and swallowed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("Metrics sink {name} rejected record: {reason}")]
    Metrics { name: String, reason: String },

    #[error("History sink {name} rejected record: {reason}")]
    History { name: String, reason: String },
}

/// Errors from parsing `// [BOT:...]` directives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("No valid bot command found")]
    NotFound,

    #[error("Invalid category '{category}'. Valid categories: {valid}")]
    InvalidCategory { category: String, valid: String },

    #[error("Command name cannot be empty")]
    EmptyCommand,

    #[error("Invalid parameter block: {0}")]
    InvalidParameters(String),
}

/// Failure kind recorded inside a failed or cancelled execution.
///
/// Business-logic failures never surface as `Err`; callers read the kind
/// from the returned record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    SafetyRejected,
    ComplianceRejected,
    ComplianceValidatorError,
    HandlerUnavailable,
    HandlerExecution,
    Timeout,
    Cancelled,
}

impl ExecutionErrorKind {
    /// Stable code for status surfaces and logs.
    pub fn code(self) -> &'static str {
        match self {
            Self::SafetyRejected => "safety.rejected",
            Self::ComplianceRejected => "compliance.rejected",
            Self::ComplianceValidatorError => "compliance.validator_error",
            Self::HandlerUnavailable => "handler.unavailable",
            Self::HandlerExecution => "handler.execution_failed",
            Self::Timeout => "handler.timeout",
            Self::Cancelled => "execution.cancelled",
        }
    }

    /// Whether re-submitting the same invocation could succeed.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            Self::ComplianceValidatorError | Self::HandlerExecution | Self::Timeout
        )
    }
}

impl std::fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
