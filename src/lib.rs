//! BotCommander: dispatch engine for categorized bot commands.
//!
//! A [`BotCommander`] resolves `(category, command_id)` against a
//! [`CommandRegistry`], gates the invocation on local safety constraints and
//! an external [`ComplianceValidator`], runs the category's
//! [`CategoryHandler`] under a timeout and keeps the resulting
//! [`Execution`] record queryable by id.
//!
//! ```no_run
//! # async fn demo() -> Result<(), botcommander::Error> {
//! use botcommander::BotCommander;
//!
//! let commander = BotCommander::with_defaults();
//! let execution = commander
//!     .execute_directive(r#"// [BOT:trading:risk_warden, human_approval=true, risk_threshold=0.1]"#)
//!     .await?;
//! println!("{}", execution.status);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod commander;
pub mod config;
pub mod directive;
pub mod error;
pub mod handlers;
pub mod settings;

pub use commander::{
    BotCategory, BotCommand, BotCommander, BotCommanderBuilder, CommandRegistry, ComplianceStatus,
    ComplianceValidator, ComplianceVerdict, Execution, ExecutionEvent, ExecutionStatus,
    Parameters,
};
pub use config::Config;
pub use error::{Error, ExecutionErrorKind, Result};
pub use handlers::{CategoryHandler, HandlerSet};
