//! The bot command execution engine.
//!
//! `BotCommander` resolves a command, runs the safety and compliance gates,
//! dispatches to the category handler under a timeout and records the
//! outcome. Business failures never surface as `Err`: the caller always gets
//! the terminal [`Execution`] back and reads `status` / `error_kind` from it.

mod catalog;
mod command;
mod compliance;
mod execution;
mod registry;
mod safety;
mod sinks;
mod store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

pub use self::catalog::builtin_commands;
pub use self::command::{
    BotCategory, BotCommand, CategorySummary, CommandMetadata, RetryPolicy, SafetyConstraint,
};
pub use self::compliance::{
    AllowAllCompliance, ComplianceValidator, ComplianceVerdict, TagPolicyCompliance,
};
pub use self::execution::{
    ComplianceStatus, Execution, ExecutionStatus, Parameters, PerformanceMetrics,
};
pub use self::registry::CommandRegistry;
pub use self::safety::{SafetyValidator, SafetyVerdict, is_truthy};
pub use self::sinks::{
    HistoryStore, InMemoryHistory, InMemoryMetrics, MetricsCollector, MetricsSnapshot,
    NoopSampler, NullHistory, ProcfsSampler, ResourceSampler, ResourceUsage, TracingMetrics,
};
pub use self::store::{DEFAULT_STORE_CAPACITY, ExecutionStore};

use crate::config::{ComplianceConfig, Config, EngineConfig};
use crate::error::{CommandError, ComplianceError, ExecutionErrorKind};
use crate::handlers::{CategoryHandler, HandlerSet};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Lifecycle notification published to [`BotCommander::subscribe`] observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// A pending record was stored.
    Created { execution: Execution },
    /// The record moved to `running` or was cancelled from outside.
    StatusChanged { execution: Execution },
    /// The owning invocation returned its terminal record.
    Finished { execution: Execution },
}

impl ExecutionEvent {
    pub fn execution(&self) -> &Execution {
        match self {
            Self::Created { execution }
            | Self::StatusChanged { execution }
            | Self::Finished { execution } => execution,
        }
    }
}

/// Result of one awaited step that may be interrupted by cancellation.
enum Step<T> {
    Done(T),
    Cancelled,
}

/// Coordinates registry, validators, handlers, sinks and the store.
///
/// Every method takes `&self`; share the engine behind an `Arc` to drive it
/// from many tasks.
pub struct BotCommander {
    registry: Arc<CommandRegistry>,
    handlers: HandlerSet,
    safety: SafetyValidator,
    compliance: Arc<dyn ComplianceValidator>,
    metrics: Arc<dyn MetricsCollector>,
    history: Arc<dyn HistoryStore>,
    sampler: Arc<dyn ResourceSampler>,
    store: Arc<ExecutionStore>,
    options: EngineConfig,
    cancellations: Arc<Mutex<HashMap<Uuid, watch::Sender<bool>>>>,
    events: broadcast::Sender<ExecutionEvent>,
}

/// Handler failure classified for the retry loop.
struct Failure {
    kind: ExecutionErrorKind,
    message: String,
    retryable: bool,
}

/// Cancels the record of an invocation whose future was dropped before it
/// wrote a terminal state, e.g. by a caller-side timeout.
///
/// Cleanup takes the async store lock and is spawned onto the current
/// runtime. Disarmed once the owner has written its terminal record.
struct AbandonGuard {
    execution_id: Uuid,
    store: Arc<ExecutionStore>,
    cancellations: Arc<Mutex<HashMap<Uuid, watch::Sender<bool>>>>,
    sampler: Arc<dyn ResourceSampler>,
    events: broadcast::Sender<ExecutionEvent>,
    armed: bool,
}

impl AbandonGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let execution_id = self.execution_id;
        let store = Arc::clone(&self.store);
        let cancellations = Arc::clone(&self.cancellations);
        let sampler = Arc::clone(&self.sampler);
        let events = self.events.clone();
        runtime.spawn(async move {
            cancellations.lock().await.remove(&execution_id);
            if let Some(cancelled) = store.cancel(&execution_id, sampler.sample()).await {
                tracing::warn!(
                    "Execution {} abandoned by its caller, marked cancelled",
                    execution_id
                );
                let _ = events.send(ExecutionEvent::StatusChanged {
                    execution: cancelled,
                });
            }
        });
    }
}

impl std::fmt::Debug for BotCommander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotCommander")
            .field("commands", &self.registry.len())
            .field("handlers", &self.handlers)
            .field("options", &self.options)
            .finish()
    }
}

impl BotCommander {
    pub fn builder() -> BotCommanderBuilder {
        BotCommanderBuilder::new()
    }

    /// Engine with the builtin catalog, catalog handlers and default options.
    pub fn with_defaults() -> Self {
        BotCommanderBuilder::new().build()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn options(&self) -> &EngineConfig {
        &self.options
    }

    /// Run one command invocation to a terminal state.
    ///
    /// Only an unknown (category, command id) pair is returned as `Err`, and
    /// in that case no record is created.
    pub async fn execute_command(
        &self,
        category: &str,
        command_id: &str,
        parameters: Parameters,
        context: Option<Parameters>,
    ) -> Result<Execution, CommandError> {
        let command = self.registry.resolve(category, command_id)?;
        let mut execution = Execution::new(command, parameters, context);
        let execution_id = execution.execution_id;
        let mut guard = AbandonGuard {
            execution_id,
            store: Arc::clone(&self.store),
            cancellations: Arc::clone(&self.cancellations),
            sampler: Arc::clone(&self.sampler),
            events: self.events.clone(),
            armed: true,
        };

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        self.cancellations.lock().await.insert(execution_id, cancel_tx);
        self.store.insert(execution.clone()).await;
        self.emit(ExecutionEvent::Created {
            execution: execution.clone(),
        });
        tracing::debug!(
            "Execution {} created for {}",
            execution_id,
            execution.command.key()
        );

        self.run(&mut execution, &mut cancel_rx).await;
        self.cancellations.lock().await.remove(&execution_id);

        // Interrupted by cancel_execution or shutdown: the store already
        // holds the cancelled record.
        if !execution.is_terminal() {
            execution.cancel();
        }
        let usage = self.sampler.sample();
        execution.record_metrics(usage.memory, usage.cpu);
        let execution = self.store.finish(execution).await;
        guard.disarm();

        match execution.status {
            ExecutionStatus::Completed => tracing::debug!(
                "Execution {} completed in {:.3}s",
                execution_id,
                execution
                    .performance_metrics
                    .map(|m| m.execution_time)
                    .unwrap_or_default()
            ),
            ExecutionStatus::Cancelled => {
                tracing::info!("Execution {} was cancelled", execution_id)
            }
            _ => tracing::warn!(
                "Execution {} failed ({}): {}",
                execution_id,
                execution
                    .error_kind
                    .map(|k| k.code())
                    .unwrap_or("unknown"),
                execution.error.as_deref().unwrap_or_default()
            ),
        }

        self.notify_sinks(&execution).await;
        self.emit(ExecutionEvent::Finished {
            execution: execution.clone(),
        });
        Ok(execution)
    }

    /// Drive a pending record through the gates and the handler. Returns
    /// with the record terminal, or non-terminal when cancelled.
    async fn run(&self, execution: &mut Execution, cancel_rx: &mut watch::Receiver<bool>) {
        let command = Arc::clone(&execution.command);

        let verdict = self.safety.validate(&command, &execution.parameters);
        if !verdict.approved {
            execution.fail(
                ExecutionErrorKind::SafetyRejected,
                format!("Safety constraint violation: {}", verdict.reason),
            );
            return;
        }

        let timeout = self.options.compliance_timeout;
        let check = tokio::time::timeout(
            timeout,
            self.compliance
                .validate_command(&command.compliance_requirements, &execution.parameters),
        );
        let outcome = match until_cancelled(cancel_rx, check).await {
            Step::Done(outcome) => outcome,
            Step::Cancelled => return,
        };
        match outcome {
            Ok(Ok(verdict)) if verdict.approved => {}
            Ok(Ok(verdict)) => {
                execution.fail(
                    ExecutionErrorKind::ComplianceRejected,
                    format!("Compliance validation failed: {}", verdict.reason),
                );
                return;
            }
            Ok(Err(e)) => {
                execution.fail(
                    ExecutionErrorKind::ComplianceValidatorError,
                    format!("Compliance validation error: {e}"),
                );
                return;
            }
            Err(_) => {
                execution.fail(
                    ExecutionErrorKind::ComplianceValidatorError,
                    format!(
                        "Compliance validation error: {}",
                        ComplianceError::Timeout { timeout }
                    ),
                );
                return;
            }
        }

        execution.start_running();
        if !self.store.publish(execution).await {
            return;
        }
        self.emit(ExecutionEvent::StatusChanged {
            execution: execution.clone(),
        });

        let Some(handler) = self.handlers.get(command.category) else {
            execution.fail(
                ExecutionErrorKind::HandlerUnavailable,
                format!("No handler available for category: {}", command.category),
            );
            return;
        };

        let max_attempts = if self.options.enforce_retries {
            command.retry_policy.max_retries.saturating_add(1)
        } else {
            1
        };

        loop {
            execution.attempts += 1;
            let outcome = match self.invoke(handler.as_ref(), execution, cancel_rx).await {
                Step::Done(outcome) => outcome,
                Step::Cancelled => return,
            };
            let failure = match outcome {
                Ok(result) => {
                    execution.complete(result);
                    return;
                }
                Err(failure) => failure,
            };

            if !failure.retryable || execution.attempts >= max_attempts {
                execution.fail(failure.kind, failure.message);
                return;
            }

            let delay = self.retry_delay(&command.retry_policy, execution.attempts - 1);
            tracing::debug!(
                "Retrying execution {} after {:?} (attempt {} failed: {})",
                execution.execution_id,
                delay,
                execution.attempts,
                failure.message
            );
            if let Step::Cancelled = until_cancelled(cancel_rx, tokio::time::sleep(delay)).await {
                return;
            }
            if !self.store.publish(execution).await {
                return;
            }
        }
    }

    async fn invoke(
        &self,
        handler: &dyn CategoryHandler,
        execution: &Execution,
        cancel_rx: &mut watch::Receiver<bool>,
    ) -> Step<Result<serde_json::Value, Failure>> {
        let command = &execution.command;
        let call = handler.execute(
            &command.command_id,
            &execution.parameters,
            execution.context.as_ref(),
        );
        let limit = Duration::from_secs(command.execution_timeout);
        let enforce = self.options.enforce_timeouts;
        let bounded = async move {
            if enforce {
                tokio::time::timeout(limit, call).await
            } else {
                Ok(call.await)
            }
        };

        match until_cancelled(cancel_rx, bounded).await {
            Step::Cancelled => Step::Cancelled,
            Step::Done(Ok(Ok(value))) => Step::Done(Ok(value)),
            Step::Done(Ok(Err(e))) => Step::Done(Err(Failure {
                kind: ExecutionErrorKind::HandlerExecution,
                retryable: e.retryable(),
                message: e.to_string(),
            })),
            Step::Done(Err(_)) => Step::Done(Err(Failure {
                kind: ExecutionErrorKind::Timeout,
                retryable: ExecutionErrorKind::Timeout.retryable(),
                message: format!(
                    "Command execution timed out after {} seconds",
                    command.execution_timeout
                ),
            })),
        }
    }

    /// `retry_base_delay * backoff_factor^retry`, where `retry` counts from 0.
    fn retry_delay(&self, policy: &RetryPolicy, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = policy.backoff_factor.powi(exponent);
        let secs = self.options.retry_base_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    async fn notify_sinks(&self, execution: &Execution) {
        if let Err(e) = self.metrics.record_command_execution(execution).await {
            tracing::warn!(
                "Failed to record metrics for execution {}: {}",
                execution.execution_id,
                e
            );
        }
        if let Err(e) = self.history.store_command_execution(execution).await {
            tracing::warn!(
                "Failed to store history for execution {}: {}",
                execution.execution_id,
                e
            );
        }
    }

    fn emit(&self, event: ExecutionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub async fn get_execution_status(&self, execution_id: &Uuid) -> Option<Execution> {
        self.store.get(execution_id).await
    }

    /// Every record currently held by the store, whatever its status.
    pub async fn list_executions(&self) -> Vec<Execution> {
        self.store.list().await
    }

    /// Same as [`list_executions`](Self::list_executions); terminal records
    /// are included.
    pub async fn list_active_executions(&self) -> Vec<Execution> {
        self.list_executions().await
    }

    /// Registered command metadata, optionally narrowed to one category.
    pub fn list_commands(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<CommandMetadata>, CommandError> {
        let category = category.map(BotCategory::parse).transpose()?;
        Ok(self.registry.list(category))
    }

    pub fn list_categories(&self) -> Vec<CategorySummary> {
        BotCategory::ALL
            .into_iter()
            .map(|category| CategorySummary {
                category,
                display_name: category.display_name(),
                handler_available: self.handlers.is_available(category),
                command_count: self.registry.count(category),
            })
            .collect()
    }

    /// Cancel one non-terminal execution. Returns the cancelled record, or
    /// `None` when the id is unknown or already terminal.
    pub async fn cancel_execution(&self, execution_id: &Uuid) -> Option<Execution> {
        let cancelled = self
            .store
            .cancel(execution_id, self.sampler.sample())
            .await?;
        if let Some(tx) = self.cancellations.lock().await.get(execution_id) {
            let _ = tx.send(true);
        }
        tracing::info!("Execution {} cancelled on request", execution_id);
        self.emit(ExecutionEvent::StatusChanged {
            execution: cancelled.clone(),
        });
        Some(cancelled)
    }

    /// Cancel every pending or running execution and clear the store.
    ///
    /// Cleared records stay reachable through
    /// [`get_execution_status`](Self::get_execution_status).
    pub async fn shutdown(&self) -> Vec<Execution> {
        tracing::info!("Shutting down bot commander");
        let cancelled = self
            .store
            .cancel_all_and_clear(self.sampler.sample())
            .await;

        let signals: Vec<_> = self.cancellations.lock().await.drain().collect();
        for (_, tx) in signals {
            let _ = tx.send(true);
        }
        for execution in &cancelled {
            self.emit(ExecutionEvent::StatusChanged {
                execution: execution.clone(),
            });
        }

        tracing::info!(
            "Bot commander shutdown complete, {} executions cancelled",
            cancelled.len()
        );
        cancelled
    }

    /// Live lifecycle events. Events missed by a slow subscriber are skipped.
    pub fn subscribe(&self) -> impl Stream<Item = ExecutionEvent> + Send + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(Result::ok)
    }

    /// Wait until the execution reaches a terminal state. Returns `None` for
    /// unknown ids.
    pub async fn wait_for_execution(&self, execution_id: &Uuid) -> Option<Execution> {
        let mut rx = self.events.subscribe();
        loop {
            let current = self.store.get(execution_id).await?;
            if current.is_terminal() {
                return Some(current);
            }
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let execution = event.execution();
                        if execution.execution_id == *execution_id && execution.is_terminal() {
                            return Some(execution.clone());
                        }
                    }
                    // Re-read the store after missing events.
                    Err(broadcast::error::RecvError::Lagged(_)) => break,
                    Err(broadcast::error::RecvError::Closed) => {
                        return self.store.get(execution_id).await;
                    }
                }
            }
        }
    }
}

/// Await `fut` unless the cancel flag is raised first.
async fn until_cancelled<F: std::future::Future>(
    cancel_rx: &mut watch::Receiver<bool>,
    fut: F,
) -> Step<F::Output> {
    tokio::select! {
        biased;
        _ = cancel_signal(cancel_rx) => Step::Cancelled,
        output = fut => Step::Done(output),
    }
}

async fn cancel_signal(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow_and_update() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            // Sender dropped without signalling: never cancelled.
            std::future::pending::<()>().await;
        }
    }
}

/// Assembles a [`BotCommander`]. Unset collaborators fall back to the
/// builtin catalog, catalog handlers, [`AllowAllCompliance`],
/// [`TracingMetrics`], [`NullHistory`] and [`ProcfsSampler`].
#[derive(Default)]
pub struct BotCommanderBuilder {
    registry: Option<CommandRegistry>,
    handlers: Option<HandlerSet>,
    compliance: Option<Arc<dyn ComplianceValidator>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    history: Option<Arc<dyn HistoryStore>>,
    sampler: Option<Arc<dyn ResourceSampler>>,
    options: EngineConfig,
}

impl BotCommanderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply engine options and, when a tag policy is configured, the
    /// matching compliance validator.
    pub fn config(mut self, config: &Config) -> Self {
        self.options = config.engine.clone();
        if let Some(policy) = config.compliance.tag_policy() {
            self.compliance = Some(Arc::new(policy));
        }
        self
    }

    pub fn options(mut self, options: EngineConfig) -> Self {
        self.options = options;
        self
    }

    pub fn compliance_config(mut self, config: &ComplianceConfig) -> Self {
        if let Some(policy) = config.tag_policy() {
            self.compliance = Some(Arc::new(policy));
        }
        self
    }

    pub fn registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn handlers(mut self, handlers: HandlerSet) -> Self {
        self.handlers = Some(handlers);
        self
    }

    pub fn compliance<V: ComplianceValidator + 'static>(mut self, validator: V) -> Self {
        self.compliance = Some(Arc::new(validator));
        self
    }

    pub fn compliance_arc(mut self, validator: Arc<dyn ComplianceValidator>) -> Self {
        self.compliance = Some(validator);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn sampler(mut self, sampler: Arc<dyn ResourceSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn build(self) -> BotCommander {
        let registry = self.registry.unwrap_or_else(CommandRegistry::builtin);
        let handlers = self
            .handlers
            .unwrap_or_else(|| HandlerSet::catalog(&registry));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            "Bot commander ready: {} commands, {} category handlers",
            registry.len(),
            handlers.len()
        );

        BotCommander {
            registry: Arc::new(registry),
            handlers,
            safety: SafetyValidator,
            compliance: self
                .compliance
                .unwrap_or_else(|| Arc::new(AllowAllCompliance)),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(TracingMetrics)),
            history: self.history.unwrap_or_else(|| Arc::new(NullHistory)),
            sampler: self.sampler.unwrap_or_else(|| Arc::new(ProcfsSampler)),
            store: Arc::new(ExecutionStore::new(self.options.store_capacity)),
            options: self.options,
            cancellations: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }
}
