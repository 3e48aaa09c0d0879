//! Outbound collaborators notified after every terminal transition, plus
//! resource sampling for performance metrics.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::commander::command::BotCategory;
use crate::commander::execution::{Execution, ExecutionStatus};
use crate::error::SinkError;

/// Receives every terminal execution for metrics aggregation.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    async fn record_command_execution(&self, execution: &Execution) -> Result<(), SinkError>;
}

/// Persists terminal executions as history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn store_command_execution(&self, execution: &Execution) -> Result<(), SinkError>;
}

/// Host memory and CPU usage, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub memory: f64,
    pub cpu: f64,
}

/// Samples host resource usage when an execution finishes.
pub trait ResourceSampler: Send + Sync {
    fn sample(&self) -> ResourceUsage;
}

/// Reports zero usage. Used where no probe is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSampler;

impl ResourceSampler for NoopSampler {
    fn sample(&self) -> ResourceUsage {
        ResourceUsage::default()
    }
}

/// Reads `/proc/meminfo` and `/proc/loadavg`. Falls back to zero on hosts
/// without procfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcfsSampler;

impl ProcfsSampler {
    fn memory_percent() -> Option<f64> {
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        let field = |name: &str| -> Option<f64> {
            meminfo
                .lines()
                .find(|line| line.starts_with(name))?
                .split_whitespace()
                .nth(1)?
                .parse()
                .ok()
        };
        let total = field("MemTotal:")?;
        let available = field("MemAvailable:")?;
        if total <= 0.0 {
            return None;
        }
        Some(((total - available) / total * 100.0).clamp(0.0, 100.0))
    }

    fn cpu_percent() -> Option<f64> {
        let loadavg = std::fs::read_to_string("/proc/loadavg").ok()?;
        let one_minute: f64 = loadavg.split_whitespace().next()?.parse().ok()?;
        let cores = std::thread::available_parallelism()
            .map(|n| n.get() as f64)
            .unwrap_or(1.0);
        Some((one_minute / cores * 100.0).clamp(0.0, 100.0))
    }
}

impl ResourceSampler for ProcfsSampler {
    fn sample(&self) -> ResourceUsage {
        ResourceUsage {
            memory: Self::memory_percent().unwrap_or(0.0),
            cpu: Self::cpu_percent().unwrap_or(0.0),
        }
    }
}

/// Aggregated counters kept by [`InMemoryMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_category: BTreeMap<BotCategory, u64>,
    pub total_execution_time: f64,
}

impl MetricsSnapshot {
    pub fn count(&self, status: ExecutionStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    snapshot: Mutex<MetricsSnapshot>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot.lock().await.clone()
    }
}

#[async_trait]
impl MetricsCollector for InMemoryMetrics {
    async fn record_command_execution(&self, execution: &Execution) -> Result<(), SinkError> {
        let mut snapshot = self.snapshot.lock().await;
        snapshot.total += 1;
        *snapshot
            .by_status
            .entry(execution.status.as_str().to_string())
            .or_default() += 1;
        *snapshot
            .by_category
            .entry(execution.command.category)
            .or_default() += 1;
        if let Some(metrics) = execution.performance_metrics {
            snapshot.total_execution_time += metrics.execution_time;
        }
        Ok(())
    }
}

/// Logs each terminal execution at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

#[async_trait]
impl MetricsCollector for TracingMetrics {
    async fn record_command_execution(&self, execution: &Execution) -> Result<(), SinkError> {
        let elapsed = execution
            .performance_metrics
            .map(|m| m.execution_time)
            .unwrap_or_default();
        tracing::info!(
            execution_id = %execution.execution_id,
            command = %execution.command.key(),
            status = %execution.status,
            elapsed_secs = elapsed,
            "command execution recorded"
        );
        Ok(())
    }
}

/// Keeps the most recent terminal executions, oldest dropped first.
#[derive(Debug)]
pub struct InMemoryHistory {
    entries: Mutex<VecDeque<Execution>>,
    limit: usize,
}

impl InMemoryHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    /// Newest first.
    pub async fn recent(&self, n: usize) -> Vec<Execution> {
        self.entries.lock().await.iter().rev().take(n).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn store_command_execution(&self, execution: &Execution) -> Result<(), SinkError> {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.limit {
            entries.pop_front();
        }
        entries.push_back(execution.clone());
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistory;

#[async_trait]
impl HistoryStore for NullHistory {
    async fn store_command_execution(&self, _: &Execution) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::command::BotCommand;
    use crate::commander::execution::Parameters;
    use crate::error::ExecutionErrorKind;
    use std::sync::Arc;

    fn failed(category: BotCategory) -> Execution {
        let cmd = BotCommand::new(category, "cmd", "Cmd");
        let mut exec = Execution::new(Arc::new(cmd), Parameters::new(), None);
        exec.fail(ExecutionErrorKind::SafetyRejected, "no");
        exec.record_metrics(0.0, 0.0);
        exec
    }

    #[tokio::test]
    async fn in_memory_metrics_counts_by_status_and_category() {
        let metrics = InMemoryMetrics::new();
        metrics
            .record_command_execution(&failed(BotCategory::GameBots))
            .await
            .unwrap();
        metrics
            .record_command_execution(&failed(BotCategory::MetaBots))
            .await
            .unwrap();

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.count(ExecutionStatus::Failed), 2);
        assert_eq!(snapshot.count(ExecutionStatus::Completed), 0);
        assert_eq!(snapshot.by_category[&BotCategory::GameBots], 1);
    }

    #[tokio::test]
    async fn history_is_bounded_and_newest_first() {
        let history = InMemoryHistory::new(2);
        let first = failed(BotCategory::GameBots);
        let second = failed(BotCategory::GameBots);
        let third = failed(BotCategory::GameBots);
        for exec in [&first, &second, &third] {
            history.store_command_execution(exec).await.unwrap();
        }

        assert_eq!(history.len().await, 2);
        let recent = history.recent(5).await;
        assert_eq!(recent[0].execution_id, third.execution_id);
        assert_eq!(recent[1].execution_id, second.execution_id);
    }

    #[test]
    fn samplers_report_percentages() {
        assert_eq!(NoopSampler.sample(), ResourceUsage::default());
        let usage = ProcfsSampler.sample();
        assert!((0.0..=100.0).contains(&usage.memory));
        assert!((0.0..=100.0).contains(&usage.cpu));
    }
}
