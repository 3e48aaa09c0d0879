//! Throughput harness: fires many executions through one engine and reports
//! status counts and latency percentiles.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clap::Parser;
use futures::StreamExt;
use serde::Serialize;
use serde_json::{Value, json};

use botcommander::bootstrap;
use botcommander::commander::{
    BotCategory, BotCommander, CommandRegistry, InMemoryMetrics, NoopSampler, Parameters,
};
use botcommander::config::{EngineConfig, LoggingConfig};
use botcommander::error::HandlerError;
use botcommander::handlers::{CategoryHandler, HandlerSet};

#[derive(Parser, Debug)]
#[command(name = "botcommander-bench", about = "Concurrent execution benchmark")]
struct Args {
    /// Total executions to run
    #[arg(long, short = 'n', default_value_t = 10_000)]
    executions: usize,

    /// Executions in flight at once
    #[arg(long, short, default_value_t = 64)]
    concurrency: usize,

    /// Simulated handler latency
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Percentage of handler calls that fail
    #[arg(long, default_value_t = 0)]
    failure_rate: u8,

    /// Percentage of calls submitted without human approval
    #[arg(long, default_value_t = 0)]
    unapproved_rate: u8,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// Handler with fixed latency that fails a deterministic share of calls.
struct LatencyHandler {
    latency: Duration,
    failure_rate: u8,
}

#[async_trait]
impl CategoryHandler for LatencyHandler {
    async fn execute(
        &self,
        command_id: &str,
        parameters: &Parameters,
        _context: Option<&Parameters>,
    ) -> Result<Value, HandlerError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let seq = parameters.get("seq").and_then(Value::as_u64).unwrap_or(0);
        if seq % 100 < u64::from(self.failure_rate) {
            return Err(HandlerError::failed(format!("simulated failure #{seq}")));
        }
        Ok(json!({ "command": command_id, "seq": seq }))
    }
}

#[derive(Debug, Serialize)]
struct Report {
    executions: usize,
    concurrency: usize,
    elapsed_secs: f64,
    throughput_per_sec: f64,
    by_status: BTreeMap<String, u64>,
    latency_ms_p50: f64,
    latency_ms_p95: f64,
    latency_ms_max: f64,
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    bootstrap::init_logging(&LoggingConfig {
        level: "warn".to_string(),
        ..LoggingConfig::default()
    });

    let registry = CommandRegistry::builtin();
    let mut handlers = HandlerSet::new();
    for category in BotCategory::ALL {
        handlers.insert(
            category,
            LatencyHandler {
                latency: Duration::from_millis(args.latency_ms),
                failure_rate: args.failure_rate.min(100),
            },
        );
    }
    let targets: Vec<(BotCategory, String)> = registry
        .iter()
        .map(|cmd| (cmd.category, cmd.command_id.clone()))
        .collect();
    anyhow::ensure!(!targets.is_empty(), "registry is empty");

    let metrics = Arc::new(InMemoryMetrics::new());
    let commander = Arc::new(
        BotCommander::builder()
            .registry(registry)
            .handlers(handlers)
            .metrics(metrics.clone())
            .sampler(Arc::new(NoopSampler))
            .options(EngineConfig {
                store_capacity: args.executions.max(1),
                ..EngineConfig::default()
            })
            .build(),
    );

    tracing::info!(
        "Running {} executions with concurrency {}",
        args.executions,
        args.concurrency
    );

    let started = Instant::now();
    let mut latencies: Vec<f64> = futures::stream::iter(0..args.executions)
        .map(|seq| {
            let commander = Arc::clone(&commander);
            let (category, command_id) = targets[seq % targets.len()].clone();
            let approved = (seq % 100) as u8 >= args.unapproved_rate;
            async move {
                let mut params = Parameters::new();
                params.insert("seq".to_string(), json!(seq));
                params.insert("human_approval".to_string(), json!(approved));
                let begin = Instant::now();
                let result = commander
                    .execute_command(category.as_str(), &command_id, params, None)
                    .await;
                (begin.elapsed().as_secs_f64() * 1000.0, result.is_ok())
            }
        })
        .buffer_unordered(args.concurrency.max(1))
        .filter_map(|(ms, ok)| async move { ok.then_some(ms) })
        .collect()
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    latencies.sort_by(f64::total_cmp);
    let snapshot = metrics.snapshot().await;
    let report = Report {
        executions: args.executions,
        concurrency: args.concurrency,
        elapsed_secs: elapsed,
        throughput_per_sec: if elapsed > 0.0 {
            args.executions as f64 / elapsed
        } else {
            0.0
        },
        by_status: snapshot.by_status,
        latency_ms_p50: percentile(&latencies, 0.50),
        latency_ms_p95: percentile(&latencies, 0.95),
        latency_ms_max: latencies.last().copied().unwrap_or(0.0),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} executions in {:.3}s ({:.0}/s, concurrency {})",
            report.executions,
            report.elapsed_secs,
            report.throughput_per_sec,
            report.concurrency
        );
        for (status, count) in &report.by_status {
            println!("  {status:<10} {count}");
        }
        println!(
            "  latency p50 {:.2}ms  p95 {:.2}ms  max {:.2}ms",
            report.latency_ms_p50, report.latency_ms_p95, report.latency_ms_max
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_picks_nearest_rank() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 0.5), 3.0);
        assert_eq!(percentile(&values, 1.0), 5.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[tokio::test]
    async fn latency_handler_fails_deterministically() {
        let handler = LatencyHandler {
            latency: Duration::ZERO,
            failure_rate: 10,
        };
        let mut params = Parameters::new();
        params.insert("seq".to_string(), json!(5));
        assert!(handler.execute("x", &params, None).await.is_err());
        params.insert("seq".to_string(), json!(50));
        assert!(handler.execute("x", &params, None).await.is_ok());
    }
}
