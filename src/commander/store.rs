//! In-memory execution store.
//!
//! Each record is written only by the invocation that owns it, so the store
//! guards the container, not the records. Terminal records are never
//! overwritten: a late write from an invocation whose record was cancelled
//! meanwhile is dropped and the cancelled record wins.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::commander::execution::Execution;
use crate::commander::sinks::ResourceUsage;

pub const DEFAULT_STORE_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct Inner {
    live: HashMap<Uuid, Execution>,
    order: VecDeque<Uuid>,
    /// Records cleared from the live map by shutdown, still answerable by id.
    retired: HashMap<Uuid, Execution>,
    retired_order: VecDeque<Uuid>,
}

/// Bounded map from execution id to execution record.
#[derive(Debug)]
pub struct ExecutionStore {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl ExecutionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a fresh record. When full, the oldest terminal records are
    /// evicted; live (non-terminal) records are never evicted.
    pub async fn insert(&self, execution: Execution) {
        let mut inner = self.inner.write().await;
        while inner.live.len() >= self.capacity {
            let Some(pos) = inner
                .order
                .iter()
                .position(|id| inner.live.get(id).is_some_and(Execution::is_terminal))
            else {
                tracing::warn!(
                    "Execution store over capacity ({}) with no terminal records to evict",
                    self.capacity
                );
                break;
            };
            if let Some(id) = inner.order.remove(pos) {
                inner.live.remove(&id);
                tracing::debug!("Evicted execution {} from store", id);
            }
        }
        inner.order.push_back(execution.execution_id);
        inner.live.insert(execution.execution_id, execution);
    }

    /// Replace a non-terminal record. Returns false when the stored record is
    /// already terminal or gone.
    pub async fn publish(&self, execution: &Execution) -> bool {
        let mut inner = self.inner.write().await;
        match inner.live.get_mut(&execution.execution_id) {
            Some(existing) if !existing.is_terminal() => {
                *existing = execution.clone();
                true
            }
            _ => false,
        }
    }

    /// Write the owner's terminal record and return the authoritative one.
    ///
    /// If the record was cancelled in the meantime, the cancelled record is
    /// returned and the owner's outcome is discarded.
    pub async fn finish(&self, execution: Execution) -> Execution {
        let mut inner = self.inner.write().await;
        let id = execution.execution_id;
        if let Some(existing) = inner.live.get_mut(&id) {
            if existing.is_terminal() {
                return existing.clone();
            }
            *existing = execution.clone();
            return execution;
        }
        if let Some(retired) = inner.retired.get(&id) {
            return retired.clone();
        }
        execution
    }

    pub async fn get(&self, execution_id: &Uuid) -> Option<Execution> {
        let inner = self.inner.read().await;
        inner
            .live
            .get(execution_id)
            .or_else(|| inner.retired.get(execution_id))
            .cloned()
    }

    /// Every record in the live map, oldest first, whatever its status.
    pub async fn list(&self) -> Vec<Execution> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.live.get(id).cloned())
            .collect()
    }

    /// Cancel one non-terminal record.
    pub async fn cancel(&self, execution_id: &Uuid, usage: ResourceUsage) -> Option<Execution> {
        let mut inner = self.inner.write().await;
        let record = inner.live.get_mut(execution_id)?;
        if !record.cancel() {
            return None;
        }
        record.record_metrics(usage.memory, usage.cpu);
        Some(record.clone())
    }

    /// Cancel every non-terminal record, move the whole live map to the
    /// retired archive and clear it. Returns the records that were cancelled.
    pub async fn cancel_all_and_clear(&self, usage: ResourceUsage) -> Vec<Execution> {
        let mut inner = self.inner.write().await;
        let mut cancelled = Vec::new();
        let order: Vec<Uuid> = inner.order.drain(..).collect();
        for id in order {
            let Some(mut record) = inner.live.remove(&id) else {
                continue;
            };
            if record.cancel() {
                record.record_metrics(usage.memory, usage.cpu);
                cancelled.push(record.clone());
            }
            while inner.retired.len() >= self.capacity {
                match inner.retired_order.pop_front() {
                    Some(old) => {
                        inner.retired.remove(&old);
                    }
                    None => break,
                }
            }
            inner.retired_order.push_back(id);
            inner.retired.insert(id, record);
        }
        inner.live.clear();
        cancelled
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.live.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.live.is_empty()
    }
}

impl Default for ExecutionStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY)
    }
}
