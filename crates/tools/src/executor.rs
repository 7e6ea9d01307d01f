//! Concurrent tool executor
//!
//! Runs batches of independent tool calls against a shared registry. A
//! semaphore sized to the worker budget bounds how many blocking tool calls
//! are in flight; each call runs on tokio's blocking pool. Results are
//! collected by submission index, so completion order never leaks into the
//! returned vector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::registry::ToolRegistry;
use crate::ExecutorError;

/// Worker budget used when none is configured
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// One tool invocation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub tool_name: String,
    pub input_data: String,
}

impl Task {
    pub fn new(tool_name: impl Into<String>, input_data: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            input_data: input_data.into(),
        }
    }
}

/// Executes tool calls concurrently under a fixed worker budget
pub struct ConcurrentExecutor {
    registry: Arc<ToolRegistry>,
    workers: Arc<Semaphore>,
    max_workers: usize,
    shut_down: AtomicBool,
    // Held shared by each running batch; teardown takes it exclusively.
    in_flight: RwLock<()>,
}

impl ConcurrentExecutor {
    /// Create an executor with `max_workers` concurrent slots
    pub fn new(registry: Arc<ToolRegistry>, max_workers: usize) -> Result<Self, ExecutorError> {
        if max_workers == 0
            || max_workers > Semaphore::MAX_PERMITS
            || u32::try_from(max_workers).is_err()
        {
            return Err(ExecutorError::InvalidWorkerBudget(max_workers));
        }

        Ok(Self::with_budget(registry, max_workers))
    }

    /// Create an executor with [`DEFAULT_MAX_WORKERS`] slots
    pub fn with_default_workers(registry: Arc<ToolRegistry>) -> Self {
        Self::with_budget(registry, DEFAULT_MAX_WORKERS)
    }

    fn with_budget(registry: Arc<ToolRegistry>, max_workers: usize) -> Self {
        debug!("◆ EXECUTOR ONLINE WITH {} WORKERS", max_workers);
        Self {
            registry,
            workers: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            shut_down: AtomicBool::new(false),
            in_flight: RwLock::new(()),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn spawn(&self, task: Task) -> JoinHandle<Result<String, ExecutorError>> {
        let registry = Arc::clone(&self.registry);
        let workers = Arc::clone(&self.workers);

        tokio::spawn(async move {
            let _permit = workers
                .acquire_owned()
                .await
                .map_err(|_| ExecutorError::ShutDown)?;

            let call = move || registry.execute(&task.tool_name, &task.input_data);
            tokio::task::spawn_blocking(call)
                .await
                .map_err(|e| ExecutorError::Scheduling {
                    index: 0,
                    message: e.to_string(),
                })
        })
    }

    /// Run one tool call through the worker budget
    pub async fn execute(&self, tool_name: &str, input: &str) -> Result<String, ExecutorError> {
        let mut results = self.execute_batch(&[Task::new(tool_name, input)]).await?;
        results.pop().ok_or(ExecutorError::Scheduling {
            index: 0,
            message: "no result produced".to_string(),
        })
    }

    /// Run every task and return the observations in submission order.
    ///
    /// Tool failures occupy their own slot as error text. An `Err` means the
    /// scheduling layer itself failed and the batch has no usable result.
    pub async fn execute_batch(&self, tasks: &[Task]) -> Result<Vec<String>, ExecutorError> {
        let _in_flight = self.in_flight.read().await;
        if self.is_shut_down() {
            return Err(ExecutorError::ShutDown);
        }

        let batch_id = Uuid::new_v4();
        info!(
            "◆ BATCH {} DISPATCHING {} TASKS ON {} WORKERS",
            batch_id,
            tasks.len(),
            self.max_workers
        );

        let handles: Vec<_> = tasks.iter().cloned().map(|task| self.spawn(task)).collect();

        let mut results = vec![String::new(); handles.len()];
        let mut fault = None;
        for (index, handle) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(ExecutorError::Scheduling { message, .. })) => {
                    Err(ExecutorError::Scheduling { index, message })
                }
                Ok(Err(e)) => Err(e),
                Err(e) => Err(ExecutorError::Scheduling {
                    index,
                    message: e.to_string(),
                }),
            };

            match outcome {
                Ok(output) => results[index] = output,
                Err(e) => {
                    error!("◆ BATCH {} TASK {} FAILED TO SCHEDULE: {}", batch_id, index, e);
                    fault.get_or_insert(e);
                }
            }
        }

        if let Some(e) = fault {
            return Err(e);
        }

        info!("◆ BATCH {} COMPLETE", batch_id);
        Ok(results)
    }

    /// Wait for in-flight work, then release the worker budget.
    ///
    /// Later calls are no-ops. Batches submitted afterwards fail with
    /// [`ExecutorError::ShutDown`].
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        // Batches that passed the shut-down check hold the gate until every
        // task has joined.
        let _gate = self.in_flight.write().await;

        // Tasks detached from a cancelled batch may still hold or await permits.
        if let Ok(permits) = self.workers.acquire_many(self.max_workers as u32).await {
            permits.forget();
        }
        self.workers.close();
        info!("◆ EXECUTOR SHUT DOWN");
    }
}

impl Drop for ConcurrentExecutor {
    fn drop(&mut self) {
        // Blocking calls already started run to completion on their own threads.
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            self.workers.close();
            debug!("◆ EXECUTOR DROPPED");
        }
    }
}
