//! Worker process contracts.
//!
//! - [`WorkerInvoker`]: runs the short-lived chat worker once per message.
//! - [`WorkerSupervisor`]: owns the long-running background workers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::{ChatRequest, InvocationOutcome};
use crate::error::Result;

/// Runs the one-shot chat worker.
///
/// Implementations never fail: every problem (spawn failure, timeout, bad
/// exit) is reported through [`InvocationOutcome`].
#[async_trait]
pub trait WorkerInvoker: Send + Sync {
    async fn invoke(&self, request: &ChatRequest) -> InvocationOutcome;
}

/// Lifecycle of a supervised background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkerStatus {
    NotStarted,
    Running { pid: Option<u32> },
    Stopped,
}

impl WorkerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, WorkerStatus::Running { .. })
    }
}

/// Starts, stops and monitors long-running workers by role name.
///
/// At most one instance per role is tracked at a time.
#[async_trait]
pub trait WorkerSupervisor: Send + Sync {
    /// Starts the worker for `role` unless it is already running.
    async fn start(&self, role: &str) -> Result<WorkerStatus>;

    /// Stops the worker for `role`. Returns whether a running worker was stopped.
    async fn stop(&self, role: &str) -> Result<bool>;

    /// Current status of `role`.
    async fn status(&self, role: &str) -> WorkerStatus;

    /// Stops every tracked worker. Failures are logged, not returned.
    async fn stop_all(&self);
}
