// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Worker Capability
//!
//! A [`Worker`] is the smallest unit of pipeline logic: it declares the task
//! types it handles and exposes one async entry point. Lifecycle bookkeeping
//! (state, timing, metrics) is not the worker's concern; it is layered on by
//! composition in [`crate::application::worker_runtime::WorkerRuntime`].
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──process──▶ Working ──ok──▶ Completed ──process──▶ Working ...
//!                      └──err──▶ Error ──process──▶ Working ...
//! any ──pause()──▶ Paused ──resume()──▶ Idle
//! any ──stop()───▶ Stopped   (terminal)
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::domain::task::{Task, TaskType};

/// Unique, immutable worker identifier.
///
/// Ids are chosen by whoever constructs the worker; nothing in the core looks a
/// worker up by a well-known default id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub id: WorkerId,
    pub display_name: String,
}

impl WorkerIdentity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: WorkerId::new(id),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Idle,
    Working,
    /// Externally forced; dispatch is rejected until `resume()`.
    Paused,
    Error,
    Completed,
    /// Terminal. Only reachable through `stop()`.
    Stopped,
}

impl WorkerState {
    /// Whether a new task may move the worker into `Working`.
    pub fn accepts_work(&self) -> bool {
        matches!(
            self,
            WorkerState::Idle | WorkerState::Completed | WorkerState::Error | WorkerState::Working
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Idle => "idle",
            WorkerState::Working => "working",
            WorkerState::Paused => "paused",
            WorkerState::Error => "error",
            WorkerState::Completed => "completed",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkerError {
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Handler failed: {0}")]
    HandlerFailed(String),
    #[error("Timed out: {0}")]
    Timeout(String),
}

/// Capability interface every pipeline worker implements.
#[async_trait]
pub trait Worker: Send + Sync {
    fn identity(&self) -> &WorkerIdentity;

    /// Handler set. A task whose type is not listed here is rejected before
    /// [`Worker::handle`] is called.
    fn task_types(&self) -> Vec<TaskType>;

    /// Other workers that must be registered for this one to report healthy.
    fn dependencies(&self) -> Vec<WorkerId> {
        Vec::new()
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Upper bound on a single [`Worker::handle`] call. Exceeding it yields
    /// [`WorkerError::Timeout`]. `None` means no deadline.
    fn deadline(&self) -> Option<Duration> {
        None
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError>;

    fn id(&self) -> &WorkerId {
        &self.identity().id
    }

    fn handles(&self, task_type: &TaskType) -> bool {
        self.task_types().contains(task_type)
    }
}
