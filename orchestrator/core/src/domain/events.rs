// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::task::TaskType;
use crate::domain::worker::{WorkerId, WorkerState};

/// Worker lifecycle events emitted by the runtime wrapper around every dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerEvent {
    TaskStarted {
        worker_id: WorkerId,
        task_id: String,
        task_type: TaskType,
        started_at: DateTime<Utc>,
    },
    TaskCompleted {
        worker_id: WorkerId,
        task_id: String,
        task_type: TaskType,
        execution_time_seconds: f64,
        completed_at: DateTime<Utc>,
    },
    TaskFailed {
        worker_id: WorkerId,
        task_id: String,
        task_type: TaskType,
        error: String,
        failed_at: DateTime<Utc>,
    },
    /// Task refused without invoking the handler (paused or stopped worker).
    TaskRejected {
        worker_id: WorkerId,
        task_id: String,
        state: WorkerState,
        rejected_at: DateTime<Utc>,
    },
    StateChanged {
        worker_id: WorkerId,
        from: WorkerState,
        to: WorkerState,
        changed_at: DateTime<Utc>,
    },
}

impl WorkerEvent {
    pub fn worker_id(&self) -> &WorkerId {
        match self {
            WorkerEvent::TaskStarted { worker_id, .. }
            | WorkerEvent::TaskCompleted { worker_id, .. }
            | WorkerEvent::TaskFailed { worker_id, .. }
            | WorkerEvent::TaskRejected { worker_id, .. }
            | WorkerEvent::StateChanged { worker_id, .. } => worker_id,
        }
    }
}

/// Supervisor pipeline progress events. `phase` is the phase name
/// (`research`, `content`, `safety`, `distribution`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    PhaseStarted {
        phase: String,
        task_id: String,
        target_workers: usize,
        started_at: DateTime<Utc>,
    },
    PhaseCompleted {
        phase: String,
        task_id: String,
        envelope_count: usize,
        completed_at: DateTime<Utc>,
    },
    /// The phase's swarm had no members.
    PhaseUnavailable {
        phase: String,
        reason: String,
        reported_at: DateTime<Utc>,
    },
    PhaseSkipped {
        phase: String,
        reason: String,
        skipped_at: DateTime<Utc>,
    },
    PipelineCompleted {
        topic: String,
        content_passed_validation: bool,
        completed_at: DateTime<Utc>,
    },
}

impl PipelineEvent {
    pub fn phase(&self) -> Option<&str> {
        match self {
            PipelineEvent::PhaseStarted { phase, .. }
            | PipelineEvent::PhaseCompleted { phase, .. }
            | PipelineEvent::PhaseUnavailable { phase, .. }
            | PipelineEvent::PhaseSkipped { phase, .. } => Some(phase),
            PipelineEvent::PipelineCompleted { .. } => None,
        }
    }
}
