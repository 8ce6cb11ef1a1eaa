// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Status and health snapshots exposed to dashboards and the CLI `status`
//! command. All types here are read-only views; producing one never mutates
//! the worker it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::worker::{WorkerId, WorkerState};

/// Ordered from best to worst so `max()` yields the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub status_check: bool,
    pub dependency_check: bool,
    pub configuration_check: bool,
}

impl HealthChecks {
    pub fn all_passed(&self) -> bool {
        self.status_check && self.dependency_check && self.configuration_check
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub worker_id: WorkerId,
    pub name: String,
    pub state: WorkerState,
    pub health: HealthState,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

impl HealthReport {
    /// Derive the health verdict from the lifecycle state and check results.
    ///
    /// `Error`/`Stopped` are unhealthy regardless of the checks; a paused
    /// worker or a failed dependency/configuration check degrades.
    pub fn evaluate(state: WorkerState, checks: &HealthChecks) -> HealthState {
        if !checks.status_check {
            return HealthState::Unhealthy;
        }
        if state == WorkerState::Paused || !checks.dependency_check || !checks.configuration_check
        {
            return HealthState::Degraded;
        }
        HealthState::Healthy
    }
}

/// Per-task-type execution counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub total_executed: u64,
    pub successful: u64,
    pub failed: u64,
    pub total_execution_time: f64,
    /// Mean over successful runs only.
    pub average_execution_time: f64,
    pub last_execution_time: f64,
}

impl TaskMetrics {
    pub fn record_success(&mut self, seconds: f64) {
        self.total_executed += 1;
        self.successful += 1;
        self.total_execution_time += seconds;
        self.last_execution_time = seconds;
        self.average_execution_time = self.total_execution_time / self.successful as f64;
    }

    pub fn record_failure(&mut self) {
        self.total_executed += 1;
        self.failed += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub worker_id: WorkerId,
    pub name: String,
    pub version: String,
    pub state: WorkerState,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub metrics: BTreeMap<String, TaskMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Registry-wide health aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthReport {
    pub overall_health: HealthState,
    pub total_workers: usize,
    pub workers: Vec<HealthReport>,
    pub timestamp: DateTime<Utc>,
}

impl SystemHealthReport {
    pub fn from_reports(workers: Vec<HealthReport>) -> Self {
        let overall_health = workers
            .iter()
            .map(|r| r.health)
            .max()
            .unwrap_or(HealthState::Healthy);
        Self {
            overall_health,
            total_workers: workers.len(),
            workers,
            timestamp: Utc::now(),
        }
    }
}
