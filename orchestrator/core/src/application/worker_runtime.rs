// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Worker Runtime
//!
//! [`WorkerRuntime`] wraps any [`Worker`] with lifecycle bookkeeping: state
//! transitions, timestamps, per-task-type metrics, error capture, structured
//! logs and (optionally) domain events.
//!
//! `process()` is the failure boundary of the system. Whatever the handler
//! does (returns an error, rejects the task type, panics) the caller receives
//! a well-formed [`TaskOutcome`], and `last_updated` is refreshed on exit.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::events::WorkerEvent;
use crate::domain::health::{HealthChecks, HealthReport, StatusSnapshot, TaskMetrics};
use crate::domain::task::{Task, TaskOutcome};
use crate::domain::worker::{Worker, WorkerError, WorkerId, WorkerState};
use crate::infrastructure::event_bus::EventBus;

/// Configuration keys every runtime must carry to pass `configuration_check`.
pub const REQUIRED_CONFIG_KEYS: [&str; 3] = ["worker_id", "name", "version"];

struct RuntimeState {
    state: WorkerState,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    metrics: BTreeMap<String, TaskMetrics>,
    last_error: Option<String>,
    config: Map<String, Value>,
}

pub struct WorkerRuntime<W: Worker + ?Sized = dyn Worker> {
    worker: Arc<W>,
    inner: Mutex<RuntimeState>,
    event_bus: Option<EventBus>,
}

impl<W: Worker + ?Sized> WorkerRuntime<W> {
    pub fn new(worker: Arc<W>) -> Self {
        let now = Utc::now();
        let mut config = Map::new();
        config.insert("worker_id".into(), Value::from(worker.id().as_str()));
        config.insert("name".into(), Value::from(worker.identity().display_name.as_str()));
        config.insert("version".into(), Value::from(worker.version()));

        Self {
            worker,
            inner: Mutex::new(RuntimeState {
                state: WorkerState::Idle,
                created_at: now,
                last_updated: now,
                metrics: BTreeMap::new(),
                last_error: None,
                config,
            }),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn worker(&self) -> &Arc<W> {
        &self.worker
    }

    pub fn id(&self) -> &WorkerId {
        self.worker.id()
    }

    pub fn state(&self) -> WorkerState {
        self.inner.lock().state
    }

    /// Run one task through the wrapped worker. Never fails.
    pub async fn process(&self, task: &Task) -> TaskOutcome {
        let worker_id = self.worker.id().clone();

        let previous = {
            let mut inner = self.inner.lock();
            inner.last_updated = Utc::now();
            if !inner.state.accepts_work() {
                let state = inner.state;
                drop(inner);
                return self.reject(task, state);
            }
            std::mem::replace(&mut inner.state, WorkerState::Working)
        };

        self.publish_state_change(previous, WorkerState::Working);
        self.publish(WorkerEvent::TaskStarted {
            worker_id: worker_id.clone(),
            task_id: task.task_id.clone(),
            task_type: task.task_type.clone(),
            started_at: Utc::now(),
        });
        debug!(
            worker_id = %worker_id,
            task_id = %task.task_id,
            task_type = %task.task_type,
            "Processing task"
        );

        let started = Instant::now();
        let result = if self.worker.handles(&task.task_type) {
            let handler = AssertUnwindSafe(self.worker.handle(task)).catch_unwind();
            let caught = match self.worker.deadline() {
                Some(limit) => tokio::time::timeout(limit, handler).await.unwrap_or_else(|_| {
                    Ok(Err(WorkerError::Timeout(format!(
                        "{} exceeded {}ms",
                        task.task_type,
                        limit.as_millis()
                    ))))
                }),
                None => handler.await,
            };
            caught.unwrap_or_else(|_| Err(WorkerError::HandlerFailed("handler panicked".to_string())))
        } else {
            Err(WorkerError::UnknownTaskType(task.task_type.to_string()))
        };
        let elapsed = started.elapsed().as_secs_f64();

        self.finish(task, result, elapsed)
    }

    fn finish(&self, task: &Task, result: Result<Value, WorkerError>, elapsed: f64) -> TaskOutcome {
        let worker_id = self.worker.id().clone();
        let task_key = task.task_type.to_string();
        let next = if result.is_ok() {
            WorkerState::Completed
        } else {
            WorkerState::Error
        };

        let transitioned = {
            let mut inner = self.inner.lock();
            let metrics = inner.metrics.entry(task_key).or_default();
            match &result {
                Ok(_) => metrics.record_success(elapsed),
                Err(_) => metrics.record_failure(),
            }
            if let Err(e) = &result {
                inner.last_error = Some(e.to_string());
            }
            inner.last_updated = Utc::now();
            // pause()/stop() issued mid-task win over the natural transition
            if inner.state == WorkerState::Working {
                inner.state = next;
                true
            } else {
                false
            }
        };
        if transitioned {
            self.publish_state_change(WorkerState::Working, next);
        }

        match result {
            Ok(value) => {
                metrics::counter!(
                    "chimera_worker_tasks_total",
                    "worker" => worker_id.to_string(),
                    "status" => "success"
                )
                .increment(1);
                metrics::histogram!(
                    "chimera_worker_task_duration_seconds",
                    "worker" => worker_id.to_string()
                )
                .record(elapsed);
                info!(
                    worker_id = %worker_id,
                    task_id = %task.task_id,
                    task_type = %task.task_type,
                    status = "success",
                    execution_time_seconds = elapsed,
                    "Task completed"
                );
                self.publish(WorkerEvent::TaskCompleted {
                    worker_id: worker_id.clone(),
                    task_id: task.task_id.clone(),
                    task_type: task.task_type.clone(),
                    execution_time_seconds: elapsed,
                    completed_at: Utc::now(),
                });
                TaskOutcome::success(worker_id, &task.task_id, value, elapsed)
            }
            Err(e) => {
                metrics::counter!(
                    "chimera_worker_tasks_total",
                    "worker" => worker_id.to_string(),
                    "status" => "error"
                )
                .increment(1);
                error!(
                    worker_id = %worker_id,
                    task_id = %task.task_id,
                    task_type = %task.task_type,
                    status = "error",
                    error = %e,
                    "Task failed"
                );
                self.publish(WorkerEvent::TaskFailed {
                    worker_id: worker_id.clone(),
                    task_id: task.task_id.clone(),
                    task_type: task.task_type.clone(),
                    error: e.to_string(),
                    failed_at: Utc::now(),
                });
                TaskOutcome::failure(worker_id, &task.task_id, e.to_string(), elapsed)
            }
        }
    }

    fn reject(&self, task: &Task, state: WorkerState) -> TaskOutcome {
        let worker_id = self.worker.id().clone();
        metrics::counter!(
            "chimera_worker_tasks_total",
            "worker" => worker_id.to_string(),
            "status" => "rejected"
        )
        .increment(1);
        warn!(
            worker_id = %worker_id,
            task_id = %task.task_id,
            task_type = %task.task_type,
            state = %state,
            "Task rejected, worker not accepting work"
        );
        self.publish(WorkerEvent::TaskRejected {
            worker_id: worker_id.clone(),
            task_id: task.task_id.clone(),
            state,
            rejected_at: Utc::now(),
        });
        TaskOutcome::failure(
            worker_id.clone(),
            &task.task_id,
            format!("Worker {} is {} and not accepting tasks", worker_id, state),
            0.0,
        )
    }

    /// Suspend dispatch. No effect on a stopped worker.
    pub fn pause(&self) -> WorkerState {
        self.force_state(|s| (s != WorkerState::Stopped).then_some(WorkerState::Paused))
    }

    /// Return a paused worker to `Idle`. Only valid from `Paused`.
    pub fn resume(&self) -> WorkerState {
        self.force_state(|s| (s == WorkerState::Paused).then_some(WorkerState::Idle))
    }

    /// Move to the terminal `Stopped` state.
    pub fn stop(&self) -> WorkerState {
        self.force_state(|_| Some(WorkerState::Stopped))
    }

    fn force_state(&self, rule: impl FnOnce(WorkerState) -> Option<WorkerState>) -> WorkerState {
        let (from, to) = {
            let mut inner = self.inner.lock();
            let from = inner.state;
            match rule(from) {
                Some(to) => {
                    inner.state = to;
                    inner.last_updated = Utc::now();
                    (from, to)
                }
                None => return from,
            }
        };
        if from != to {
            info!(worker_id = %self.worker.id(), from = %from, to = %to, "Worker state forced");
            self.publish_state_change(from, to);
        }
        to
    }

    /// Merge keys into the runtime configuration map.
    pub fn update_config(&self, updates: Map<String, Value>) {
        let mut inner = self.inner.lock();
        inner.config.extend(updates);
        inner.last_updated = Utc::now();
    }

    pub fn config(&self) -> Map<String, Value> {
        self.inner.lock().config.clone()
    }

    pub fn status(&self) -> StatusSnapshot {
        let inner = self.inner.lock();
        StatusSnapshot {
            worker_id: self.worker.id().clone(),
            name: self.worker.identity().display_name.clone(),
            version: self.worker.version().to_string(),
            state: inner.state,
            created_at: inner.created_at,
            last_updated: inner.last_updated,
            metrics: inner.metrics.clone(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Health snapshot. `is_registered` resolves declared dependencies.
    pub fn health_check(&self, is_registered: &dyn Fn(&WorkerId) -> bool) -> HealthReport {
        let (state, configuration_check) = {
            let inner = self.inner.lock();
            let configured = REQUIRED_CONFIG_KEYS
                .iter()
                .all(|k| inner.config.contains_key(*k));
            (inner.state, configured)
        };
        let checks = HealthChecks {
            status_check: !matches!(state, WorkerState::Error | WorkerState::Stopped),
            dependency_check: self.worker.dependencies().iter().all(is_registered),
            configuration_check,
        };

        HealthReport {
            worker_id: self.worker.id().clone(),
            name: self.worker.identity().display_name.clone(),
            state,
            health: HealthReport::evaluate(state, &checks),
            timestamp: Utc::now(),
            checks,
        }
    }

    fn publish_state_change(&self, from: WorkerState, to: WorkerState) {
        self.publish(WorkerEvent::StateChanged {
            worker_id: self.worker.id().clone(),
            from,
            to,
            changed_at: Utc::now(),
        });
    }

    fn publish(&self, event: WorkerEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_worker_event(event);
        }
    }
}
