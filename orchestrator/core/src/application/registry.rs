// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Worker Registry
//!
//! Process-wide store of [`WorkerRuntime`]s keyed by [`WorkerId`], kept in
//! registration order.
//!
//! ## Dispatch
//!
//! | Operation | Missing target | Ordering |
//! |-----------|----------------|----------|
//! | [`WorkerRegistry::dispatch_one`] | `RegistryError::WorkerNotFound` | n/a |
//! | [`WorkerRegistry::dispatch_broadcast`] | empty `Vec` | registration order, sequential |
//!
//! ## Concurrency
//!
//! The worker list sits behind a `parking_lot::RwLock`. Dispatch takes a
//! copy of the matching `Arc`s and releases the lock before awaiting any
//! worker, so a concurrent `register`/`deregister` never interleaves with a
//! half-iterated list and never blocks on a slow handler.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::health::{StatusSnapshot, SystemHealthReport};
use crate::domain::task::{Task, TaskOutcome};
use crate::domain::worker::{Worker, WorkerId};
use crate::application::worker_runtime::WorkerRuntime;
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Worker not found: {0}")]
    WorkerNotFound(WorkerId),
}

#[derive(Default)]
pub struct WorkerRegistry {
    workers: RwLock<Vec<Arc<WorkerRuntime>>>,
    event_bus: Option<EventBus>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtimes created by this registry publish lifecycle events on `event_bus`.
    pub fn with_event_bus(event_bus: EventBus) -> Self {
        Self {
            workers: RwLock::new(Vec::new()),
            event_bus: Some(event_bus),
        }
    }

    /// Wrap and add a worker. Re-registering an id replaces the previous
    /// runtime in place (last write wins, position kept).
    pub fn register(&self, worker: Arc<dyn Worker>) -> Arc<WorkerRuntime> {
        let mut runtime = WorkerRuntime::new(worker);
        if let Some(bus) = &self.event_bus {
            runtime = runtime.with_event_bus(bus.clone());
        }
        let runtime = Arc::new(runtime);
        let worker_id = runtime.id().clone();

        let mut workers = self.workers.write();
        match workers.iter().position(|w| w.id() == &worker_id) {
            Some(index) => {
                workers[index] = runtime.clone();
                info!(worker_id = %worker_id, "Replaced registered worker");
            }
            None => {
                workers.push(runtime.clone());
                info!(worker_id = %worker_id, total = workers.len(), "Registered worker");
            }
        }
        runtime
    }

    /// Remove a worker. Absent ids are a no-op.
    pub fn deregister(&self, worker_id: &WorkerId) -> Option<Arc<WorkerRuntime>> {
        let mut workers = self.workers.write();
        let index = workers.iter().position(|w| w.id() == worker_id)?;
        info!(worker_id = %worker_id, "Deregistered worker");
        Some(workers.remove(index))
    }

    pub fn get(&self, worker_id: &WorkerId) -> Option<Arc<WorkerRuntime>> {
        self.workers
            .read()
            .iter()
            .find(|w| w.id() == worker_id)
            .cloned()
    }

    pub fn contains(&self, worker_id: &WorkerId) -> bool {
        self.workers.read().iter().any(|w| w.id() == worker_id)
    }

    pub fn len(&self) -> usize {
        self.workers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.read().is_empty()
    }

    /// Registered ids in registration order.
    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.read().iter().map(|w| w.id().clone()).collect()
    }

    pub async fn dispatch_one(
        &self,
        worker_id: &WorkerId,
        task: &Task,
    ) -> Result<TaskOutcome, RegistryError> {
        let runtime = self
            .get(worker_id)
            .ok_or_else(|| RegistryError::WorkerNotFound(worker_id.clone()))?;
        debug!(worker_id = %worker_id, task_id = %task.task_id, task_type = %task.task_type, "Dispatching task");
        Ok(runtime.process(task).await)
    }

    /// Run `task` on every worker accepted by `predicate`, one at a time in
    /// registration order. An empty result means no worker was eligible.
    pub async fn dispatch_broadcast<P>(&self, task: &Task, predicate: P) -> Vec<TaskOutcome>
    where
        P: Fn(&WorkerRuntime) -> bool,
    {
        let targets: Vec<Arc<WorkerRuntime>> = self
            .workers
            .read()
            .iter()
            .filter(|w| predicate(w.as_ref()))
            .cloned()
            .collect();

        debug!(
            task_id = %task.task_id,
            task_type = %task.task_type,
            targets = targets.len(),
            "Broadcasting task"
        );

        let mut outcomes = Vec::with_capacity(targets.len());
        for runtime in targets {
            outcomes.push(runtime.process(task).await);
        }
        outcomes
    }

    pub async fn broadcast_all(&self, task: &Task) -> Vec<TaskOutcome> {
        self.dispatch_broadcast(task, |_| true).await
    }

    /// Broadcast restricted to `members`, still in registration order.
    pub async fn dispatch_to(&self, task: &Task, members: &[WorkerId]) -> Vec<TaskOutcome> {
        let members: HashSet<&WorkerId> = members.iter().collect();
        self.dispatch_broadcast(task, |w| members.contains(w.id())).await
    }

    pub fn all_statuses(&self) -> HashMap<WorkerId, StatusSnapshot> {
        self.workers
            .read()
            .iter()
            .map(|w| (w.id().clone(), w.status()))
            .collect()
    }

    pub fn perform_health_check(&self) -> SystemHealthReport {
        let workers = self.workers.read().clone();
        let registered: HashSet<WorkerId> = workers.iter().map(|w| w.id().clone()).collect();
        let is_registered = |id: &WorkerId| registered.contains(id);

        let reports = workers
            .iter()
            .map(|w| w.health_check(&is_registered))
            .collect();
        SystemHealthReport::from_reports(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::HealthState;
    use crate::domain::task::TaskType;
    use crate::domain::worker::{WorkerError, WorkerIdentity};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct TaggedWorker {
        identity: WorkerIdentity,
        tag: &'static str,
        deps: Vec<WorkerId>,
    }

    impl TaggedWorker {
        fn arc(id: &str, tag: &'static str) -> Arc<dyn Worker> {
            Arc::new(Self {
                identity: WorkerIdentity::new(id, id),
                tag,
                deps: vec![],
            })
        }
    }

    #[async_trait]
    impl Worker for TaggedWorker {
        fn identity(&self) -> &WorkerIdentity {
            &self.identity
        }

        fn task_types(&self) -> Vec<TaskType> {
            vec![TaskType::AnalyzeTrends]
        }

        fn dependencies(&self) -> Vec<WorkerId> {
            self.deps.clone()
        }

        async fn handle(&self, _task: &Task) -> Result<Value, WorkerError> {
            Ok(json!({ "tag": self.tag }))
        }
    }

    #[test]
    fn test_dispatch_one_unknown_worker() {
        let registry = WorkerRegistry::new();
        let task = Task::new("t", TaskType::AnalyzeTrends);
        let err = tokio_test::block_on(registry.dispatch_one(&WorkerId::new("ghost"), &task))
            .unwrap_err();
        assert_eq!(err, RegistryError::WorkerNotFound(WorkerId::new("ghost")));
        assert_eq!(err.to_string(), "Worker not found: ghost");
    }

    #[tokio::test]
    async fn test_deregister_absent_is_noop() {
        let registry = WorkerRegistry::new();
        registry.register(TaggedWorker::arc("a", "a"));
        assert!(registry.deregister(&WorkerId::new("missing")).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.deregister(&WorkerId::new("a")).is_some());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_replacement_keeps_position() {
        let registry = WorkerRegistry::new();
        registry.register(TaggedWorker::arc("a", "first"));
        registry.register(TaggedWorker::arc("b", "b"));
        registry.register(TaggedWorker::arc("a", "second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.worker_ids(), vec![WorkerId::new("a"), WorkerId::new("b")]);

        let outcome = registry
            .dispatch_one(&WorkerId::new("a"), &Task::new("t", TaskType::AnalyzeTrends))
            .await
            .unwrap();
        assert_eq!(outcome.result, Some(json!({"tag": "second"})));
    }

    #[tokio::test]
    async fn test_dispatch_to_members_only() {
        let registry = WorkerRegistry::new();
        for id in ["a", "b", "c"] {
            registry.register(TaggedWorker::arc(id, id));
        }
        let outcomes = registry
            .dispatch_to(
                &Task::new("t", TaskType::AnalyzeTrends),
                &[WorkerId::new("c"), WorkerId::new("a")],
            )
            .await;
        let ids: Vec<_> = outcomes.iter().map(|o| o.worker_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_health_check_resolves_dependencies_against_registry() {
        let registry = WorkerRegistry::new();
        registry.register(Arc::new(TaggedWorker {
            identity: WorkerIdentity::new("writer", "Writer"),
            tag: "w",
            deps: vec![WorkerId::new("fetcher")],
        }));

        let report = registry.perform_health_check();
        assert_eq!(report.total_workers, 1);
        assert_eq!(report.overall_health, HealthState::Degraded);

        registry.register(TaggedWorker::arc("fetcher", "f"));
        let report = registry.perform_health_check();
        assert_eq!(report.overall_health, HealthState::Healthy);
    }
}
