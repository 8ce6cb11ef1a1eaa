// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pipeline Supervisor
//!
//! Sequences the four-phase content pipeline over the registered swarms:
//!
//! ```text
//! RESEARCH → CONTENT → SAFETY → (DISTRIBUTION | SKIPPED) → DONE
//! ```
//!
//! Each phase builds a task from the previous phase's aggregated result,
//! fans it out to the matching swarm through the [`WorkerRegistry`], and
//! returns a [`PhaseResult`]-style value. An empty swarm is a soft failure
//! reported as data; the run always proceeds to the end.
//!
//! ## Gating
//!
//! Distribution only runs when every safety envelope carries
//! `result.approved == true`. Otherwise no distribution worker is invoked and
//! the phase reports `{skipped: true, reason: "Failed safety validation"}`.
//!
//! Runs are stateless: nothing about a run survives once its report has been
//! returned. The shortcut entry points (`analyze_trends`, `publish_content`)
//! call the same phase functions as the full pipeline.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use chimera_core::application::{RegistryError, WorkerRegistry};
use chimera_core::domain::events::PipelineEvent;
use chimera_core::domain::node_config::PipelineConfig;
use chimera_core::domain::task::{Task, TaskOutcome, TaskType};
use chimera_core::domain::worker::{Worker, WorkerError, WorkerId, WorkerIdentity};
use chimera_core::infrastructure::event_bus::EventBus;

use crate::domain::phase::{
    DistributionResult, PhaseResult, PipelineReport, PublishOutcome, ValidationReport,
    SKIP_REASON_FAILED_VALIDATION,
};
use crate::domain::swarm::{SwarmKind, SwarmMembership};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),
    #[error(transparent)]
    WorkerNotFound(#[from] RegistryError),
    #[error("Failed to serialise phase result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller-supplied research parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Falls back to the pipeline's default timeframe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = Some(timeframe.into());
        self
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            topic: task.get_str("topic").unwrap_or_default().to_string(),
            keywords: task.get_strings("keywords"),
            timeframe: task.get_str("timeframe").map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubagentRegistration {
    pub message: String,
    pub worker_id: WorkerId,
    pub swarm: SwarmKind,
}

pub struct Supervisor {
    identity: WorkerIdentity,
    registry: Arc<WorkerRegistry>,
    swarms: RwLock<SwarmMembership>,
    pipeline: PipelineConfig,
    event_bus: Option<EventBus>,
}

impl Supervisor {
    pub fn new(identity: WorkerIdentity, registry: Arc<WorkerRegistry>) -> Self {
        Self {
            identity,
            registry,
            swarms: RwLock::new(SwarmMembership::new()),
            pipeline: PipelineConfig::default(),
            event_bus: None,
        }
    }

    pub fn with_pipeline_config(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Add `worker` to the registry and to `swarm_name`'s membership.
    ///
    /// There is no swarm-level removal; deregistering from the registry stops
    /// dispatch while the membership entry stays behind.
    pub fn register_subagent(
        &self,
        worker: Arc<dyn Worker>,
        swarm_name: &str,
    ) -> Result<SubagentRegistration, SupervisorError> {
        let swarm: SwarmKind = swarm_name
            .parse()
            .map_err(|e: crate::domain::swarm::UnknownSwarm| {
                SupervisorError::InvalidRegistration(e.to_string())
            })?;

        let worker_id = worker.id().clone();
        if worker_id.as_str().trim().is_empty() {
            return Err(SupervisorError::InvalidRegistration(
                "worker id cannot be empty".to_string(),
            ));
        }
        if worker_id == self.identity.id {
            return Err(SupervisorError::InvalidRegistration(format!(
                "supervisor {} cannot register itself as a subagent",
                worker_id
            )));
        }

        let phase_task = swarm.phase_task_type();
        if !worker.handles(&phase_task) {
            warn!(
                worker_id = %worker_id,
                swarm = %swarm,
                task_type = %phase_task,
                "Worker does not handle the task type dispatched to its swarm"
            );
        }

        let name = worker.identity().display_name.clone();
        self.registry.register(worker);
        let added = self.swarms.write().add(swarm, worker_id.clone());

        info!(worker_id = %worker_id, swarm = %swarm, new_member = added, "Registered {} to {} swarm", name, swarm);

        Ok(SubagentRegistration {
            message: format!("Successfully registered {} to {} swarm", name, swarm),
            worker_id,
            swarm,
        })
    }

    pub fn swarm_members(&self, swarm: SwarmKind) -> Vec<WorkerId> {
        self.swarms.read().members(swarm).to_vec()
    }

    pub fn swarm_overview(&self) -> BTreeMap<SwarmKind, usize> {
        self.swarms.read().counts()
    }

    /// Direct dispatch to one registered worker, bypassing swarms.
    pub async fn dispatch_to_worker(
        &self,
        worker_id: &WorkerId,
        task: &Task,
    ) -> Result<TaskOutcome, SupervisorError> {
        Ok(self.registry.dispatch_one(worker_id, task).await?)
    }

    /// Full pipeline run.
    pub async fn coordinate_content_creation(
        &self,
        request: &ResearchRequest,
    ) -> Result<PipelineReport, SupervisorError> {
        info!(topic = %request.topic, keywords = ?request.keywords, "Starting content creation coordination");
        metrics::counter!("chimera_pipeline_runs_total").increment(1);

        let research_results = self.research_phase(request).await;
        let content_results = self.content_phase(&research_results).await?;
        let content_data = serde_json::to_value(&content_results)?;
        let validation_results = self.safety_phase(content_data.clone()).await;
        let distribution_results = self
            .distribution_phase(&validation_results, content_data)
            .await;

        self.publish(PipelineEvent::PipelineCompleted {
            topic: request.topic.clone(),
            content_passed_validation: validation_results.content_passed_validation,
            completed_at: Utc::now(),
        });
        info!(
            topic = %request.topic,
            content_passed_validation = validation_results.content_passed_validation,
            "Content creation coordination finished"
        );

        Ok(PipelineReport {
            research_results,
            content_results,
            validation_results,
            distribution_results,
            workflow_completed: true,
        })
    }

    /// RESEARCH phase on its own.
    pub async fn analyze_trends(&self, request: &ResearchRequest) -> PhaseResult {
        info!(topic = %request.topic, "Analyzing trends");
        self.research_phase(request).await
    }

    /// SAFETY + DISTRIBUTION tail on caller-supplied content.
    pub async fn publish_content(&self, content_data: Value) -> PublishOutcome {
        info!("Publishing content");
        let validation = self.safety_phase(content_data.clone()).await;
        if !validation.content_passed_validation {
            warn!("Content did not pass validation, not publishing");
            return PublishOutcome::rejected();
        }
        PublishOutcome::Distributed(self.distribution_phase(&validation, content_data).await)
    }

    async fn research_phase(&self, request: &ResearchRequest) -> PhaseResult {
        let timeframe = request
            .timeframe
            .clone()
            .unwrap_or_else(|| self.pipeline.default_timeframe.clone());
        let task = Task::timestamped(SwarmKind::Research.as_str(), TaskType::AnalyzeTrends)
            .with("topic", request.topic.as_str())
            .with("keywords", request.keywords.clone())
            .with("timeframe", timeframe);

        match self.run_swarm(SwarmKind::Research, &task).await {
            Some(results) => PhaseResult::Ran {
                results,
                phase: SwarmKind::Research,
            },
            None => PhaseResult::unavailable(SwarmKind::Research),
        }
    }

    async fn content_phase(&self, research: &PhaseResult) -> Result<PhaseResult, SupervisorError> {
        let task = Task::timestamped(SwarmKind::Content.as_str(), TaskType::GenerateContent)
            .with("research_data", serde_json::to_value(research)?)
            .with("content_type", self.pipeline.content_type.as_str())
            .with("platform", self.pipeline.content_platform.as_str());

        Ok(match self.run_swarm(SwarmKind::Content, &task).await {
            Some(results) => PhaseResult::Ran {
                results,
                phase: SwarmKind::Content,
            },
            None => PhaseResult::unavailable(SwarmKind::Content),
        })
    }

    async fn safety_phase(&self, content_data: Value) -> ValidationReport {
        let task = Task::timestamped(SwarmKind::Safety.as_str(), TaskType::ValidateContent)
            .with("content_data", content_data)
            .with("policy_check", self.pipeline.policy_check)
            .with("human_approval_required", self.pipeline.human_approval_required);

        match self.run_swarm(SwarmKind::Safety, &task).await {
            Some(results) => {
                let report = ValidationReport::from_outcomes(results);
                info!(
                    phase = "safety",
                    content_passed_validation = report.content_passed_validation,
                    "Safety verdict"
                );
                report
            }
            None => ValidationReport::unavailable(),
        }
    }

    async fn distribution_phase(
        &self,
        validation: &ValidationReport,
        content_data: Value,
    ) -> DistributionResult {
        if !validation.content_passed_validation {
            warn!(phase = "distribution", "Content did not pass safety validation, skipping distribution");
            metrics::counter!(
                "chimera_phase_skipped_total",
                "phase" => "distribution",
                "reason" => "failed_validation"
            )
            .increment(1);
            self.publish(PipelineEvent::PhaseSkipped {
                phase: SwarmKind::Distribution.to_string(),
                reason: SKIP_REASON_FAILED_VALIDATION.to_string(),
                skipped_at: Utc::now(),
            });
            return DistributionResult::skipped_failed_validation();
        }

        let task = Task::timestamped(SwarmKind::Distribution.as_str(), TaskType::PublishContent)
            .with("content_data", content_data)
            .with("platforms", json!(self.pipeline.default_platforms))
            .with("schedule_immediate", true);

        match self.run_swarm(SwarmKind::Distribution, &task).await {
            Some(results) => DistributionResult::published(results),
            None => DistributionResult::unavailable(),
        }
    }

    /// Fan `task` out to the current members of `swarm`. `None` when no member
    /// is still registered.
    async fn run_swarm(&self, swarm: SwarmKind, task: &Task) -> Option<Vec<TaskOutcome>> {
        let members: Vec<WorkerId> = self
            .swarm_members(swarm)
            .into_iter()
            .filter(|id| self.registry.contains(id))
            .collect();

        if members.is_empty() {
            warn!(phase = %swarm, "No {} agents registered", swarm);
            metrics::counter!(
                "chimera_phase_skipped_total",
                "phase" => swarm.as_str(),
                "reason" => "no_workers"
            )
            .increment(1);
            self.publish(PipelineEvent::PhaseUnavailable {
                phase: swarm.to_string(),
                reason: swarm.unavailable_message(),
                reported_at: Utc::now(),
            });
            return None;
        }

        info!(phase = %swarm, task_id = %task.task_id, swarm_size = members.len(), "Executing {} phase", swarm);
        self.publish(PipelineEvent::PhaseStarted {
            phase: swarm.to_string(),
            task_id: task.task_id.clone(),
            target_workers: members.len(),
            started_at: Utc::now(),
        });

        let results = self.registry.dispatch_to(task, &members).await;

        self.publish(PipelineEvent::PhaseCompleted {
            phase: swarm.to_string(),
            task_id: task.task_id.clone(),
            envelope_count: results.len(),
            completed_at: Utc::now(),
        });
        Some(results)
    }

    fn publish(&self, event: PipelineEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_pipeline_event(event);
        }
    }
}

#[async_trait]
impl Worker for Supervisor {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![
            TaskType::CoordinateContentCreation,
            TaskType::AnalyzeTrends,
            TaskType::PublishContent,
        ]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        info!(task_type = %task.task_type, task_id = %task.task_id, "Supervisor executing task");
        let to_value = |r: Result<Value, serde_json::Error>| {
            r.map_err(|e| WorkerError::HandlerFailed(e.to_string()))
        };

        match &task.task_type {
            TaskType::CoordinateContentCreation => {
                let report = self
                    .coordinate_content_creation(&ResearchRequest::from_task(task))
                    .await
                    .map_err(|e| WorkerError::HandlerFailed(e.to_string()))?;
                to_value(serde_json::to_value(report))
            }
            TaskType::AnalyzeTrends => {
                let phase = self.analyze_trends(&ResearchRequest::from_task(task)).await;
                to_value(serde_json::to_value(phase))
            }
            TaskType::PublishContent => {
                let content = task
                    .get("content_data")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(task.payload.clone()));
                let outcome = self.publish_content(content).await;
                to_value(serde_json::to_value(outcome))
            }
            other => Err(WorkerError::UnknownTaskType(other.to_string())),
        }
    }
}
