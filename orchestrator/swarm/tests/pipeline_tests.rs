// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for supervisor phase sequencing.
//!
//! Workers are scripted mocks that return a fixed payload and record every
//! task they receive, so the tests can assert both the aggregate report and
//! which swarms were (or were not) dispatched to.

use async_trait::async_trait;
use chimera_core::application::WorkerRegistry;
use chimera_core::domain::node_config::{MonitoringConfig, PipelineConfig};
use chimera_core::domain::task::{Task, TaskType};
use chimera_core::domain::worker::{Worker, WorkerError, WorkerId, WorkerIdentity};
use chimera_core::infrastructure::event_bus::{DomainEvent, EventBus};
use chimera_core::domain::events::PipelineEvent;
use chimera_swarm::application::{MonitorStart, ResearchRequest, Supervisor, TrendMonitor};
use chimera_swarm::domain::{DistributionResult, PhaseResult, PublishOutcome, SwarmKind};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct ScriptedWorker {
    identity: WorkerIdentity,
    task_type: TaskType,
    response: Value,
    received: Arc<Mutex<Vec<Task>>>,
}

impl ScriptedWorker {
    fn new(id: &str, task_type: TaskType, response: Value) -> Self {
        Self {
            identity: WorkerIdentity::new(id, id),
            task_type,
            response,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![self.task_type.clone()]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        self.received.lock().await.push(task.clone());
        Ok(self.response.clone())
    }
}

fn supervisor() -> Supervisor {
    Supervisor::new(
        WorkerIdentity::new("supervisor_001", "SupervisorAgent"),
        Arc::new(WorkerRegistry::new()),
    )
}

/// Registers a scripted worker and hands back its call log.
fn add(sup: &Supervisor, swarm: &str, id: &str, response: Value) -> Arc<Mutex<Vec<Task>>> {
    let kind: SwarmKind = swarm.parse().unwrap();
    let worker = ScriptedWorker::new(id, kind.phase_task_type(), response);
    let received = worker.received.clone();
    sup.register_subagent(Arc::new(worker), swarm).unwrap();
    received
}

#[tokio::test]
async fn test_analyze_trends_returns_research_payload_verbatim() {
    let sup = supervisor();
    let payload = json!({"fetched_trends": [{"keyword": "AI", "volume": 9000}]});
    add(&sup, "research", "trend_fetcher", payload.clone());

    let phase = sup
        .analyze_trends(&ResearchRequest::new("AI").with_keywords(["AI"]))
        .await;

    let results = phase.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].result.as_ref(), Some(&payload));
    assert_eq!(
        serde_json::to_value(&phase).unwrap()["phase"],
        json!("research")
    );
}

#[tokio::test]
async fn test_pipeline_without_safety_workers_skips_distribution() {
    let sup = supervisor();
    add(&sup, "research", "fetcher", json!({"fetched_trends": []}));
    add(&sup, "content", "writer", json!({"title": "Guide to AI"}));
    let distribution_calls = add(&sup, "distribution", "publisher", json!({"ok": true}));

    let report = sup
        .coordinate_content_creation(&ResearchRequest::new("AI"))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&report.validation_results).unwrap(),
        json!({"error": "No safety agents available", "content_passed_validation": false})
    );
    assert_eq!(
        serde_json::to_value(&report.distribution_results).unwrap(),
        json!({"skipped": true, "reason": "Failed safety validation"})
    );
    assert!(report.workflow_completed);
    assert!(distribution_calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_one_rejection_fails_validation() {
    let sup = supervisor();
    add(&sup, "content", "writer", json!({"title": "t"}));
    add(&sup, "safety", "lenient", json!({"approved": true}));
    add(&sup, "safety", "strict", json!({"approved": false}));
    let distribution_calls = add(&sup, "distribution", "publisher", json!({"ok": true}));

    let report = sup
        .coordinate_content_creation(&ResearchRequest::new("AI"))
        .await
        .unwrap();

    assert!(!report.validation_results.content_passed_validation);
    assert_eq!(report.validation_results.outcome.results().len(), 2);
    assert!(report.distribution_results.is_skipped());
    assert!(distribution_calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_reregistering_same_id_replaces_worker() {
    let sup = supervisor();
    add(&sup, "research", "fetcher", json!({"version": 1}));
    let len_before = sup.registry().len();
    add(&sup, "research", "fetcher", json!({"version": 2}));

    assert_eq!(sup.registry().len(), len_before);
    assert_eq!(sup.swarm_members(SwarmKind::Research).len(), 1);

    let phase = sup.analyze_trends(&ResearchRequest::new("AI")).await;
    assert_eq!(phase.results().len(), 1);
    assert_eq!(phase.results()[0].result, Some(json!({"version": 2})));
}

#[tokio::test]
async fn test_empty_swarms_are_soft_failures() {
    let sup = supervisor();

    let report = sup
        .coordinate_content_creation(&ResearchRequest::new("AI"))
        .await
        .unwrap();

    assert_eq!(
        report.research_results,
        PhaseResult::Unavailable { error: "No research agents available".into() }
    );
    assert_eq!(
        report.content_results,
        PhaseResult::Unavailable { error: "No content agents available".into() }
    );
    assert!(!report.validation_results.content_passed_validation);
    assert!(report.distribution_results.is_skipped());
    assert!(report.workflow_completed);
}

#[tokio::test]
async fn test_approved_content_is_distributed_with_payloads_threaded_through() {
    let sup = supervisor();
    let research_calls = add(&sup, "research", "fetcher", json!({"fetched_trends": [{"keyword": "AI"}]}));
    let content_calls = add(&sup, "content", "writer", json!({"title": "Guide to AI"}));
    let safety_calls = add(&sup, "safety", "moderator", json!({"approved": true}));
    let distribution_calls = add(&sup, "distribution", "publisher", json!({"published": ["youtube"]}));

    let report = sup
        .coordinate_content_creation(
            &ResearchRequest::new("AI").with_keywords(["AI", "agents"]).with_timeframe("24h"),
        )
        .await
        .unwrap();

    assert!(report.validation_results.content_passed_validation);
    match &report.distribution_results {
        DistributionResult::Published { results, phase, published } => {
            assert_eq!(results.len(), 1);
            assert_eq!(*phase, SwarmKind::Distribution);
            assert!(*published);
        }
        other => panic!("expected distribution to run, got {:?}", other),
    }

    let research_task = research_calls.lock().await[0].clone();
    assert!(research_task.task_id.starts_with("research_"));
    assert_eq!(research_task.get_str("topic"), Some("AI"));
    assert_eq!(research_task.get_strings("keywords"), vec!["AI", "agents"]);
    assert_eq!(research_task.get_str("timeframe"), Some("24h"));

    let content_task = content_calls.lock().await[0].clone();
    assert_eq!(content_task.task_type, TaskType::GenerateContent);
    assert_eq!(content_task.get("research_data").unwrap()["phase"], json!("research"));
    assert_eq!(content_task.get_str("content_type"), Some("script"));
    assert_eq!(content_task.get_str("platform"), Some("youtube"));

    let safety_task = safety_calls.lock().await[0].clone();
    assert_eq!(safety_task.get("content_data").unwrap()["phase"], json!("content"));
    assert_eq!(safety_task.get_bool("human_approval_required"), Some(true));
    assert_eq!(safety_task.get_bool("policy_check"), Some(true));

    let distribution_task = distribution_calls.lock().await[0].clone();
    assert_eq!(
        distribution_task.get_strings("platforms"),
        vec!["youtube", "twitter", "instagram"]
    );
    assert_eq!(distribution_task.get_bool("schedule_immediate"), Some(true));
    assert_eq!(
        distribution_task.get("content_data").unwrap()["results"][0]["result"]["title"],
        json!("Guide to AI")
    );
}

#[tokio::test]
async fn test_missing_distribution_swarm_after_approval() {
    let sup = supervisor();
    add(&sup, "safety", "moderator", json!({"approved": true}));

    let report = sup
        .coordinate_content_creation(&ResearchRequest::new("AI"))
        .await
        .unwrap();

    assert!(report.validation_results.content_passed_validation);
    assert_eq!(
        serde_json::to_value(&report.distribution_results).unwrap(),
        json!({"error": "No distribution agents available"})
    );
}

#[tokio::test]
async fn test_deregistered_members_leave_swarm_unavailable() {
    let sup = supervisor();
    add(&sup, "research", "fetcher", json!({"fetched_trends": []}));
    add(&sup, "safety", "moderator", json!({"approved": true}));
    let distribution_calls = add(&sup, "distribution", "publisher", json!({}));

    sup.registry().deregister(&WorkerId::new("fetcher"));
    sup.registry().deregister(&WorkerId::new("publisher"));

    let report = sup
        .coordinate_content_creation(&ResearchRequest::new("AI"))
        .await
        .unwrap();

    assert_eq!(sup.swarm_members(SwarmKind::Distribution).len(), 1);
    assert!(report.validation_results.content_passed_validation);
    assert_eq!(
        report.research_results,
        PhaseResult::unavailable(SwarmKind::Research)
    );
    assert_eq!(report.distribution_results, DistributionResult::unavailable());
    assert!(distribution_calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_pipeline_config_feeds_phase_payloads() {
    let pipeline = PipelineConfig {
        default_platforms: vec!["linkedin".to_string()],
        human_approval_required: false,
        ..PipelineConfig::default()
    };
    let sup = supervisor().with_pipeline_config(pipeline);
    let safety_calls = add(&sup, "safety", "moderator", json!({"approved": true}));
    let distribution_calls = add(&sup, "distribution", "publisher", json!({}));

    sup.coordinate_content_creation(&ResearchRequest::new("AI")).await.unwrap();

    assert_eq!(
        safety_calls.lock().await[0].get_bool("human_approval_required"),
        Some(false)
    );
    assert_eq!(
        distribution_calls.lock().await[0].get_strings("platforms"),
        vec!["linkedin"]
    );
}

#[tokio::test]
async fn test_publish_content_rejected() {
    let sup = supervisor();
    add(&sup, "safety", "moderator", json!({"approved": false}));
    let distribution_calls = add(&sup, "distribution", "publisher", json!({}));

    let outcome = sup.publish_content(json!({"title": "Guide to AI"})).await;

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"error": "Content did not pass validation", "published": false})
    );
    assert!(distribution_calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_publish_content_approved() {
    let sup = supervisor();
    let safety_calls = add(&sup, "safety", "moderator", json!({"approved": true}));
    add(&sup, "distribution", "publisher", json!({"posted": true}));

    let outcome = sup.publish_content(json!({"title": "Guide to AI"})).await;

    match outcome {
        PublishOutcome::Distributed(DistributionResult::Published { results, .. }) => {
            assert_eq!(results[0].result, Some(json!({"posted": true})));
        }
        other => panic!("expected publication, got {:?}", other),
    }
    assert_eq!(
        safety_calls.lock().await[0].get("content_data"),
        Some(&json!({"title": "Guide to AI"}))
    );
}

#[tokio::test]
async fn test_supervisor_as_worker() {
    let sup = Arc::new(supervisor());
    add(&sup, "research", "fetcher", json!({"fetched_trends": []}));

    let outer = WorkerRegistry::new();
    outer.register(sup.clone());

    let outcome = outer
        .dispatch_one(
            &WorkerId::new("supervisor_001"),
            &Task::new("job_1", TaskType::CoordinateContentCreation).with("topic", "AI"),
        )
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.result_field("workflow_completed"), Some(&json!(true)));

    let unknown = outer
        .dispatch_one(&WorkerId::new("supervisor_001"), &Task::new("job_2", TaskType::DiscoverAgents))
        .await
        .unwrap();
    assert!(!unknown.is_success());
    assert_eq!(unknown.error.as_deref(), Some("Unknown task type: discover_agents"));
}

#[tokio::test]
async fn test_pipeline_events_published() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let sup = supervisor().with_event_bus(bus);
    add(&sup, "research", "fetcher", json!({"fetched_trends": []}));

    sup.coordinate_content_creation(&ResearchRequest::new("AI")).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(DomainEvent::Pipeline(event)) = rx.try_recv() {
        seen.push(event);
    }
    assert!(matches!(&seen[0], PipelineEvent::PhaseStarted { phase, .. } if phase == "research"));
    assert!(matches!(&seen[1], PipelineEvent::PhaseCompleted { envelope_count: 1, .. }));
    assert!(matches!(&seen[2], PipelineEvent::PhaseUnavailable { phase, .. } if phase == "content"));
    assert!(matches!(&seen[3], PipelineEvent::PhaseUnavailable { phase, .. } if phase == "safety"));
    assert!(matches!(&seen[4], PipelineEvent::PhaseSkipped { phase, .. } if phase == "distribution"));
    assert!(matches!(
        &seen[5],
        PipelineEvent::PipelineCompleted { content_passed_validation: false, .. }
    ));
}

#[tokio::test]
async fn test_trend_monitor_runs_cycles_and_records_alerts() {
    let sup = Arc::new(supervisor());
    let calls = add(
        &sup,
        "research",
        "fetcher",
        json!({"fetched_trends": [{"keyword": "AI", "volume": 20000, "sentiment_score": 0.1}]}),
    );

    let monitor = Arc::new(
        TrendMonitor::new(sup.clone(), &MonitoringConfig::default())
            .with_interval(Duration::from_millis(10))
            .with_max_cycles(2),
    );

    let handle = match monitor.clone().start() {
        MonitorStart::Started(handle) => handle,
        MonitorStart::AlreadyRunning => panic!("monitor should not be running yet"),
    };
    assert!(matches!(monitor.clone().start(), MonitorStart::AlreadyRunning));

    handle.await.unwrap();

    assert!(!monitor.is_running());
    assert_eq!(calls.lock().await.len(), 2);
    assert_eq!(monitor.alerts().len(), 2);
    assert_eq!(
        calls.lock().await[0].get_strings("keywords"),
        vec!["AI", "Technology", "Innovation"]
    );
}

#[tokio::test]
async fn test_trend_monitor_stop_before_start_is_honoured() {
    let sup = Arc::new(supervisor());
    let calls = add(&sup, "research", "fetcher", json!({"fetched_trends": []}));

    let monitor = Arc::new(
        TrendMonitor::new(sup, &MonitoringConfig::default())
            .with_interval(Duration::from_millis(10))
            .with_max_cycles(1),
    );
    monitor.stop();

    let MonitorStart::Started(handle) = monitor.clone().start() else {
        panic!("monitor should start");
    };
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("pending stop should end the loop")
        .unwrap();
    assert!(!monitor.is_running());
    assert!(calls.lock().await.is_empty());

    // The stop was consumed; a later start runs normally
    let MonitorStart::Started(handle) = monitor.clone().start() else {
        panic!("monitor should restart");
    };
    handle.await.unwrap();
    assert_eq!(calls.lock().await.len(), 1);
}

#[tokio::test]
async fn test_trend_monitor_stop_between_cycles() {
    let sup = Arc::new(supervisor());
    add(&sup, "research", "fetcher", json!({"fetched_trends": []}));

    let monitor = Arc::new(
        TrendMonitor::new(sup, &MonitoringConfig::default())
            .with_interval(Duration::from_secs(3600)),
    );
    let MonitorStart::Started(handle) = monitor.clone().start() else {
        panic!("monitor should start");
    };

    // First tick fires immediately; the next is an hour away
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.stop();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor should stop promptly")
        .unwrap();
    assert!(!monitor.is_running());
}
