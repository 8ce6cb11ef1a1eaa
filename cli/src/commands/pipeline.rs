// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pipeline commands
//!
//! Commands: run, trends, publish

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::task::JoinHandle;
use tracing::warn;

use chimera_core::domain::events::{PipelineEvent, WorkerEvent};
use chimera_core::infrastructure::event_bus::{DomainEvent, EventBusError, EventReceiver};
use chimera_swarm::application::ResearchRequest;
use chimera_swarm::domain::PublishOutcome;

use super::{parse_input, print_json};
use crate::embedded::EmbeddedNode;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Topic to research and produce content for
    #[arg(short, long)]
    pub topic: String,

    /// Keyword to research (repeatable)
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Research timeframe, e.g. 24h or 7d (default: from configuration)
    #[arg(long)]
    pub timeframe: Option<String>,

    /// Print pipeline and worker events as they happen
    #[arg(short, long)]
    pub watch: bool,
}

#[derive(Args, Debug)]
pub struct TrendsArgs {
    /// Topic to research
    #[arg(short, long, default_value = "")]
    pub topic: String,

    /// Keyword to research (repeatable)
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Research timeframe (default: from configuration)
    #[arg(long)]
    pub timeframe: Option<String>,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Content draft (JSON string or @file.json)
    #[arg(short, long, value_name = "INPUT")]
    pub input: String,
}

fn research_request(topic: String, keywords: Vec<String>, timeframe: Option<String>) -> ResearchRequest {
    let request = ResearchRequest::new(topic).with_keywords(keywords);
    match timeframe {
        Some(timeframe) => request.with_timeframe(timeframe),
        None => request,
    }
}

pub async fn run(args: RunArgs, node: &EmbeddedNode) -> Result<()> {
    let request = research_request(args.topic, args.keywords, args.timeframe);
    let watcher = args
        .watch
        .then(|| spawn_watcher(node.event_bus().subscribe()));

    eprintln!("Running content pipeline for {}...", request.topic.bold());
    let report = node
        .supervisor()
        .coordinate_content_creation(&request)
        .await
        .context("Pipeline run failed")?;

    if let Some(watcher) = watcher {
        watcher.await.context("Event watcher task failed")?;
    }

    print_json(&report)?;

    if report.validation_results.content_passed_validation {
        eprintln!("{}", "✓ Content passed validation and was distributed".green());
    } else {
        eprintln!(
            "{}",
            "Content did not pass safety validation; distribution skipped".yellow()
        );
    }

    let pending = node.review_gate().pending_approvals();
    if !pending.is_empty() {
        eprintln!("{}", "Held for human review:".bold());
        for (approval_id, request) in &pending {
            eprintln!("  {} {} ({})", approval_id, request.title, request.reasons.join("; "));
        }
    }

    Ok(())
}

pub async fn trends(args: TrendsArgs, node: &EmbeddedNode) -> Result<()> {
    let request = research_request(args.topic, args.keywords, args.timeframe);
    let phase = node.supervisor().analyze_trends(&request).await;

    if let Some(error) = phase.error() {
        eprintln!("{}", error.yellow());
    }
    print_json(&phase)
}

pub async fn publish(args: PublishArgs, node: &EmbeddedNode) -> Result<()> {
    let content = parse_input(&args.input)?;
    let outcome = node.supervisor().publish_content(content).await;

    print_json(&outcome)?;
    match &outcome {
        PublishOutcome::Rejected { error, .. } => eprintln!("{}", error.yellow()),
        PublishOutcome::Distributed(_) => eprintln!("{}", "✓ Content distributed".green()),
    }
    Ok(())
}

/// Print events until the pipeline completes or the bus closes.
fn spawn_watcher(mut events: EventReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(DomainEvent::Pipeline(event)) => {
                    eprintln!("{}", format_pipeline_event(&event).cyan());
                    if matches!(event, PipelineEvent::PipelineCompleted { .. }) {
                        break;
                    }
                }
                Ok(DomainEvent::Worker(event)) => {
                    eprintln!("{}", format_worker_event(&event).dimmed());
                }
                Err(EventBusError::Lagged(skipped)) => {
                    warn!(skipped, "Event watcher fell behind");
                }
                Err(_) => break,
            }
        }
    })
}

pub fn format_pipeline_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::PhaseStarted { phase, target_workers, .. } => {
            format!("[{}] started on {} worker(s)", phase, target_workers)
        }
        PipelineEvent::PhaseCompleted { phase, envelope_count, .. } => {
            format!("[{}] completed with {} result(s)", phase, envelope_count)
        }
        PipelineEvent::PhaseUnavailable { phase, reason, .. } => format!("[{}] {}", phase, reason),
        PipelineEvent::PhaseSkipped { phase, reason, .. } => {
            format!("[{}] skipped: {}", phase, reason)
        }
        PipelineEvent::PipelineCompleted {
            topic,
            content_passed_validation,
            ..
        } => format!(
            "pipeline for '{}' finished (passed validation: {})",
            topic, content_passed_validation
        ),
    }
}

pub fn format_worker_event(event: &WorkerEvent) -> String {
    match event {
        WorkerEvent::TaskStarted { worker_id, task_type, .. } => {
            format!("  {} started {}", worker_id, task_type)
        }
        WorkerEvent::TaskCompleted {
            worker_id,
            task_type,
            execution_time_seconds,
            ..
        } => format!(
            "  {} finished {} in {:.3}s",
            worker_id, task_type, execution_time_seconds
        ),
        WorkerEvent::TaskFailed { worker_id, error, .. } => {
            format!("  {} failed: {}", worker_id, error)
        }
        WorkerEvent::TaskRejected { worker_id, state, .. } => {
            format!("  {} rejected a task while {}", worker_id, state)
        }
        WorkerEvent::StateChanged { worker_id, from, to, .. } => {
            format!("  {} {} -> {}", worker_id, from, to)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimera_core::domain::worker::{WorkerId, WorkerState};
    use chrono::Utc;

    #[test]
    fn test_research_request_timeframe_optional() {
        let request = research_request("AI".into(), vec!["llm".into()], None);
        assert_eq!(request.timeframe, None);
        let request = research_request("AI".into(), vec![], Some("24h".into()));
        assert_eq!(request.timeframe.as_deref(), Some("24h"));
    }

    #[test]
    fn test_format_events() {
        let skipped = PipelineEvent::PhaseSkipped {
            phase: "distribution".into(),
            reason: "Failed safety validation".into(),
            skipped_at: Utc::now(),
        };
        assert_eq!(
            format_pipeline_event(&skipped),
            "[distribution] skipped: Failed safety validation"
        );

        let changed = WorkerEvent::StateChanged {
            worker_id: WorkerId::new("trend_fetcher"),
            from: WorkerState::Idle,
            to: WorkerState::Working,
            changed_at: Utc::now(),
        };
        assert_eq!(format_worker_event(&changed), "  trend_fetcher idle -> working");
    }
}
