// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process node assembly
//!
//! Builds the event bus, registry, supervisor, and one pair of stand-in
//! workers per swarm from a [`NodeConfigManifest`]. Every worker reference
//! is passed to the supervisor explicitly.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use chimera_core::application::WorkerRegistry;
use chimera_core::domain::node_config::NodeConfigManifest;
use chimera_core::domain::worker::{Worker, WorkerIdentity};
use chimera_core::infrastructure::event_bus::EventBus;
use chimera_swarm::application::{Supervisor, TrendMonitor};
use chimera_swarm::domain::SwarmKind;

use crate::workers::{
    ContentModerator, HumanReviewGate, NetworkAnnouncer, NicheAnalyst, PlatformPublisher,
    ScriptWriter, ThumbnailDesigner, TrendFetcher,
};

const PUBLISHER_HANDLE: &str = "chimera_ai";

pub struct EmbeddedNode {
    config: NodeConfigManifest,
    event_bus: EventBus,
    registry: Arc<WorkerRegistry>,
    supervisor: Arc<Supervisor>,
    review_gate: Arc<HumanReviewGate>,
}

impl EmbeddedNode {
    /// Discover and validate configuration, then build the node.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config =
            NodeConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
        config.validate().context("Configuration validation failed")?;
        Self::from_config(config)
    }

    pub fn from_config(config: NodeConfigManifest) -> Result<Self> {
        let event_bus = EventBus::with_default_capacity();
        let registry = Arc::new(WorkerRegistry::with_event_bus(event_bus.clone()));
        let supervisor = Supervisor::new(
            WorkerIdentity::new("supervisor", "Supervisor"),
            registry.clone(),
        )
        .with_pipeline_config(config.spec.pipeline.clone())
        .with_event_bus(event_bus.clone());

        let review_gate = Arc::new(
            HumanReviewGate::new(WorkerIdentity::new("human_review", "HumanReviewGate"))
                .context("Failed to compile review patterns")?,
        );
        let moderator = ContentModerator::new(WorkerIdentity::new("content_moderator", "ContentModerator"))
            .context("Failed to compile moderation patterns")?;

        enlist(&supervisor, Arc::new(TrendFetcher::new(WorkerIdentity::new("trend_fetcher", "TrendFetcher"))), SwarmKind::Research)?;
        enlist(&supervisor, Arc::new(NicheAnalyst::new(WorkerIdentity::new("niche_analyst", "NicheAnalyst"))), SwarmKind::Research)?;
        enlist(&supervisor, Arc::new(ScriptWriter::new(WorkerIdentity::new("script_writer", "ScriptWriter"))), SwarmKind::Content)?;
        enlist(
            &supervisor,
            Arc::new(ThumbnailDesigner::new(WorkerIdentity::new("thumbnail_designer", "ThumbnailDesigner"))),
            SwarmKind::Content,
        )?;
        enlist(&supervisor, Arc::new(moderator), SwarmKind::Safety)?;
        enlist(&supervisor, review_gate.clone(), SwarmKind::Safety)?;
        enlist(
            &supervisor,
            Arc::new(PlatformPublisher::new(
                WorkerIdentity::new("platform_publisher", "PlatformPublisher"),
                PUBLISHER_HANDLE,
            )),
            SwarmKind::Distribution,
        )?;
        enlist(
            &supervisor,
            Arc::new(NetworkAnnouncer::new(WorkerIdentity::new("network_announcer", "NetworkAnnouncer"))),
            SwarmKind::Distribution,
        )?;
        info!(
            node = %config.metadata.name,
            workers = registry.len(),
            "Embedded node ready"
        );

        Ok(Self {
            config,
            event_bus,
            registry,
            supervisor: Arc::new(supervisor),
            review_gate,
        })
    }

    pub fn config(&self) -> &NodeConfigManifest {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn review_gate(&self) -> &Arc<HumanReviewGate> {
        &self.review_gate
    }

    /// A trend monitor over this node's supervisor using the configured
    /// interval, keywords, and thresholds.
    pub fn trend_monitor(&self) -> TrendMonitor {
        TrendMonitor::new(self.supervisor.clone(), &self.config.spec.monitoring)
    }
}

fn enlist(supervisor: &Supervisor, worker: Arc<dyn Worker>, swarm: SwarmKind) -> Result<()> {
    supervisor
        .register_subagent(worker, swarm.as_str())
        .with_context(|| format!("Failed to register worker to {} swarm", swarm))?;
    Ok(())
}
