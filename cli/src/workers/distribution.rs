// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Distribution swarm stand-ins: per-platform publishing and network
//! announcements.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use chimera_core::domain::task::{Task, TaskType};
use chimera_core::domain::worker::{Worker, WorkerError, WorkerIdentity};

use super::{draft_str, resolve_draft};

/// Per-platform text limits, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformLimits {
    pub title: Option<usize>,
    pub body: Option<usize>,
}

pub const SUPPORTED_PLATFORMS: [&str; 5] = ["youtube", "twitter", "instagram", "tiktok", "linkedin"];

pub fn platform_limits(platform: &str) -> Option<PlatformLimits> {
    let limits = match platform {
        "youtube" => PlatformLimits { title: Some(100), body: Some(5000) },
        "twitter" => PlatformLimits { title: None, body: Some(280) },
        "instagram" => PlatformLimits { title: None, body: Some(2200) },
        "tiktok" => PlatformLimits { title: Some(150), body: None },
        "linkedin" => PlatformLimits { title: None, body: None },
        _ => return None,
    };
    Some(limits)
}

pub struct PlatformPublisher {
    identity: WorkerIdentity,
    handle: String,
}

impl PlatformPublisher {
    pub fn new(identity: WorkerIdentity, handle: impl Into<String>) -> Self {
        Self {
            identity,
            handle: handle.into(),
        }
    }

    fn limit_errors(platform: &str, limits: PlatformLimits, draft: &Map<String, Value>) -> Vec<String> {
        let checks = [
            ("Title", limits.title, draft_str(draft, "title")),
            ("Content", limits.body, draft_str(draft, "script")),
        ];
        checks
            .into_iter()
            .filter_map(|(label, max, text)| {
                let len = text.chars().count();
                match max {
                    Some(max) if len > max => Some(format!(
                        "{} too long for {}: {} chars (max: {})",
                        label, platform, len, max
                    )),
                    _ => None,
                }
            })
            .collect()
    }

    fn publish_to(&self, platform: &str, draft: &Map<String, Value>) -> Value {
        let Some(limits) = platform_limits(platform) else {
            return json!({
                "status": "error",
                "error": format!("Platform {} not supported", platform),
                "published": false,
            });
        };

        let errors = Self::limit_errors(platform, limits, draft);
        if !errors.is_empty() {
            warn!(platform, errors = ?errors, "Content rejected by platform limits");
            metrics::counter!("chimera_publish_attempts_total", "platform" => platform.to_string(), "status" => "rejected").increment(1);
            return json!({"status": "error", "error": errors, "published": false});
        }

        let video_id = draft
            .get("video_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(platform, video_id, "Published content");
        metrics::counter!("chimera_publish_attempts_total", "platform" => platform.to_string(), "status" => "published").increment(1);

        json!({
            "status": "success",
            "platform": platform,
            "content_id": video_id,
            "title": draft_str(draft, "title"),
            "published_url": format!("https://{}.com/@{}/{}", platform, self.handle, video_id),
            "published_at": Utc::now().to_rfc3339(),
            "published": true,
        })
    }
}

#[async_trait]
impl Worker for PlatformPublisher {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::PublishContent]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let draft = resolve_draft(task.get("content_data").unwrap_or(&Value::Null));
        if draft.is_empty() {
            return Err(WorkerError::InvalidPayload(
                "content_data holds no draft with a title".to_string(),
            ));
        }

        let mut platforms = task.get_strings("platforms");
        if platforms.is_empty() {
            platforms.push("youtube".to_string());
        }

        let results: Map<String, Value> = platforms
            .iter()
            .map(|platform| (platform.clone(), self.publish_to(platform, &draft)))
            .collect();
        let successful = results
            .values()
            .filter(|r| r.get("published").and_then(Value::as_bool) == Some(true))
            .count();

        Ok(json!({
            "publish_results": results,
            "total_platforms_attempted": platforms.len(),
            "successful_publishes": successful,
            "publishing_completed": true,
        }))
    }
}

/// Announces produced content to a peer agent network and answers discovery
/// and status requests. Peers are a fixed directory.
pub struct NetworkAnnouncer {
    identity: WorkerIdentity,
    peers: Vec<Value>,
}

impl NetworkAnnouncer {
    pub fn new(identity: WorkerIdentity) -> Self {
        let peers = vec![
            json!({
                "agent_id": "trend_analyst_node",
                "agent_type": "TrendAnalyst",
                "capabilities": ["trend_analysis", "data_collection"],
                "status": "online",
            }),
            json!({
                "agent_id": "distribution_hub_node",
                "agent_type": "DistributionHub",
                "capabilities": ["content_distribution", "platform_management"],
                "status": "online",
            }),
            json!({
                "agent_id": "quality_assurance_node",
                "agent_type": "QualityAssurance",
                "capabilities": ["content_review", "fact_checking"],
                "status": "busy",
            }),
        ];
        Self { identity, peers }
    }

    fn descriptor(&self) -> Value {
        json!({
            "agent_id": self.identity.id,
            "agent_type": "ContentProducer",
            "capabilities": ["video_production", "content_strategy", "social_publishing"],
            "specialties": ["AI", "Technology", "Education"],
            "status": "active",
            "last_seen": Utc::now().to_rfc3339(),
        })
    }

    fn announce(&self, task: &Task) -> Value {
        let draft = resolve_draft(task.get("content_data").unwrap_or(&Value::Null));
        let announcement = json!({
            "announcement_type": "content_created",
            "content_id": draft.get("video_id").and_then(Value::as_str).unwrap_or("unknown"),
            "title": draft.get("title").and_then(Value::as_str).unwrap_or("Untitled"),
            "content_type": draft.get("content_type").and_then(Value::as_str).unwrap_or("video"),
            "trend_association": draft.get("trend_keyword").and_then(Value::as_str).unwrap_or("general"),
            "created_at": Utc::now().to_rfc3339(),
            "announcer": self.descriptor(),
        });
        let deliveries: Vec<Value> = self
            .peers
            .iter()
            .map(|peer| json!({"node": peer["agent_id"], "delivered": peer["status"] == "online"}))
            .collect();
        info!(nodes = deliveries.len(), "Announced content to network");

        json!({
            "announcement_sent": true,
            "announcement": announcement,
            "network_broadcast_results": deliveries,
            "nodes_notified": self.peers.len(),
        })
    }

    fn discover(&self, task: &Task) -> Value {
        let wanted = task.get_str("capability");
        let agents: Vec<&Value> = self
            .peers
            .iter()
            .filter(|peer| match wanted {
                Some(capability) => peer["capabilities"]
                    .as_array()
                    .is_some_and(|caps| caps.iter().any(|c| c == capability)),
                None => true,
            })
            .collect();

        json!({
            "discovered_agents": agents,
            "total_discovered": agents.len(),
            "discovery_completed": true,
        })
    }

    fn broadcast_status(&self, task: &Task) -> Value {
        json!({
            "status_broadcast": true,
            "status": task.get_str("status").unwrap_or("active"),
            "descriptor": self.descriptor(),
            "nodes_notified": self.peers.len(),
        })
    }
}

#[async_trait]
impl Worker for NetworkAnnouncer {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![
            TaskType::PublishContent,
            TaskType::DiscoverAgents,
            TaskType::BroadcastStatus,
        ]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        match &task.task_type {
            TaskType::PublishContent => Ok(self.announce(task)),
            TaskType::DiscoverAgents => Ok(self.discover(task)),
            TaskType::BroadcastStatus => Ok(self.broadcast_status(task)),
            other => Err(WorkerError::UnknownTaskType(other.to_string())),
        }
    }
}
