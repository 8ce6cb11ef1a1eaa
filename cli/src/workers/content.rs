// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Content swarm stand-ins: script writing and thumbnail concepts.
//!
//! Both read the research phase result from `research_data`, which is the
//! serialised `{"results": [envelope...], "phase": "research"}` aggregate.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use chimera_core::domain::task::{Task, TaskType};
use chimera_core::domain::worker::{Worker, WorkerError, WorkerIdentity};

use super::stable_hash;

const FALLBACK_KEYWORD: &str = "Artificial Intelligence";
const FALLBACK_VOLUME: u64 = 8500;

/// The highest-volume trend across every research envelope, with the id of
/// the worker that reported it.
fn primary_trend(research_data: Option<&Value>) -> Option<(Value, String)> {
    let envelopes = research_data?.get("results")?.as_array()?;

    envelopes
        .iter()
        .filter_map(|envelope| {
            let source = envelope.get("worker_id")?.as_str()?.to_string();
            let trends = envelope.get("result")?.get("fetched_trends")?.as_array()?;
            Some(trends.iter().map(move |trend| (trend.clone(), source.clone())))
        })
        .flatten()
        .max_by_key(|(trend, _)| trend.get("volume").and_then(Value::as_u64).unwrap_or(0))
}

pub struct ScriptWriter {
    identity: WorkerIdentity,
}

impl ScriptWriter {
    pub fn new(identity: WorkerIdentity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl Worker for ScriptWriter {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::GenerateContent]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let content_type = task.get_str("content_type").unwrap_or("educational");
        let (trend, research_source) = primary_trend(task.get("research_data")).unwrap_or_else(|| {
            debug!("No research trends available, using fallback trend");
            (
                json!({"keyword": FALLBACK_KEYWORD, "volume": FALLBACK_VOLUME, "sentiment_score": 0.7}),
                "template_fallback".to_string(),
            )
        });

        let topic = trend
            .get("keyword")
            .and_then(Value::as_str)
            .unwrap_or("Technology")
            .to_string();
        let volume = trend.get("volume").and_then(Value::as_u64).unwrap_or(0);
        info!(topic = %topic, content_type, "Writing script");

        let script = format!(
            "Intro: {topic} is trending right now with {volume} searches this week.\n\
             Body: Here is why {topic} matters, what changed recently, and how you can start using it today.\n\
             Outro: Subscribe for more {content_type} breakdowns."
        );

        Ok(json!({
            "video_id": format!("vid_{:011x}", stable_hash(&topic) & 0xfff_ffff_ffff),
            "title": format!("Guide to {topic}"),
            "script": script,
            "trend_keyword": topic,
            "trend_volume": volume,
            "research_source": research_source,
            "content_type": content_type,
            "platform": task.get_str("platform"),
            "estimated_duration": "5 minutes",
            "script_written": true,
            "source": "template",
        }))
    }
}

pub struct ThumbnailDesigner {
    identity: WorkerIdentity,
}

impl ThumbnailDesigner {
    pub fn new(identity: WorkerIdentity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl Worker for ThumbnailDesigner {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::GenerateContent]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let keyword = primary_trend(task.get("research_data"))
            .and_then(|(trend, _)| trend.get("keyword").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_KEYWORD.to_string());

        let palette = [
            ["#FF0000", "#FFFFFF"],
            ["#1E90FF", "#FFD700"],
            ["#222222", "#39FF14"],
        ];
        let colors = palette[stable_hash(&keyword) as usize % palette.len()];

        Ok(json!({
            "thumbnail_concept": {
                "headline": keyword.to_uppercase(),
                "style": "bold_text_over_image",
                "colors": colors,
                "text_elements": [
                    {"text": keyword.to_uppercase(), "position": "center", "size": "large"},
                    {"text": "EXPLAINED", "position": "bottom", "size": "medium"},
                ],
            },
            "dimensions": "1280x720",
            "design_completed": true,
        }))
    }
}
