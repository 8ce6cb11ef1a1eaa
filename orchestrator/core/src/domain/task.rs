// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task & Outcome Envelope Domain Types
//!
//! Pure data describing one unit of dispatched work and the uniform
//! success/error wrapper every worker invocation produces.
//!
//! | Type | Role |
//! |------|------|
//! | [`TaskType`] | Handler tag selecting a worker's internal handler |
//! | [`Task`] | `{task_id, task_type, payload}`, immutable once dispatched |
//! | [`TaskOutcome`] | Envelope returned by `WorkerRuntime::process` |
//!
//! Exactly one of `TaskOutcome::result` / `TaskOutcome::error` is populated;
//! the constructors are the only way to build an envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::worker::WorkerId;

/// Handler tag carried by every [`Task`].
///
/// Serialises as its snake_case string so that tasks arriving from an HTTP or
/// CLI driver keep the wire shape `{"task_type": "analyze_trends", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    AnalyzeTrends,
    GenerateContent,
    ValidateContent,
    PublishContent,
    CoordinateContentCreation,
    DiscoverAgents,
    BroadcastStatus,
    /// Any tag the system has no first-class variant for.
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::AnalyzeTrends => "analyze_trends",
            TaskType::GenerateContent => "generate_content",
            TaskType::ValidateContent => "validate_content",
            TaskType::PublishContent => "publish_content",
            TaskType::CoordinateContentCreation => "coordinate_content_creation",
            TaskType::DiscoverAgents => "discover_agents",
            TaskType::BroadcastStatus => "broadcast_status",
            TaskType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for TaskType {
    fn from(tag: &str) -> Self {
        match tag {
            "analyze_trends" => TaskType::AnalyzeTrends,
            "generate_content" => TaskType::GenerateContent,
            "validate_content" => TaskType::ValidateContent,
            "publish_content" => TaskType::PublishContent,
            "coordinate_content_creation" => TaskType::CoordinateContentCreation,
            "discover_agents" => TaskType::DiscoverAgents,
            "broadcast_status" => TaskType::BroadcastStatus,
            other => TaskType::Other(other.to_string()),
        }
    }
}

impl From<String> for TaskType {
    fn from(tag: String) -> Self {
        TaskType::from(tag.as_str())
    }
}

impl From<TaskType> for String {
    fn from(task_type: TaskType) -> Self {
        task_type.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work dispatched to one or more workers.
///
/// The payload is an open key-value map; handlers read the keys they need and
/// ignore the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub task_type: TaskType,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Task {
    pub fn new(task_id: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            task_id: task_id.into(),
            task_type,
            payload: Map::new(),
        }
    }

    /// Task id of the form `{prefix}_{YYYYmmdd_HHMMSS}`.
    pub fn timestamped(prefix: &str, task_type: TaskType) -> Self {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        Self::new(format!("{prefix}_{stamp}"), task_type)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// String array under `key`; non-string entries are skipped.
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        self.payload
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.payload.get(key).and_then(Value::as_bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Uniform success/error wrapper produced by every worker invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub worker_id: WorkerId,
    pub task_id: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub execution_time_seconds: f64,
}

impl TaskOutcome {
    pub fn success(
        worker_id: WorkerId,
        task_id: &str,
        result: Value,
        execution_time_seconds: f64,
    ) -> Self {
        Self {
            worker_id,
            task_id: task_id.to_string(),
            status: OutcomeStatus::Success,
            result: Some(result),
            error: None,
            timestamp: Utc::now(),
            execution_time_seconds,
        }
    }

    pub fn failure(
        worker_id: WorkerId,
        task_id: &str,
        error: String,
        execution_time_seconds: f64,
    ) -> Self {
        Self {
            worker_id,
            task_id: task_id.to_string(),
            status: OutcomeStatus::Error,
            result: None,
            error: Some(error),
            timestamp: Utc::now(),
            execution_time_seconds,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Field of the result object, if this is a success envelope carrying one.
    pub fn result_field(&self, key: &str) -> Option<&Value> {
        self.result.as_ref().and_then(|r| r.get(key))
    }
}
