// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Safety swarm stand-ins.
//!
//! Every safety result carries a boolean `approved`; the supervisor ANDs them
//! to decide whether distribution runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

use chimera_core::domain::task::{Task, TaskType};
use chimera_core::domain::worker::{Worker, WorkerError, WorkerIdentity};

use super::{draft_str, resolve_draft};

const TITLE_LENGTH: (usize, usize) = (5, 100);
const SCRIPT_LENGTH: (usize, usize) = (100, 5000);
const BANNED_PHRASES: [&str; 4] = ["clickbait", "you won't believe", "incredible", "shocking"];
const PROVENANCE_FIELDS: [&str; 2] = ["trend_keyword", "research_source"];

fn compile(patterns: &[&str]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

/// Combined lowercase title and script.
fn draft_text(draft: &Map<String, Value>) -> String {
    format!("{} {}", draft_str(draft, "title"), draft_str(draft, "script")).to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CheckResult {
    passed: bool,
    issues: Vec<String>,
    score: i64,
}

impl CheckResult {
    /// `penalty` points are deducted per issue.
    fn from_issues(issues: Vec<String>, penalty: i64) -> Self {
        Self {
            passed: issues.is_empty(),
            score: 100 - penalty * issues.len() as i64,
            issues,
        }
    }
}

/// Automated quality and policy checks: length limits, banned phrases,
/// unsafe wording, and provenance fields.
pub struct ContentModerator {
    identity: WorkerIdentity,
    unsafe_patterns: Vec<Regex>,
}

impl ContentModerator {
    pub fn new(identity: WorkerIdentity) -> Result<Self, regex::Error> {
        Ok(Self {
            identity,
            unsafe_patterns: compile(&[
                r"\b(violence|hatred|discrimination|explicit)\b",
                r"\b(dangerous|unsafe|illegal)\b",
            ])?,
        })
    }

    fn length_issues(label: &str, len: usize, (min, max): (usize, usize)) -> Option<String> {
        if len < min {
            Some(format!("{} too short: {} chars (min: {})", label, len, min))
        } else if len > max {
            Some(format!("{} too long: {} chars (max: {})", label, len, max))
        } else {
            None
        }
    }

    fn title_quality(draft: &Map<String, Value>) -> CheckResult {
        let title = draft_str(draft, "title");
        let lowered = title.to_lowercase();
        let mut issues: Vec<String> = Self::length_issues("Title", title.chars().count(), TITLE_LENGTH)
            .into_iter()
            .collect();
        issues.extend(
            BANNED_PHRASES
                .iter()
                .filter(|phrase| lowered.contains(*phrase))
                .map(|phrase| format!("Banned phrase detected in title: '{}'", phrase)),
        );
        CheckResult::from_issues(issues, 20)
    }

    fn script_quality(draft: &Map<String, Value>) -> CheckResult {
        let script = draft_str(draft, "script");
        let issues = Self::length_issues("Script", script.chars().count(), SCRIPT_LENGTH)
            .into_iter()
            .collect();
        CheckResult::from_issues(issues, 25)
    }

    fn content_safety(&self, draft: &Map<String, Value>) -> CheckResult {
        let text = draft_text(draft);
        let issues = self
            .unsafe_patterns
            .iter()
            .filter(|pattern| pattern.is_match(&text))
            .map(|pattern| format!("Potentially unsafe content pattern detected: {}", pattern.as_str()))
            .collect();
        CheckResult::from_issues(issues, 30)
    }

    fn provenance(draft: &Map<String, Value>) -> CheckResult {
        let issues = PROVENANCE_FIELDS
            .iter()
            .filter(|field| !draft.contains_key(**field))
            .map(|field| format!("Missing provenance field: {}", field))
            .collect();
        CheckResult::from_issues(issues, 15)
    }
}

#[async_trait]
impl Worker for ContentModerator {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::ValidateContent]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let draft = resolve_draft(task.get("content_data").unwrap_or(&Value::Null));

        let checks: BTreeMap<&str, CheckResult> = [
            ("title_quality", Self::title_quality(&draft)),
            ("script_quality", Self::script_quality(&draft)),
            ("content_safety", self.content_safety(&draft)),
            ("provenance_valid", Self::provenance(&draft)),
        ]
        .into_iter()
        .collect();

        let approved = checks.values().all(|check| check.passed);
        let issues: Vec<&String> = checks.values().flat_map(|check| &check.issues).collect();
        info!(approved, issue_count = issues.len(), "Content moderation completed");

        Ok(json!({
            "approved": approved,
            "checks": checks,
            "issues": issues,
            "moderation_completed": true,
            "content_passed_moderation": approved,
        }))
    }
}

const ENGAGEMENT_SPIKE: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub content_id: String,
    pub title: String,
    pub reasons: Vec<String>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approval_id: String,
    pub content_id: String,
    pub approved: bool,
    pub notes: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("Approval ID {0} not found")]
pub struct UnknownApproval(pub String);

#[derive(Default)]
struct ReviewQueue {
    issued: u64,
    pending: BTreeMap<String, ApprovalRequest>,
}

/// Holds content for a human when it is flagged, predicts an engagement
/// spike, or contains sensitive wording. Held content is not approved.
pub struct HumanReviewGate {
    identity: WorkerIdentity,
    sensitive_patterns: Vec<Regex>,
    queue: Mutex<ReviewQueue>,
}

impl HumanReviewGate {
    pub fn new(identity: WorkerIdentity) -> Result<Self, regex::Error> {
        Ok(Self {
            identity,
            sensitive_patterns: compile(&[
                r"\b(hate|violence|explicit|adult)\b",
                r"\b(politics|controversial)\b",
            ])?,
            queue: Mutex::new(ReviewQueue::default()),
        })
    }

    fn review_reasons(&self, draft: &Map<String, Value>) -> Vec<String> {
        let mut reasons: Vec<String> = draft
            .get("flags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(|flag| format!("Content flagged: {}", flag))
            .collect();

        let engagement = draft
            .get("estimated_engagement")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if engagement > ENGAGEMENT_SPIKE {
            reasons.push(format!(
                "Estimated engagement exceeds threshold ({} > {})",
                engagement, ENGAGEMENT_SPIKE
            ));
        }

        let text = draft_text(draft);
        if let Some(pattern) = self.sensitive_patterns.iter().find(|p| p.is_match(&text)) {
            warn!(pattern = pattern.as_str(), "Content flagged for potentially unsafe content");
            reasons.push("Content safety check failed".to_string());
        }

        reasons
    }

    pub fn pending_approvals(&self) -> BTreeMap<String, ApprovalRequest> {
        self.queue.lock().pending.clone()
    }

    /// Record a human decision for a held item and remove it from the queue.
    pub fn decide(
        &self,
        approval_id: &str,
        approved: bool,
        notes: impl Into<String>,
    ) -> Result<ApprovalDecision, UnknownApproval> {
        let request = self
            .queue
            .lock()
            .pending
            .remove(approval_id)
            .ok_or_else(|| UnknownApproval(approval_id.to_string()))?;

        info!(approval_id, content_id = %request.content_id, approved, "Human review decision recorded");
        Ok(ApprovalDecision {
            approval_id: approval_id.to_string(),
            content_id: request.content_id,
            approved,
            notes: notes.into(),
            processed_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Worker for HumanReviewGate {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::ValidateContent]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let draft = resolve_draft(task.get("content_data").unwrap_or(&Value::Null));
        let reasons = self.review_reasons(&draft);

        if reasons.is_empty() {
            return Ok(json!({
                "approved": true,
                "needs_human_review": false,
                "reasons": ["Content passed automated safety checks"],
                "content_approved": true,
            }));
        }

        let approval_id = {
            let mut queue = self.queue.lock();
            queue.issued += 1;
            let approval_id = format!("approval_{}", queue.issued);
            queue.pending.insert(
                approval_id.clone(),
                ApprovalRequest {
                    content_id: draft
                        .get("video_id")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    title: draft
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or("Untitled")
                        .to_string(),
                    reasons: reasons.clone(),
                    requested_at: Utc::now(),
                },
            );
            approval_id
        };
        info!(approval_id = %approval_id, reasons = ?reasons, "Content held for human review");

        Ok(json!({
            "approved": false,
            "needs_human_review": true,
            "approval_id": approval_id,
            "reasons": reasons,
            "content_held": true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(content: Value) -> Task {
        Task::new("safety_1", TaskType::ValidateContent).with("content_data", content)
    }

    fn clean_draft() -> Value {
        json!({
            "video_id": "vid_1",
            "title": "Guide to Rust",
            "script": "Intro: Rust is trending.\nBody: Here is why it matters for systems work and what changed this year.\nOutro: Subscribe.",
            "trend_keyword": "Rust",
            "research_source": "trend_fetcher",
        })
    }

    #[tokio::test]
    async fn test_moderator_approves_clean_draft() {
        let moderator = ContentModerator::new(WorkerIdentity::new("moderator", "Moderator")).unwrap();
        let result = moderator.handle(&validate(clean_draft())).await.unwrap();
        assert_eq!(result["approved"], true);
        assert_eq!(result["issues"], json!([]));
        assert_eq!(result["checks"]["provenance_valid"]["score"], 100);
    }

    #[tokio::test]
    async fn test_moderator_reports_each_failed_check() {
        let moderator = ContentModerator::new(WorkerIdentity::new("moderator", "Moderator")).unwrap();
        let result = moderator
            .handle(&validate(json!({"title": "Shocking", "script": "illegal tricks"})))
            .await
            .unwrap();

        assert_eq!(result["approved"], false);
        assert_eq!(result["checks"]["title_quality"]["passed"], false);
        assert_eq!(result["checks"]["title_quality"]["score"], 80);
        assert_eq!(result["checks"]["script_quality"]["passed"], false);
        assert_eq!(result["checks"]["content_safety"]["score"], 70);
        assert_eq!(result["checks"]["provenance_valid"]["score"], 70);
    }

    #[tokio::test]
    async fn test_moderator_without_draft_rejects() {
        let moderator = ContentModerator::new(WorkerIdentity::new("moderator", "Moderator")).unwrap();
        let result = moderator.handle(&Task::new("s", TaskType::ValidateContent)).await.unwrap();
        assert_eq!(result["approved"], false);
    }

    #[tokio::test]
    async fn test_review_gate_passes_clean_draft() {
        let gate = HumanReviewGate::new(WorkerIdentity::new("hitl", "HumanReview")).unwrap();
        let result = gate.handle(&validate(clean_draft())).await.unwrap();
        assert_eq!(result["approved"], true);
        assert_eq!(result["needs_human_review"], false);
        assert!(gate.pending_approvals().is_empty());
    }

    #[tokio::test]
    async fn test_review_gate_holds_engagement_spike_and_records_decision() {
        let gate = HumanReviewGate::new(WorkerIdentity::new("hitl", "HumanReview")).unwrap();
        let mut draft = clean_draft();
        draft["estimated_engagement"] = json!(25_000);
        draft["flags"] = json!(["needs_legal"]);

        let result = gate.handle(&validate(draft)).await.unwrap();
        assert_eq!(result["approved"], false);
        assert_eq!(result["approval_id"], "approval_1");
        assert_eq!(result["reasons"].as_array().unwrap().len(), 2);

        let pending = gate.pending_approvals();
        assert_eq!(pending["approval_1"].content_id, "vid_1");

        let decision = gate.decide("approval_1", true, "looks fine").unwrap();
        assert!(decision.approved);
        assert!(gate.pending_approvals().is_empty());
        assert!(gate.decide("approval_1", true, "").is_err());
    }

    #[tokio::test]
    async fn test_review_gate_flags_sensitive_wording() {
        let gate = HumanReviewGate::new(WorkerIdentity::new("hitl", "HumanReview")).unwrap();
        let mut draft = clean_draft();
        draft["title"] = json!("Rust and politics");

        let result = gate.handle(&validate(draft)).await.unwrap();
        assert_eq!(result["content_held"], true);
        assert_eq!(result["reasons"], json!(["Content safety check failed"]));
    }
}
