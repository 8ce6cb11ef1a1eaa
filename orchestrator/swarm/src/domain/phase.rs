// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Phase Results
//!
//! Aggregated output of each pipeline phase. The enums are `#[serde(untagged)]`
//! so that the serialised shape is the plain JSON object consumers inspect,
//! for example `{"results": [...], "phase": "research"}` or
//! `{"skipped": true, "reason": "Failed safety validation"}`.
//!
//! Soft failures are variants here, never `Err`: a phase that could not run
//! still produces a value and the pipeline carries on.

use serde::{Deserialize, Serialize};

use chimera_core::domain::task::TaskOutcome;

use crate::domain::swarm::SwarmKind;

pub const SKIP_REASON_FAILED_VALIDATION: &str = "Failed safety validation";
pub const CONTENT_REJECTED: &str = "Content did not pass validation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseResult {
    Ran {
        results: Vec<TaskOutcome>,
        phase: SwarmKind,
    },
    /// The phase's swarm had no members.
    Unavailable { error: String },
}

impl PhaseResult {
    pub fn unavailable(swarm: SwarmKind) -> Self {
        PhaseResult::Unavailable {
            error: swarm.unavailable_message(),
        }
    }

    pub fn results(&self) -> &[TaskOutcome] {
        match self {
            PhaseResult::Ran { results, .. } => results,
            PhaseResult::Unavailable { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PhaseResult::Unavailable { error } => Some(error),
            PhaseResult::Ran { .. } => None,
        }
    }
}

/// Safety phase output: the phase result plus the gating verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(flatten)]
    pub outcome: PhaseResult,
    pub content_passed_validation: bool,
}

impl ValidationReport {
    /// AND over every envelope's `result.approved`. Missing or non-boolean
    /// `approved`, error envelopes, and an empty result list all count as
    /// not passed.
    pub fn from_outcomes(results: Vec<TaskOutcome>) -> Self {
        let content_passed_validation = !results.is_empty()
            && results.iter().all(|outcome| {
                outcome
                    .result_field("approved")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
            });
        Self {
            outcome: PhaseResult::Ran {
                results,
                phase: SwarmKind::Safety,
            },
            content_passed_validation,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            outcome: PhaseResult::unavailable(SwarmKind::Safety),
            content_passed_validation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistributionResult {
    Published {
        results: Vec<TaskOutcome>,
        phase: SwarmKind,
        published: bool,
    },
    Skipped {
        skipped: bool,
        reason: String,
    },
    Unavailable {
        error: String,
    },
}

impl DistributionResult {
    pub fn published(results: Vec<TaskOutcome>) -> Self {
        DistributionResult::Published {
            results,
            phase: SwarmKind::Distribution,
            published: true,
        }
    }

    pub fn skipped_failed_validation() -> Self {
        DistributionResult::Skipped {
            skipped: true,
            reason: SKIP_REASON_FAILED_VALIDATION.to_string(),
        }
    }

    pub fn unavailable() -> Self {
        DistributionResult::Unavailable {
            error: SwarmKind::Distribution.unavailable_message(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DistributionResult::Skipped { .. })
    }
}

/// Result of the `publish_content` entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishOutcome {
    Rejected { error: String, published: bool },
    Distributed(DistributionResult),
}

impl PublishOutcome {
    pub fn rejected() -> Self {
        PublishOutcome::Rejected {
            error: CONTENT_REJECTED.to_string(),
            published: false,
        }
    }
}

/// Aggregate returned by a full pipeline run.
///
/// `workflow_completed` only says the sequencing reached the end; partial
/// failure is visible in the nested phase results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub research_results: PhaseResult,
    pub content_results: PhaseResult,
    pub validation_results: ValidationReport,
    pub distribution_results: DistributionResult,
    pub workflow_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimera_core::domain::worker::WorkerId;
    use serde_json::json;

    fn approval(approved: Option<bool>) -> TaskOutcome {
        let result = match approved {
            Some(flag) => json!({ "approved": flag }),
            None => json!({ "reviewed": true }),
        };
        TaskOutcome::success(WorkerId::new("mod"), "safety_1", result, 0.01)
    }

    #[test]
    fn test_unavailable_validation_shape() {
        let value = serde_json::to_value(ValidationReport::unavailable()).unwrap();
        assert_eq!(
            value,
            json!({"error": "No safety agents available", "content_passed_validation": false})
        );
    }

    #[test]
    fn test_skip_marker_shape() {
        let value = serde_json::to_value(DistributionResult::skipped_failed_validation()).unwrap();
        assert_eq!(value, json!({"skipped": true, "reason": "Failed safety validation"}));
    }

    #[test]
    fn test_validation_requires_every_approval() {
        assert!(ValidationReport::from_outcomes(vec![approval(Some(true)), approval(Some(true))])
            .content_passed_validation);
        assert!(!ValidationReport::from_outcomes(vec![approval(Some(true)), approval(Some(false))])
            .content_passed_validation);
        assert!(!ValidationReport::from_outcomes(vec![approval(Some(true)), approval(None)])
            .content_passed_validation);
        assert!(!ValidationReport::from_outcomes(vec![]).content_passed_validation);

        let failed = TaskOutcome::failure(WorkerId::new("mod"), "safety_1", "boom".into(), 0.0);
        assert!(!ValidationReport::from_outcomes(vec![failed]).content_passed_validation);
    }

    #[test]
    fn test_phase_result_shapes() {
        let ran = PhaseResult::Ran {
            results: vec![],
            phase: SwarmKind::Research,
        };
        assert_eq!(serde_json::to_value(&ran).unwrap(), json!({"results": [], "phase": "research"}));
        assert_eq!(
            serde_json::to_value(PhaseResult::unavailable(SwarmKind::Content)).unwrap(),
            json!({"error": "No content agents available"})
        );
        assert_eq!(
            serde_json::to_value(PublishOutcome::rejected()).unwrap(),
            json!({"error": "Content did not pass validation", "published": false})
        );
    }
}
