// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Membership
//!
//! - [`SwarmKind`]: the four recognised swarm names, one per pipeline phase.
//! - [`SwarmMembership`]: `swarm → [worker_id]` bookkeeping owned by the
//!   supervisor.
//!
//! ## Invariants
//!
//! - A worker id appears at most once within a given swarm.
//! - A worker id may appear in several swarms.
//! - Membership is append-only; there is no per-swarm removal. Removing a
//!   worker from dispatch goes through the registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chimera_core::domain::task::TaskType;
use chimera_core::domain::worker::WorkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwarmKind {
    Research,
    Content,
    Safety,
    Distribution,
}

impl SwarmKind {
    /// Pipeline order.
    pub const ALL: [SwarmKind; 4] = [
        SwarmKind::Research,
        SwarmKind::Content,
        SwarmKind::Safety,
        SwarmKind::Distribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwarmKind::Research => "research",
            SwarmKind::Content => "content",
            SwarmKind::Safety => "safety",
            SwarmKind::Distribution => "distribution",
        }
    }

    /// Task type the supervisor dispatches to this swarm.
    pub fn phase_task_type(&self) -> TaskType {
        match self {
            SwarmKind::Research => TaskType::AnalyzeTrends,
            SwarmKind::Content => TaskType::GenerateContent,
            SwarmKind::Safety => TaskType::ValidateContent,
            SwarmKind::Distribution => TaskType::PublishContent,
        }
    }

    /// Soft-failure marker reported when the swarm has no members.
    pub fn unavailable_message(&self) -> String {
        format!("No {} agents available", self.as_str())
    }
}

impl fmt::Display for SwarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown swarm '{0}'. Expected one of: research, content, safety, distribution")]
pub struct UnknownSwarm(pub String);

impl FromStr for SwarmKind {
    type Err = UnknownSwarm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SwarmKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSwarm(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmMembership {
    swarms: BTreeMap<SwarmKind, Vec<WorkerId>>,
}

impl SwarmMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `worker_id` to `swarm`. Returns `false` if it was already a member.
    pub fn add(&mut self, swarm: SwarmKind, worker_id: WorkerId) -> bool {
        let members = self.swarms.entry(swarm).or_default();
        if members.contains(&worker_id) {
            return false;
        }
        members.push(worker_id);
        true
    }

    pub fn members(&self, swarm: SwarmKind) -> &[WorkerId] {
        self.swarms.get(&swarm).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self, swarm: SwarmKind) -> bool {
        self.members(swarm).is_empty()
    }

    pub fn contains(&self, swarm: SwarmKind, worker_id: &WorkerId) -> bool {
        self.members(swarm).contains(worker_id)
    }

    /// Swarms `worker_id` belongs to, in pipeline order.
    pub fn swarms_of(&self, worker_id: &WorkerId) -> Vec<SwarmKind> {
        SwarmKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind, worker_id))
            .collect()
    }

    /// Member count for every swarm, including empty ones.
    pub fn counts(&self) -> BTreeMap<SwarmKind, usize> {
        SwarmKind::ALL
            .into_iter()
            .map(|kind| (kind, self.members(kind).len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swarm_names() {
        assert_eq!("safety".parse::<SwarmKind>().unwrap(), SwarmKind::Safety);
        let err = "marketing".parse::<SwarmKind>().unwrap_err();
        assert_eq!(err, UnknownSwarm("marketing".to_string()));
        assert!("Research".parse::<SwarmKind>().is_err());
    }

    #[test]
    fn test_unavailable_messages() {
        assert_eq!(
            SwarmKind::Research.unavailable_message(),
            "No research agents available"
        );
        assert_eq!(
            SwarmKind::Distribution.unavailable_message(),
            "No distribution agents available"
        );
    }

    #[test]
    fn test_membership_dedup_within_swarm_only() {
        let mut membership = SwarmMembership::new();
        let id = WorkerId::new("analyst_001");

        assert!(membership.add(SwarmKind::Research, id.clone()));
        assert!(!membership.add(SwarmKind::Research, id.clone()));
        assert!(membership.add(SwarmKind::Content, id.clone()));

        assert_eq!(membership.members(SwarmKind::Research).len(), 1);
        assert_eq!(
            membership.swarms_of(&id),
            vec![SwarmKind::Research, SwarmKind::Content]
        );
        assert!(membership.is_empty(SwarmKind::Safety));
    }

    #[test]
    fn test_counts_cover_all_swarms() {
        let mut membership = SwarmMembership::new();
        membership.add(SwarmKind::Safety, WorkerId::new("a"));
        membership.add(SwarmKind::Safety, WorkerId::new("b"));

        let counts = membership.counts();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&SwarmKind::Safety], 2);
        assert_eq!(counts[&SwarmKind::Research], 0);
    }
}
