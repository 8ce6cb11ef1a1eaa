// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `chimera-swarm`: Phased Pipeline Supervision
//!
//! Groups workers into the four pipeline swarms and sequences them.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `SwarmKind`, `SwarmMembership`, phase result types |
//! | [`application`] | Application | `Supervisor`, `TrendMonitor` |
//!
//! ## Key Concepts
//!
//! - **Swarm**: the set of workers serving one phase (research, content,
//!   safety, distribution).
//! - **Soft failure**: a phase whose swarm is empty reports
//!   `{"error": "No <swarm> agents available"}` instead of failing the run.
//! - **Gating**: distribution is skipped unless every safety worker approved.

pub mod domain;
pub mod application;

pub use domain::*;
