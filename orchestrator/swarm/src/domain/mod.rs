// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure data. No I/O, no async.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`swarm`] | `SwarmKind`, `SwarmMembership` |
//! | [`phase`] | `PhaseResult`, `ValidationReport`, `DistributionResult`, `PipelineReport` |

pub mod swarm;
pub mod phase;

pub use phase::*;
pub use swarm::*;
