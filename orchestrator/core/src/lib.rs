// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `chimera-core`: Worker Runtime & Registry
//!
//! The leaf layer of the content pipeline: the [`Worker`](domain::worker::Worker)
//! capability, the task/envelope model, the lifecycle wrapper that turns every
//! handler failure into data, and the registry that dispatches to workers.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Worker`, `Task`, `TaskOutcome`, health/status snapshots, events, node config |
//! | [`application`] | Application | `WorkerRuntime`, `WorkerRegistry` |
//! | [`infrastructure`] | Infrastructure | In-memory `EventBus` |

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
