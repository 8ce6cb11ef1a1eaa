// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Chimera CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** In-process node assembly, stand-in workers, and the
//!   command handlers behind the `chimera` binary

pub mod commands;
pub mod embedded;
pub mod workers;
