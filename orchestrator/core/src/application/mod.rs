// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod worker_runtime;
pub mod registry;

pub use registry::{RegistryError, WorkerRegistry};
pub use worker_runtime::WorkerRuntime;
