// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod worker;
pub mod task;
pub mod health;
pub mod events;
pub mod node_config;
