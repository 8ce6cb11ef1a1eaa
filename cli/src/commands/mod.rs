// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Chimera CLI

pub mod config;
pub mod monitor;
pub mod pipeline;
pub mod status;

pub use self::config::ConfigCommand;
pub use self::monitor::MonitorArgs;
pub use self::pipeline::{PublishArgs, RunArgs, TrendsArgs};
pub use self::status::StatusArgs;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Inline JSON or `@path/to/file.json`.
pub fn parse_input(input: &str) -> Result<Value> {
    match input.strip_prefix('@') {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path))?;
            serde_json::from_str(&content).context("Failed to parse input JSON")
        }
        None => serde_json::from_str(input).context("Failed to parse input JSON"),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialise output")?
    );
    Ok(())
}
