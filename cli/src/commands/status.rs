// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Worker status and health overview

use anyhow::Result;
use clap::Args;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::collections::BTreeMap;

use chimera_core::domain::health::{HealthState, StatusSnapshot, SystemHealthReport};
use chimera_swarm::domain::SwarmKind;

use super::print_json;
use crate::embedded::EmbeddedNode;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print machine-readable JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusDocument {
    swarms: BTreeMap<SwarmKind, usize>,
    workers: Vec<StatusSnapshot>,
    health: SystemHealthReport,
}

pub async fn status(args: StatusArgs, node: &EmbeddedNode) -> Result<()> {
    let registry = node.registry();
    let mut statuses = registry.all_statuses();
    let workers: Vec<StatusSnapshot> = registry
        .worker_ids()
        .iter()
        .filter_map(|id| statuses.remove(id))
        .collect();
    let health = registry.perform_health_check();
    let swarms = node.supervisor().swarm_overview();

    if args.json {
        return print_json(&StatusDocument {
            swarms,
            workers,
            health,
        });
    }

    println!("{}", "Swarms:".bold());
    for (swarm, count) in &swarms {
        println!("  {:<14} {} worker(s)", swarm.to_string(), count);
    }
    println!();

    println!("{}", "Workers:".bold());
    for report in &health.workers {
        println!(
            "  {:<20} {:<10} {}",
            report.worker_id.to_string(),
            report.state.to_string(),
            format_health(report.health)
        );
    }
    println!();
    println!(
        "Overall health: {} ({} workers)",
        format_health(health.overall_health),
        health.total_workers
    );

    Ok(())
}

fn format_health(health: HealthState) -> ColoredString {
    match health {
        HealthState::Healthy => "healthy".green(),
        HealthState::Degraded => "degraded".yellow(),
        HealthState::Unhealthy => "unhealthy".red(),
    }
}
