// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Trend monitoring loop
//!
//! Runs until Ctrl-C or until the requested number of cycles has completed.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use chimera_core::domain::node_config::AlertThresholds;
use chimera_swarm::application::MonitorStart;

use super::print_json;
use crate::embedded::EmbeddedNode;

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Seconds between research cycles (default: from configuration)
    #[arg(long, value_name = "SECONDS")]
    pub interval_seconds: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, value_name = "N")]
    pub iterations: Option<u64>,

    /// Override the high-volume alert threshold
    #[arg(long)]
    pub high_volume: Option<u64>,

    /// Override the strong-sentiment alert threshold
    #[arg(long)]
    pub strong_sentiment: Option<f64>,
}

pub async fn monitor(args: MonitorArgs, node: &EmbeddedNode) -> Result<()> {
    let mut monitor = node.trend_monitor();
    if let Some(seconds) = args.interval_seconds {
        if seconds == 0 {
            bail!("--interval-seconds must be greater than zero");
        }
        monitor = monitor.with_interval(Duration::from_secs(seconds));
    }
    if let Some(iterations) = args.iterations {
        monitor = monitor.with_max_cycles(iterations);
    }
    let monitor = Arc::new(monitor);

    if args.high_volume.is_some() || args.strong_sentiment.is_some() {
        let current = monitor.thresholds();
        monitor.set_thresholds(AlertThresholds {
            high_volume: args.high_volume.unwrap_or(current.high_volume),
            strong_sentiment: args.strong_sentiment.unwrap_or(current.strong_sentiment),
        });
    }

    let MonitorStart::Started(mut handle) = monitor.clone().start() else {
        bail!("Trend monitor is already running");
    };
    eprintln!("{}", "Trend monitoring started (Ctrl-C to stop)".green());

    tokio::select! {
        joined = &mut handle => {
            joined.context("Trend monitor task failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Ctrl-C received, stopping trend monitor");
            monitor.stop();
            handle.await.context("Trend monitor task failed")?;
        }
    }

    let alerts = monitor.alerts();
    eprintln!("{} alert(s) recorded", alerts.len());
    print_json(&alerts)
}
