// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Chimera CLI
//!
//! The `chimera` binary assembles an in-process node (event bus, worker
//! registry, supervisor, and stand-in workers for every swarm) and drives the
//! content pipeline from the command line.
//!
//! ## Commands
//!
//! - `chimera run --topic T [--keyword K]... [--watch]` - Full pipeline
//! - `chimera trends --topic T [--keyword K]...` - Research phase only
//! - `chimera publish --input JSON|@file` - Safety and distribution
//! - `chimera status` - Worker states and health
//! - `chimera monitor [--iterations N]` - Background trend monitoring
//! - `chimera config show|validate|generate` - Configuration management
//!
//! Results go to stdout as JSON; logs and progress go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use chimera_core::domain::node_config::{LoggingConfig, NodeConfigManifest};
use chimera_orchestrator::commands::{
    self, ConfigCommand, MonitorArgs, PublishArgs, RunArgs, StatusArgs, TrendsArgs,
};
use chimera_orchestrator::embedded::EmbeddedNode;

/// Chimera - Swarm-coordinated content pipeline
#[derive(Parser)]
#[command(name = "chimera")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CHIMERA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CHIMERA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true, env = "CHIMERA_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full research → content → safety → distribution pipeline
    #[command(name = "run")]
    Run(RunArgs),

    /// Run the research phase only
    #[command(name = "trends")]
    Trends(TrendsArgs),

    /// Validate a content draft and distribute it if approved
    #[command(name = "publish")]
    Publish(PublishArgs),

    /// Show worker status and health
    #[command(name = "status")]
    Status(StatusArgs),

    /// Run the trend monitor
    #[command(name = "monitor")]
    Monitor(MonitorArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = effective_logging(cli.config.clone());
    if let Some(level) = cli.log_level {
        logging.level = level;
    }
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    init_logging(&logging)?;

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    match command {
        Commands::Run(args) => commands::pipeline::run(args, &node(cli.config)?).await,
        Commands::Trends(args) => commands::pipeline::trends(args, &node(cli.config)?).await,
        Commands::Publish(args) => commands::pipeline::publish(args, &node(cli.config)?).await,
        Commands::Status(args) => commands::status::status(args, &node(cli.config)?).await,
        Commands::Monitor(args) => commands::monitor::monitor(args, &node(cli.config)?).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

fn node(config_path: Option<PathBuf>) -> Result<EmbeddedNode> {
    EmbeddedNode::load(config_path)
}

/// Logging section of the discovered configuration. A configuration that
/// fails to load falls back to defaults here; the command itself reports the
/// failure.
fn effective_logging(config_path: Option<PathBuf>) -> LoggingConfig {
    NodeConfigManifest::load_or_default(config_path)
        .map(|config| config.logging())
        .unwrap_or_default()
}

/// Initialize tracing subscriber for logging
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&logging.level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file = match &logging.file {
        Some(path) => Some(Mutex::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?,
        )),
        None => None,
    };

    match (logging.format.as_str(), file) {
        ("json", Some(file)) => builder.json().with_ansi(false).with_writer(file).init(),
        ("json", None) => builder.json().with_writer(std::io::stderr).init(),
        (_, Some(file)) => builder.compact().with_ansi(false).with_writer(file).init(),
        (_, None) => builder.compact().with_writer(std::io::stderr).init(),
    }

    Ok(())
}
