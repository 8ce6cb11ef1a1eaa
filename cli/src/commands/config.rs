// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use chimera_core::domain::node_config::NodeConfigManifest;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./chimera-config.yaml)
        #[arg(short, long, default_value = "./chimera-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

fn load(config_path: Option<PathBuf>) -> Result<NodeConfigManifest> {
    NodeConfigManifest::load_or_default(config_path).context("Failed to load configuration")
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. CHIMERA_CONFIG_PATH: {}",
            std::env::var("CHIMERA_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./chimera-config.yaml");
        println!("  4. ~/.chimera/config.yaml");
        println!("  5. /etc/chimera/config.yaml");
        println!();
    }

    let config = load(config_override)?;

    if as_yaml {
        print!(
            "{}",
            serde_yaml::to_string(&config).context("Failed to serialise configuration")?
        );
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Node:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    let pipeline = &config.spec.pipeline;
    println!("{}", "Pipeline:".bold());
    println!("  Platforms: {}", pipeline.default_platforms.join(", "));
    println!("  Content: {} for {}", pipeline.content_type, pipeline.content_platform);
    println!("  Default timeframe: {}", pipeline.default_timeframe);
    println!("  Human approval required: {}", pipeline.human_approval_required);
    println!("  Policy check: {}", pipeline.policy_check);
    println!();

    let monitoring = &config.spec.monitoring;
    println!("{}", "Monitoring:".bold());
    println!("  Interval: {}s", monitoring.interval_seconds);
    println!("  Keywords: {}", monitoring.keywords.join(", "));
    println!(
        "  Thresholds: volume > {}, |sentiment| > {}",
        monitoring.thresholds.high_volume, monitoring.thresholds.strong_sentiment
    );
    println!();

    let logging = config.logging();
    println!("{}", "Logging:".bold());
    println!("  Level: {}", logging.level);
    println!("  Format: {}", logging.format);
    if let Some(file) = &logging.file {
        println!("  File: {}", file);
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = load(config_path)?;
    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = NodeConfigManifest::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_writes_minimal_template() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chimera-config.yaml");

        generate(output.clone(), false).await.unwrap();

        let written = NodeConfigManifest::from_yaml_file(&output).unwrap();
        assert_eq!(written.metadata.name, "chimera-node");
    }
}
