// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Node Configuration Types
//
// Defines the configuration schema for a Chimera orchestrator node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Pipeline defaults handed to each phase payload
// - Trend monitoring cadence and alert thresholds
// - Observability (logging) settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "chimera/v1";
pub const KIND: &str = "NodeConfig";

/// Top-level Kubernetes-style node configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigManifest {
    /// API version (must be "chimera/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "NodeConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: NodeConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfigSpec {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub monitoring: MonitoringConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

/// Defaults folded into the supervisor's phase payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target platforms for the distribution phase
    #[serde(default = "default_platforms")]
    pub default_platforms: Vec<String>,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Platform the content phase drafts for
    #[serde(default = "default_content_platform")]
    pub content_platform: String,

    /// Research lookback window (e.g. "7d")
    #[serde(default = "default_timeframe")]
    pub default_timeframe: String,

    #[serde(default = "default_true")]
    pub human_approval_required: bool,

    #[serde(default = "default_true")]
    pub policy_check: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_platforms: default_platforms(),
            content_type: default_content_type(),
            content_platform: default_content_platform(),
            default_timeframe: default_timeframe(),
            human_approval_required: true,
            policy_check: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub thresholds: AlertThresholds,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            keywords: default_keywords(),
            thresholds: AlertThresholds::default(),
        }
    }
}

/// Trend alert thresholds (strictly-greater-than comparisons).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_high_volume")]
    pub high_volume: u64,

    /// Compared against the absolute sentiment score
    #[serde(default = "default_strong_sentiment")]
    pub strong_sentiment: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_volume: default_high_volume(),
            strong_sentiment: default_strong_sentiment(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Append-mode log file (optional, defaults to stderr)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_platforms() -> Vec<String> {
    vec!["youtube".to_string(), "twitter".to_string(), "instagram".to_string()]
}

fn default_content_type() -> String {
    "script".to_string()
}

fn default_content_platform() -> String {
    "youtube".to_string()
}

fn default_timeframe() -> String {
    "7d".to_string()
}

fn default_interval_seconds() -> u64 {
    1800
}

fn default_keywords() -> Vec<String> {
    vec!["AI".to_string(), "Technology".to_string(), "Innovation".to_string()]
}

fn default_high_volume() -> u64 {
    10_000
}

fn default_strong_sentiment() -> f64 {
    0.7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for NodeConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "chimera-node".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: NodeConfigSpec::default(),
        }
    }
}

impl NodeConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. CHIMERA_CONFIG_PATH environment variable
    /// 2. ./chimera-config.yaml (working directory)
    /// 3. ~/.chimera/config.yaml (user home)
    /// 4. /etc/chimera/config.yaml (system, Unix) or C:\ProgramData\Chimera\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CHIMERA_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./chimera-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".chimera").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/chimera/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Chimera\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails hard if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("CHIMERA_LOG_LEVEL") {
            if !level.trim().is_empty() {
                tracing::info!("Environment override: CHIMERA_LOG_LEVEL={}", level);
                self.logging_mut().level = level;
            }
        }

        if let Ok(val) = std::env::var("CHIMERA_HUMAN_APPROVAL_REQUIRED") {
            match parse_bool(&val) {
                Some(flag) => {
                    tracing::info!("Environment override: CHIMERA_HUMAN_APPROVAL_REQUIRED={}", flag);
                    self.spec.pipeline.human_approval_required = flag;
                }
                None => {
                    tracing::warn!(
                        "Invalid value for CHIMERA_HUMAN_APPROVAL_REQUIRED: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Effective logging settings (defaults when the section is absent).
    pub fn logging(&self) -> LoggingConfig {
        self.spec
            .observability
            .as_ref()
            .and_then(|o| o.logging.clone())
            .unwrap_or_default()
    }

    fn logging_mut(&mut self) -> &mut LoggingConfig {
        self.spec
            .observability
            .get_or_insert_with(ObservabilityConfig::default)
            .logging
            .get_or_insert_with(LoggingConfig::default)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let pipeline = &self.spec.pipeline;
        if pipeline.default_platforms.is_empty() {
            anyhow::bail!("spec.pipeline.default_platforms must list at least one platform");
        }
        if pipeline.default_platforms.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("spec.pipeline.default_platforms cannot contain blank names");
        }

        if self.spec.monitoring.interval_seconds == 0 {
            anyhow::bail!("spec.monitoring.interval_seconds must be greater than zero");
        }

        let logging = self.logging();
        if !matches!(logging.format.as_str(), "text" | "json") {
            anyhow::bail!(
                "Invalid log format: '{}'. Must be 'text' or 'json'",
                logging.format
            );
        }

        Ok(())
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = NodeConfigManifest::default();
        assert_eq!(manifest.api_version, "chimera/v1");
        assert_eq!(manifest.kind, "NodeConfig");
        assert_eq!(
            manifest.spec.pipeline.default_platforms,
            vec!["youtube", "twitter", "instagram"]
        );
        assert_eq!(manifest.spec.pipeline.default_timeframe, "7d");
        assert!(manifest.spec.pipeline.human_approval_required);
        assert_eq!(manifest.spec.monitoring.interval_seconds, 1800);
        assert_eq!(manifest.spec.monitoring.thresholds.high_volume, 10_000);
        assert_eq!(manifest.logging().format, "text");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: chimera/v1
kind: NodeConfig
metadata:
  name: studio-a
spec:
  pipeline:
    default_platforms: [youtube]
    human_approval_required: false
  monitoring:
    keywords: [rust]
  observability:
    logging:
      format: json
"#;
        let manifest = NodeConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "studio-a");
        assert_eq!(manifest.spec.pipeline.default_platforms, vec!["youtube"]);
        assert!(!manifest.spec.pipeline.human_approval_required);
        assert!(manifest.spec.pipeline.policy_check);
        assert_eq!(manifest.spec.pipeline.content_type, "script");
        assert_eq!(manifest.spec.monitoring.keywords, vec!["rust"]);
        assert_eq!(manifest.spec.monitoring.interval_seconds, 1800);
        assert_eq!(manifest.logging().format, "json");
        assert_eq!(manifest.logging().level, "info");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut manifest = NodeConfigManifest::default();
        manifest.metadata.name = "edge-1".to_string();
        manifest.spec.monitoring.interval_seconds = 60;
        manifest.to_yaml_file(&path).unwrap();

        let loaded = NodeConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "edge-1");
        assert_eq!(loaded.spec.monitoring.interval_seconds, 60);
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(NodeConfigManifest::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_validation() {
        let mut manifest = NodeConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "WrongKind".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.metadata.name = "".to_string();
        assert!(manifest.validate().is_err());
        manifest.metadata.name = "test-node".to_string();

        manifest.spec.pipeline.default_platforms = vec![];
        assert!(manifest.validate().is_err());
        manifest.spec.pipeline.default_platforms = vec!["youtube".to_string(), " ".to_string()];
        assert!(manifest.validate().is_err());
        manifest.spec.pipeline.default_platforms = vec!["youtube".to_string()];

        manifest.spec.monitoring.interval_seconds = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.monitoring.interval_seconds = 30;

        manifest.logging_mut().format = "xml".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
