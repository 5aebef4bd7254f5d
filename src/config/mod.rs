// ABOUTME: Daemon configuration and per-project pipeline configuration.
// ABOUTME: Both are YAML; secrets can be supplied via environment variables.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable overriding the webhook secret from the config file.
pub const WEBHOOK_SECRET_ENV: &str = "SLIPWAY_WEBHOOK_SECRET";
/// Environment variable overriding the notification webhook URL.
pub const SLACK_WEBHOOK_ENV: &str = "SLIPWAY_SLACK_WEBHOOK_URL";

/// Filename of the per-project pipeline configuration, looked up in the
/// project's checkout directory.
pub const PIPELINE_FILE: &str = ".slipway.yml";

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_runtime_socket() -> String {
    "/var/run/docker.sock".to_string()
}

/// Daemon-level configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Address the webhook listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Unix socket of the container engine.
    #[serde(default = "default_runtime_socket")]
    pub runtime_socket: String,

    /// Directory containing project checkouts, one per `owner/repo`.
    pub projects_dir: PathBuf,

    /// Directory run reports are persisted under.
    pub logs_dir: PathBuf,

    /// Shared secret for webhook signature verification. Requests are
    /// rejected when unset.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Optional Slack-style incoming webhook for run notifications.
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
}

impl AppConfig {
    /// Load the daemon configuration from a YAML file, then apply
    /// environment overrides for secrets.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_yaml::from_str(&text)?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(WEBHOOK_SECRET_ENV)
            && !secret.is_empty()
        {
            self.webhook_secret = Some(secret);
        }
        if let Ok(url) = std::env::var(SLACK_WEBHOOK_ENV)
            && !url.is_empty()
        {
            self.slack_webhook_url = Some(url);
        }
    }

    /// Checkout directory for a project, keyed by lowercased `owner/repo`.
    pub fn project_dir(&self, full_name: &str) -> PathBuf {
        self.projects_dir.join(full_name.to_lowercase())
    }
}

/// One discrete phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Test,
    Build,
    Deploy,
    ComposeBuildDeploy,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Test => "test",
            StageKind::Build => "build",
            StageKind::Deploy => "deploy",
            StageKind::ComposeBuildDeploy => "compose-build-deploy",
        };
        write!(f, "{}", name)
    }
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Per-project pipeline configuration.
///
/// Resolved from the project's `.slipway.yml`. The stage list is
/// structurally non-empty: an empty list fails deserialization, which is
/// the only validation the core applies to this otherwise opaque input.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Ordered stages to execute.
    pub stages: NonEmpty<StageKind>,

    /// Compose file for the compose-build-deploy stage, relative to the
    /// project directory.
    #[serde(default)]
    pub compose_file: Option<String>,

    /// How long to wait for the old container during a deploy swap.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,
}

impl PipelineConfig {
    /// Resolve the pipeline configuration from a project directory.
    pub fn discover(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(PIPELINE_FILE);
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path));
        }
        let text = std::fs::read_to_string(&path)?;
        Self::parse(&text)
    }

    /// Parse a pipeline configuration document.
    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", PIPELINE_FILE, e)))
    }

    /// The configuration used by the compose entrypoint: a single
    /// compose-build-deploy stage, keeping any compose file and timeout
    /// from the resolved configuration.
    pub fn compose_only(self) -> Self {
        Self {
            stages: NonEmpty::new(StageKind::ComposeBuildDeploy),
            ..self
        }
    }
}
