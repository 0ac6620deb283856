use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use weft_orchestrator::OrchestratorConfig;

/// File name of the optional settings document inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// CLI settings, read from `<data-dir>/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Base URL of the Transform Service.
  pub service_url: String,
  pub orchestrator: OrchestratorConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      service_url: DEFAULT_SERVICE_URL.to_string(),
      orchestrator: OrchestratorConfig::default(),
    }
  }
}

impl Settings {
  /// Load settings from the data directory, falling back to defaults when no
  /// config file exists.
  pub fn load(data_dir: &Path) -> Result<Self> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse config file: {}", path.display()))
  }

  /// Apply command-line overrides.
  pub fn with_service_url(mut self, service_url: Option<String>) -> Self {
    if let Some(url) = service_url {
      self.service_url = url;
    }
    self
  }
}
