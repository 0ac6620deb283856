use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for dispatching action nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
  /// Maximum number of Transform Service calls in flight at once.
  pub max_concurrency: usize,
  /// Timeout for one action node's round trip (transform plus metadata fetch).
  pub call_timeout_ms: u64,
}

impl OrchestratorConfig {
  pub fn call_timeout(&self) -> Duration {
    Duration::from_millis(self.call_timeout_ms)
  }

  /// Concurrency limit, never below one.
  pub fn permits(&self) -> usize {
    self.max_concurrency.max(1)
  }
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      max_concurrency: 8,
      call_timeout_ms: 60_000,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_config_uses_defaults() {
    let config: OrchestratorConfig = serde_json::from_str(r#"{"max_concurrency": 2}"#).unwrap();
    assert_eq!(config.max_concurrency, 2);
    assert_eq!(config.call_timeout_ms, 60_000);
  }

  #[test]
  fn test_zero_concurrency_still_allows_one_call() {
    let config = OrchestratorConfig {
      max_concurrency: 0,
      ..Default::default()
    };
    assert_eq!(config.permits(), 1);
  }
}
