use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::protocol::client::{BridgeOptions, DEFAULT_API_URL, IrisClientError};
use crate::store::{DEFAULT_REFRESH_INTERVAL, StoreConfig};

/// Panel settings, read from an optional JSON file. Missing keys take their
/// default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the bridge-control service.
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub refresh_interval_ms: u64,
    pub debounce_ms: u64,
    /// Idle time before the panel dims.
    pub dim_after_secs: u64,
    /// Idle time before the panel goes dark.
    pub dark_after_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 10,
            refresh_interval_ms: 3000,
            debounce_ms: 150,
            dim_after_secs: 120,
            dark_after_secs: 600,
        }
    }
}

impl Settings {
    /// Reads settings from `path`. An unreadable or invalid file falls back
    /// to the defaults with a warning.
    pub fn load(path: Option<&Path>) -> Settings {
        let Some(path) = path else {
            return Settings::default();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Invalid settings file {}: {e}, using defaults", path.display());
                    Settings::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file {}: {e}, using defaults", path.display());
                Settings::default()
            }
        }
    }

    /// Store timings. A zero refresh interval is replaced by the default.
    pub fn store_config(&self) -> StoreConfig {
        let refresh_interval = if self.refresh_interval_ms == 0 {
            warn!("refresh_interval_ms must be positive, using {DEFAULT_REFRESH_INTERVAL:?}");
            DEFAULT_REFRESH_INTERVAL
        } else {
            Duration::from_millis(self.refresh_interval_ms)
        };
        StoreConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            refresh_interval,
        }
    }

    pub fn bridge_options(&self) -> Result<BridgeOptions, IrisClientError> {
        BridgeOptions::builder()
            .base_url(self.api_url.clone())
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .map_err(|e| IrisClientError::Generic(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_panel_timings() {
        let config = Settings::default().store_config();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iris.json");
        std::fs::write(&path, r#"{"api_url": "http://panel.local:8000", "debounce_ms": 300}"#)
            .unwrap();

        let settings = Settings::load(Some(&path));
        assert_eq!(settings.api_url, "http://panel.local:8000");
        assert_eq!(settings.debounce_ms, 300);
        assert_eq!(settings.refresh_interval_ms, 3000);

        let options = settings.bridge_options().unwrap();
        assert_eq!(options.base_url, "http://panel.local:8000");
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_refresh_interval_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iris.json");
        std::fs::write(&path, r#"{"refresh_interval_ms": 0, "debounce_ms": 0}"#).unwrap();

        let config = Settings::load(Some(&path)).store_config();
        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.debounce, Duration::ZERO);
    }

    #[test]
    fn test_missing_or_invalid_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            Settings::load(Some(&dir.path().join("missing.json"))),
            Settings::default()
        );

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(Some(&path)), Settings::default());
        assert_eq!(Settings::load(None), Settings::default());
    }
}
