use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

/// Shortest summary budget that still leaves room for real words around the
/// ellipsis.
const MIN_SUMMARY_CHARS: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// Master switch; false forces headless mode regardless of platform.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Grace period the surface stays visible after the final snapshot.
    #[serde(default = "default_linger_secs")]
    pub linger_secs: u64,

    /// Display budget for the task summary shown on the surface.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

fn default_enabled() -> bool {
    true
}
fn default_linger_secs() -> u64 {
    8
}
fn default_summary_max_chars() -> usize {
    60
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            linger_secs: default_linger_secs(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

impl SurfaceConfig {
    pub async fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let config_path = dir.as_ref().join("surface.toml");
        if !config_path.exists() {
            info!("No surface.toml found, using default surface settings.");
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(&config_path).await?;
        let mut config: SurfaceConfig = toml::from_str(&content)?;

        if config.summary_max_chars < MIN_SUMMARY_CHARS {
            info!(
                "surface.toml summary_max_chars {} below minimum, using {}",
                config.summary_max_chars,
                default_summary_max_chars()
            );
            config.summary_max_chars = default_summary_max_chars();
        }

        info!(
            "Loaded surface config: enabled={}, linger={}s, summary_max_chars={}",
            config.enabled, config.linger_secs, config.summary_max_chars
        );
        Ok(config)
    }

    pub fn linger(&self) -> Duration {
        Duration::from_secs(self.linger_secs)
    }
}
