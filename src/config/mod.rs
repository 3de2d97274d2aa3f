//! Configuration management for the APC looper gateway
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.
//! Every section is optional; a missing file means built-in defaults.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub looper: LooperConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
}

/// MIDI port configuration (case-insensitive substring match)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MidiConfig {
    #[serde(default = "default_port_pattern")]
    pub input_port: String,
    #[serde(default = "default_port_pattern")]
    pub output_port: String,
}

/// SooperLooper and session lister endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LooperConfig {
    #[serde(default = "default_localhost")]
    pub host: String,
    #[serde(default = "default_looper_port")]
    pub port: u16,
    /// Local UDP port feedback is received on
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    #[serde(default = "default_localhost")]
    pub sessions_host: String,
    #[serde(default = "default_sessions_port")]
    pub sessions_port: u16,
}

/// Surface behaviour, hot-reloadable
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SurfaceConfig {
    #[serde(default = "default_knob_steps")]
    pub knob_steps: i32,
    #[serde(default = "default_knob_steps_shifted")]
    pub knob_steps_shifted: i32,
    #[serde(default = "default_latch_hold_ms")]
    pub latch_hold_ms: u64,
    #[serde(default = "default_reassert_interval_ms")]
    pub reassert_interval_ms: u64,
    #[serde(default = "default_auto_update_interval_ms")]
    pub auto_update_interval_ms: u64,
    /// Directory the looper saves/loads `session-NN.slsess` files in
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
    /// Delay before re-handshaking (load) or re-listing (save) after a session pad
    #[serde(default = "default_follow_up_delay_ms")]
    pub follow_up_delay_ms: u64,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: default_port_pattern(),
            output_port: default_port_pattern(),
        }
    }
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            host: default_localhost(),
            port: default_looper_port(),
            local_port: default_local_port(),
            sessions_host: default_localhost(),
            sessions_port: default_sessions_port(),
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            knob_steps: default_knob_steps(),
            knob_steps_shifted: default_knob_steps_shifted(),
            latch_hold_ms: default_latch_hold_ms(),
            reassert_interval_ms: default_reassert_interval_ms(),
            auto_update_interval_ms: default_auto_update_interval_ms(),
            session_dir: default_session_dir(),
            follow_up_delay_ms: default_follow_up_delay_ms(),
        }
    }
}

impl SurfaceConfig {
    pub fn latch_hold(&self) -> Duration {
        Duration::from_millis(self.latch_hold_ms)
    }

    pub fn reassert_interval(&self) -> Duration {
        Duration::from_millis(self.reassert_interval_ms)
    }

    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms)
    }

    /// Full path of the session file for a grid ordinal
    pub fn session_path(&self, file_name: &str) -> String {
        Path::new(&self.session_dir)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file when it exists, otherwise fall back to defaults
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("Config file '{}' not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.input_port.is_empty() {
            anyhow::bail!("MIDI input_port cannot be empty");
        }
        if self.midi.output_port.is_empty() {
            anyhow::bail!("MIDI output_port cannot be empty");
        }

        if self.looper.host.is_empty() {
            anyhow::bail!("looper.host cannot be empty");
        }
        if self.looper.port == 0 || self.looper.sessions_port == 0 {
            anyhow::bail!("looper ports must be non-zero");
        }
        if self.looper.local_port == self.looper.port && is_local(&self.looper.host) {
            anyhow::bail!(
                "looper.local_port {} collides with the looper's own port",
                self.looper.local_port
            );
        }

        let surface = &self.surface;
        if surface.knob_steps < 1 || surface.knob_steps_shifted < 1 {
            anyhow::bail!("knob steps must be at least 1");
        }
        if surface.reassert_interval_ms < 100 {
            anyhow::bail!(
                "reassert_interval_ms {} is too short (minimum 100)",
                surface.reassert_interval_ms
            );
        }
        if surface.auto_update_interval_ms == 0 {
            anyhow::bail!("auto_update_interval_ms must be positive");
        }
        if surface.session_dir.is_empty() {
            anyhow::bail!("session_dir cannot be empty");
        }

        Ok(())
    }
}

fn is_local(host: &str) -> bool {
    matches!(host, "127.0.0.1" | "localhost" | "::1" | "0.0.0.0")
}

// Default value functions
fn default_port_pattern() -> String { "APC Key 25".to_string() }
fn default_localhost() -> String { "127.0.0.1".to_string() }
fn default_looper_port() -> u16 { 9951 }
fn default_local_port() -> u16 { 9952 }
fn default_sessions_port() -> u16 { 1234 }
fn default_knob_steps() -> i32 { 3 }
fn default_knob_steps_shifted() -> i32 { 8 }
fn default_latch_hold_ms() -> u64 { 300 }
fn default_reassert_interval_ms() -> u64 { 2000 }
fn default_auto_update_interval_ms() -> u64 { 100 }
fn default_session_dir() -> String { "sessions".to_string() }
fn default_follow_up_delay_ms() -> u64 { 500 }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_is_all_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.looper.port, 9951);
        assert_eq!(config.surface.knob_steps_shifted, 8);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
looper:
  host: "10.0.0.5"
surface:
  latch_hold_ms: 450
  session_dir: "/home/live/sessions"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.looper.host, "10.0.0.5");
        assert_eq!(config.looper.local_port, 9952);
        assert_eq!(config.surface.latch_hold(), Duration::from_millis(450));
        assert_eq!(
            config.surface.session_path("session-03.slsess"),
            "/home/live/sessions/session-03.slsess"
        );
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.surface.knob_steps = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.looper.local_port = 9951;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.midi.input_port.clear();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");

        let config = AppConfig::load_or_default(&path.to_string_lossy()).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "surface:\n  reassert_interval_ms: 5\n").unwrap();

        assert!(AppConfig::load(&path.to_string_lossy()).await.is_err());
    }
}
