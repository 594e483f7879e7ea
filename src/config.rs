// src/config.rs

//! Defines the configuration structures for `render-pump`.
//!
//! The configuration is read once, from the JSON file named by the
//! `RENDER_PUMP_CONFIG` environment variable, and published as the immutable
//! process-wide [`CONFIG`]. Every section carries `#[serde(default)]`, so a
//! file only needs to name the values it changes.

use anyhow::Context;
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::Rgba;
use crate::keys::KeySymbol;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "RENDER_PUMP_CONFIG";

/// The process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Native window settings.
    pub window: WindowConfig,
    /// Render worker settings.
    pub render: RenderConfig,
    /// Pump thread settings.
    pub pump: PumpConfig,
}

impl Config {
    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Invalid configuration JSON")
    }

    /// Loads the file named by `RENDER_PUMP_CONFIG`, falling back to the
    /// defaults when the variable is unset or the file is unusable.
    pub fn load_or_default() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            info!("{} not set, using default configuration.", CONFIG_ENV_VAR);
            return Config::default();
        };
        match Config::load(Path::new(&path)) {
            Ok(config) => {
                info!("Configuration loaded from {:?}.", path);
                config
            }
            Err(e) => {
                warn!("{:#}. Using default configuration.", e);
                Config::default()
            }
        }
    }
}

// --- Window Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial client area width in pixels.
    pub width: u32,
    /// Initial client area height in pixels.
    pub height: u32,
    /// Use the headless window even when a native one is available.
    pub headless: bool,
    /// Presented frames after which the headless window asks to close.
    /// Zero means never.
    pub headless_frame_limit: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "render-pump".to_string(),
            width: 1024,
            height: 768,
            headless: false,
            headless_frame_limit: 120,
        }
    }
}

// --- Render Configuration ---

/// How the window pump and the render worker are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThreadingMode {
    /// Pump on the main thread, rendering on a dedicated worker thread.
    #[default]
    Dual,
    /// Pump and rendering interleaved on the main thread.
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clear colour of the default view, `0xRRGGBBAA`.
    pub clear_color: Rgba,
    pub vsync: bool,
    /// Key that flips the statistics overlay on press.
    pub stats_toggle_key: KeySymbol,
    pub threading: ThreadingMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            clear_color: Rgba(0x303030ff),
            vsync: true,
            stats_toggle_key: KeySymbol::F1,
            threading: ThreadingMode::Dual,
        }
    }
}

// --- Pump Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// A pressed Escape key asks the window to close.
    pub close_on_escape: bool,
    /// Treat "no context" while running as a close request.
    pub exit_when_worker_gone: bool,
    /// Sleep between service calls while draining, in microseconds.
    pub drain_idle_sleep_us: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        PumpConfig {
            close_on_escape: true,
            exit_when_worker_gone: true,
            drain_idle_sleep_us: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.render.clear_color, Rgba(0x303030ff));
        assert_eq!(config.render.stats_toggle_key, KeySymbol::F1);
        assert_eq!(config.render.threading, ThreadingMode::Dual);
        assert!(config.pump.close_on_escape);
        assert_eq!(config.pump.drain_idle_sleep_us, 100);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_json(
            r##"{
                "window": { "title": "demo", "headless": true },
                "render": { "clear_color": "#102030ff", "threading": "single",
                            "stats_toggle_key": "F2" }
            }"##,
        )
        .unwrap();
        assert_eq!(config.window.title, "demo");
        assert!(config.window.headless);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.render.clear_color, Rgba(0x102030ff));
        assert_eq!(config.render.threading, ThreadingMode::Single);
        assert_eq!(config.render.stats_toggle_key, KeySymbol::F2);
        assert!(config.render.vsync);
        assert_eq!(config.pump, PumpConfig::default());
    }

    #[test]
    fn unknown_threading_mode_is_rejected() {
        let err = Config::from_json(r#"{ "render": { "threading": "triple" } }"#);
        assert!(err.is_err());
    }

    #[test]
    fn load_reads_a_file_and_reports_missing_ones() {
        let path = std::env::temp_dir().join(format!(
            "render-pump-config-test-{}.json",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{ "pump": {{ "drain_idle_sleep_us": 5 }} }}"#).unwrap();
        drop(file);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pump.drain_idle_sleep_us, 5);
        std::fs::remove_file(&path).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
