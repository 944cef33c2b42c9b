//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use surge_core::Regime;
use surge_detector::DetectorConfig;
use surge_position::ExitConfig;
use surge_risk::GateConfig;

fn default_symbols() -> Vec<String> {
    vec!["DOGEUSDT".to_string(), "PEPEUSDT".to_string()]
}

fn default_regime_poll_secs() -> u64 {
    5
}

fn default_event_queue_capacity() -> usize {
    1024
}

fn default_tick_queue_capacity() -> usize {
    256
}

fn default_static_regime() -> Regime {
    Regime::Moonshot
}

/// Top-level configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instruments to scan. One worker task per symbol.
    pub symbols: Vec<String>,
    /// How often the engine re-reads the regime source.
    pub regime_poll_secs: u64,
    /// Engine event queue depth.
    pub event_queue_capacity: usize,
    /// Per-worker tick queue depth.
    pub tick_queue_capacity: usize,
    /// Regime assumed by the replay driver (no live regime source).
    pub static_regime: Regime,
    pub detector: DetectorConfig,
    pub gate: GateConfig,
    pub exit: ExitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            regime_poll_secs: default_regime_poll_secs(),
            event_queue_capacity: default_event_queue_capacity(),
            tick_queue_capacity: default_tick_queue_capacity(),
            static_regime: default_static_regime(),
            detector: DetectorConfig::default(),
            gate: GateConfig::default(),
            exit: ExitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if given, else `SURGE_CONFIG`, else
    /// `config/default.toml`, falling back to defaults when no file
    /// exists.
    pub fn load(path: Option<String>) -> AppResult<Self> {
        let config_path = path
            .or_else(|| std::env::var("SURGE_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.symbols.is_empty() {
            return Err(AppError::Config("symbols must not be empty".to_string()));
        }
        if self.regime_poll_secs == 0 {
            return Err(AppError::Config(
                "regime_poll_secs must be positive".to_string(),
            ));
        }
        self.detector.validate().map_err(AppError::Config)?;
        self.gate.validate().map_err(AppError::Config)?;
        self.exit.validate().map_err(AppError::Config)?;
        Ok(())
    }
}
