//! TOML configuration for backtests and live decisions.
//!
//! Every section is optional; missing keys take the documented defaults.
//! `validate` runs before any data is loaded.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalvote_core::domain::DEFAULT_THRESHOLD;
use signalvote_core::models::oscillator::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};
use signalvote_core::models::volatility::DEFAULT_SELL_ABOVE;
use signalvote_core::models::DEFAULT_WINDOW_LENGTH;
use signalvote_core::{
    ConfigError, ModelId, ModelSettings, Replay, Simulator, Threshold, WeightTable,
};

/// Errors from reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BacktestSection {
    pub symbols: Vec<String>,
    pub data_dir: PathBuf,
    /// Inclusive lower bound on observation dates.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on observation dates.
    pub end_date: Option<NaiveDate>,
    pub initial_cash: f64,
    /// Minimum relative predicted move that produces BUY/SELL.
    pub threshold: f64,
    /// Rows per prediction window.
    pub window_length: usize,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbols: vec!["AAPL".to_string()],
            data_dir: PathBuf::from("data"),
            start_date: None,
            end_date: None,
            initial_cash: 100_000.0,
            threshold: DEFAULT_THRESHOLD,
            window_length: DEFAULT_WINDOW_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OscillatorSection {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for OscillatorSection {
    fn default() -> Self {
        Self {
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VolatilitySection {
    /// Forecast variance (percent squared) above which the model sells.
    pub sell_above: f64,
}

impl Default for VolatilitySection {
    fn default() -> Self {
        Self {
            sell_above: DEFAULT_SELL_ABOVE,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub backtest: BacktestSection,
    pub weights: WeightTable,
    pub oscillator: OscillatorSection,
    pub volatility: VolatilitySection,
}

impl AppConfig {
    /// Parse and validate.
    pub fn from_toml(s: &str) -> Result<Self, ConfigFileError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulator()?;
        self.threshold()?;
        if self.backtest.window_length == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        self.weights.check_covers(ModelId::ALL)?;
        self.model_settings()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<Threshold, ConfigError> {
        Threshold::new(self.backtest.threshold)
    }

    pub fn simulator(&self) -> Result<Simulator, ConfigError> {
        Simulator::new(self.backtest.initial_cash)
    }

    pub fn replay(&self) -> Result<Replay, ConfigError> {
        Replay::new(self.backtest.window_length, self.threshold()?, self.simulator()?)
    }

    pub fn model_settings(&self) -> Result<ModelSettings, ConfigError> {
        let OscillatorSection {
            oversold,
            overbought,
        } = self.oscillator;
        if !(oversold < overbought) {
            return Err(ConfigError::InvalidBand {
                oversold,
                overbought,
            });
        }
        let sell_above = self.volatility.sell_above;
        if !(sell_above.is_finite() && sell_above > 0.0) {
            return Err(ConfigError::NonPositiveVolatilityCutoff(sell_above));
        }
        Ok(ModelSettings {
            weights: self.weights.clone(),
            threshold: self.threshold()?,
            oversold,
            overbought,
            sell_above,
        })
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    pub fn config_hash(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}
