//! Backtest runner: wires config, data loading, replay and the live ensemble.
//!
//! Entry points:
//! - `run_backtest()`: loads one symbol, then replays it. Used by the CLI.
//! - `run_backtest_from_data()`: replays an already-loaded series.
//! - `run_many()`: independent per-symbol backtests on the rayon pool.
//! - `live_signal()`: one ensemble decision on the latest rows of a series.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalvote_core::backtest::simulator::validate_series;
use signalvote_core::backtest::SignalCounts;
use signalvote_core::models::{LinearTrendPredictor, PricePredictor};
use signalvote_core::{
    enrich, BacktestResult, ConfigError, Decision, EngineError, Ensemble, PredictedPricePoint,
    PricePoint,
};

use crate::config::{AppConfig, ConfigFileError};
use crate::data_loader::{load_symbol, LoadError, LoadOptions, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("config file error: {0}")]
    ConfigFile(#[from] ConfigFileError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything recorded about one symbol's backtest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub start_date: String,
    pub end_date: String,
    /// Name of the predictor, or "file" for pre-computed predictions.
    pub prediction_source: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub threshold: f64,
    pub window_length: usize,
    pub rows_used: usize,
    pub signals: SignalCounts,
    pub degraded_predictions: usize,
    pub result: BacktestResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    pub fn profit_loss(&self) -> f64 {
        self.result.profit_loss()
    }
}

/// Where per-bar predictions come from.
#[derive(Clone)]
pub enum PredictionInput<'a> {
    Model(Arc<dyn PricePredictor>),
    Precomputed(&'a [PredictedPricePoint]),
}

impl PredictionInput<'_> {
    /// The bundled trend predictor sized to the configured window.
    pub fn default_model(config: &AppConfig) -> Self {
        PredictionInput::Model(Arc::new(LinearTrendPredictor::new(
            config.backtest.window_length,
        )))
    }

    fn label(&self) -> String {
        match self {
            PredictionInput::Model(p) => p.name().to_string(),
            PredictionInput::Precomputed(_) => "file".to_string(),
        }
    }
}

pub fn load_options(config: &AppConfig, synthetic: bool) -> LoadOptions {
    LoadOptions {
        data_dir: config.backtest.data_dir.clone(),
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        synthetic,
    }
}

/// Load `symbol` and replay it.
pub fn run_backtest(
    config: &AppConfig,
    symbol: &str,
    input: &PredictionInput<'_>,
    opts: &LoadOptions,
) -> Result<BacktestReport, RunError> {
    let loaded = load_symbol(symbol, opts)?;
    run_backtest_from_data(config, &loaded, input)
}

/// Replay an already-loaded series.
pub fn run_backtest_from_data(
    config: &AppConfig,
    loaded: &LoadedSeries,
    input: &PredictionInput<'_>,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let replay = config.replay()?;

    tracing::info!(
        symbol = %loaded.symbol,
        rows = loaded.points.len(),
        predictions = %input.label(),
        "starting backtest"
    );
    let outcome = match input {
        PredictionInput::Model(predictor) => replay.run(&loaded.points, predictor.as_ref())?,
        PredictionInput::Precomputed(predictions) => {
            replay.run_with_predictions(&loaded.points, predictions)?
        }
    };

    let first = loaded.points.first().map(|p| p.date.to_string()).unwrap_or_default();
    let last = loaded.points.last().map(|p| p.date.to_string()).unwrap_or_default();
    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        symbol: loaded.symbol.clone(),
        start_date: first,
        end_date: last,
        prediction_source: input.label(),
        config_hash: config.config_hash()?,
        dataset_hash: loaded.dataset_hash.clone(),
        synthetic: loaded.is_synthetic(),
        threshold: config.backtest.threshold,
        window_length: config.backtest.window_length,
        rows_used: outcome.rows_used,
        signals: outcome.signals,
        degraded_predictions: outcome.degraded_predictions,
        result: outcome.result,
    })
}

/// Backtest every symbol in parallel. Results keep the input order; one symbol
/// failing does not stop the others.
pub fn run_many(
    config: &AppConfig,
    symbols: &[String],
    input: &PredictionInput<'_>,
    opts: &LoadOptions,
) -> Vec<(String, Result<BacktestReport, RunError>)> {
    symbols
        .par_iter()
        .map(|symbol| {
            let outcome = run_backtest(config, symbol, input, opts);
            if let Err(e) = &outcome {
                tracing::warn!(%symbol, error = %e, "backtest failed");
            }
            (symbol.clone(), outcome)
        })
        .collect()
}

/// Aggregate the four models' opinions on the most recent row of `points`.
pub fn live_signal(
    config: &AppConfig,
    points: &[PricePoint],
    predictor: Arc<dyn PricePredictor>,
) -> Result<Decision, RunError> {
    validate_series(points)?;
    let ensemble = Ensemble::standard(predictor, config.model_settings()?)?;
    let history = enrich(points);
    if history.len() < ensemble.required_history() {
        tracing::info!(
            rows = history.len(),
            required = ensemble.required_history(),
            "history shorter than some models need; they will hold"
        );
    }
    Ok(ensemble.decide(&history))
}
