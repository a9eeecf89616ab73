//! SignalVote Runner: configuration, data loading, backtest orchestration, export.
//!
//! This crate builds on `signalvote-core` to provide:
//! - TOML configuration with validation and a content hash
//! - CSV price/prediction loading with a deterministic synthetic fallback
//! - Single and parallel multi-symbol backtests
//! - Live ensemble decisions on the latest rows of a series
//! - JSON/CSV/Markdown artifacts with schema versioning

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{AppConfig, ConfigFileError};
pub use data_loader::{
    load_predictions, load_prices, load_symbol, DataSource, LoadError, LoadOptions, LoadedSeries,
};
pub use export::{export_json, import_json, render_summary, save_artifacts};
pub use runner::{
    live_signal, load_options, run_backtest, run_backtest_from_data, run_many, BacktestReport,
    PredictionInput, RunError, SCHEMA_VERSION,
};
