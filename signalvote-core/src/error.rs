//! Error types for the engine.
//!
//! - `ConfigError`: rejected before any aggregation or simulation starts.
//! - `EngineError`: surfaced to the caller; no partial result is produced.
//! - `ModelError`: raised inside a model adapter and always recovered at the
//!   adapter boundary as a degraded (HOLD) opinion.

use crate::domain::ModelId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("weight table has no entry for model '{0}'")]
    MissingWeight(ModelId),
    #[error("model '{0}' is registered more than once")]
    DuplicateModel(ModelId),
    #[error("initial cash must be positive, got {0}")]
    NonPositiveCash(f64),
    #[error("signal threshold must be positive, got {0}")]
    NonPositiveThreshold(f64),
    #[error("window length must be at least 1")]
    ZeroWindow,
    #[error("replay window is {replay} rows but the predictor expects {predictor}")]
    WindowMismatch { replay: usize, predictor: usize },
    #[error("oscillator bands are inverted: oversold {oversold} >= overbought {overbought}")]
    InvalidBand { oversold: f64, overbought: f64 },
    #[error("volatility cutoff must be positive, got {0}")]
    NonPositiveVolatilityCutoff(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("insufficient data: need at least {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("series is not in strictly increasing date order at index {index}")]
    OutOfOrder { index: usize },
    #[error("invalid close price {price} at index {index}")]
    InvalidPrice { index: usize, price: f64 },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model fit failed: {0}")]
    FitFailed(String),
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("invalid model input: {0}")]
    InvalidInput(String),
}
