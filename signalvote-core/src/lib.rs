//! SignalVote Core: signal vocabulary, indicators, model adapters, voting, backtest simulator.
//!
//! This crate is pure computation over in-memory series:
//! - Domain types (signals, opinions, price points, positions, closed trades)
//! - Indicator enrichment (RSI, MACD, ATR, typical price, Bollinger width)
//! - Model adapters behind the `SignalModel` trait, failures degrading to HOLD
//! - Fixed-weight signal aggregation and the parallel model ensemble
//! - Single-position trade simulator folded over a signal series
//! - Prediction-driven replay (enrich → predict → derive → simulate)

pub mod aggregate;
pub mod backtest;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod models;

pub use aggregate::{Decision, Ensemble, ModelSettings, SignalAggregator, Tally, WeightTable};
pub use backtest::{derive_signals, BacktestResult, Replay, ReplayOutcome, Simulator};
pub use domain::{
    ClosedTrade, ModelId, Opinion, Position, PredictedPricePoint, PricePoint, Side, Signal,
    Threshold,
};
pub use error::{ConfigError, EngineError, ModelError};
pub use indicators::{enrich, EnrichedBar};
