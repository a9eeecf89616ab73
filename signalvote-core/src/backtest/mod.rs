//! Backtest: signal derivation, the trade simulator, its metrics and the replay pipeline.

pub mod derive;
pub mod metrics;
pub mod replay;
pub mod simulator;

pub use derive::{derive_signals, SignalCounts};
pub use replay::{predict_series, PredictionRun, Replay, ReplayOutcome};
pub use simulator::{BacktestResult, SimState, Simulator};
