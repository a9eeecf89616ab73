//! Weighted voting: the aggregator itself and the ensemble that feeds it.

pub mod aggregator;
pub mod ensemble;

pub use aggregator::{SignalAggregator, Tally, WeightTable};
pub use ensemble::{Decision, Ensemble, ModelSettings};
