//! Fixed-weight voting over model signals.
//!
//! buy_score = Σ weight[m] over models voting BUY, sell_score likewise for SELL.
//! BUY iff buy_score > sell_score, SELL iff sell_score > buy_score, otherwise HOLD.
//! HOLD votes and absent models contribute nothing to either side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ModelId, Opinion, Signal, WeightedOpinion};
use crate::error::ConfigError;

/// Per-model voting weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<ModelId, u32>);

impl WeightTable {
    pub fn new(weights: BTreeMap<ModelId, u32>) -> Self {
        Self(weights)
    }

    pub fn get(&self, model: ModelId) -> Option<u32> {
        self.0.get(&model).copied()
    }

    pub fn set(&mut self, model: ModelId, weight: u32) {
        self.0.insert(model, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, u32)> + '_ {
        self.0.iter().map(|(m, w)| (*m, *w))
    }

    /// Fails on the first model in `models` without an entry.
    pub fn check_covers(&self, models: impl IntoIterator<Item = ModelId>) -> Result<(), ConfigError> {
        for model in models {
            if !self.0.contains_key(&model) {
                return Err(ConfigError::MissingWeight(model));
            }
        }
        Ok(())
    }
}

impl Default for WeightTable {
    /// sequence 3, autoregressive 2, volatility 2, oscillator 1.
    fn default() -> Self {
        [
            (ModelId::Sequence, 3),
            (ModelId::Autoregressive, 2),
            (ModelId::Volatility, 2),
            (ModelId::Oscillator, 1),
        ]
        .into_iter()
        .collect()
    }
}

impl FromIterator<(ModelId, u32)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (ModelId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Weighted score on each side of a vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub buy_score: u64,
    pub sell_score: u64,
}

impl Tally {
    pub fn decision(&self) -> Signal {
        if self.buy_score > self.sell_score {
            Signal::Buy
        } else if self.sell_score > self.buy_score {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    weights: WeightTable,
}

impl SignalAggregator {
    pub fn new(weights: WeightTable) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Attach each vote's weight. Votes from models without a weight are dropped.
    pub fn weighted(&self, signals: &BTreeMap<ModelId, Signal>) -> Vec<WeightedOpinion> {
        signals
            .iter()
            .filter_map(|(&model, &signal)| match self.weights.get(model) {
                Some(weight) => Some(WeightedOpinion {
                    model,
                    signal,
                    weight,
                }),
                None => {
                    tracing::warn!(%model, "opinion from model without a weight ignored");
                    None
                }
            })
            .collect()
    }

    pub fn tally(&self, signals: &BTreeMap<ModelId, Signal>) -> Tally {
        self.weighted(signals)
            .iter()
            .fold(Tally::default(), |mut tally, vote| {
                match vote.signal {
                    Signal::Buy => tally.buy_score += u64::from(vote.weight),
                    Signal::Sell => tally.sell_score += u64::from(vote.weight),
                    Signal::Hold => {}
                }
                tally
            })
    }

    /// Merge per-model signals into one decision.
    pub fn aggregate(&self, signals: &BTreeMap<ModelId, Signal>) -> Signal {
        let tally = self.tally(signals);
        let decision = tally.decision();
        tracing::trace!(
            buy = tally.buy_score,
            sell = tally.sell_score,
            %decision,
            "aggregated"
        );
        decision
    }

    /// Same as [`aggregate`](Self::aggregate), for tagged model outcomes.
    pub fn aggregate_opinions(&self, opinions: &BTreeMap<ModelId, Opinion>) -> Signal {
        self.aggregate(&signals_of(opinions))
    }
}

pub fn signals_of(opinions: &BTreeMap<ModelId, Opinion>) -> BTreeMap<ModelId, Signal> {
    opinions.iter().map(|(m, o)| (*m, o.signal())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(entries: &[(ModelId, Signal)]) -> BTreeMap<ModelId, Signal> {
        entries.iter().copied().collect()
    }

    #[test]
    fn heavier_side_wins() {
        let agg = SignalAggregator::default();
        let signals = votes(&[
            (ModelId::Sequence, Signal::Buy),
            (ModelId::Autoregressive, Signal::Sell),
            (ModelId::Volatility, Signal::Sell),
            (ModelId::Oscillator, Signal::Hold),
        ]);
        assert_eq!(
            agg.tally(&signals),
            Tally {
                buy_score: 3,
                sell_score: 4
            }
        );
        assert_eq!(agg.aggregate(&signals), Signal::Sell);
    }

    #[test]
    fn tie_holds() {
        let agg = SignalAggregator::default();
        let signals = votes(&[
            (ModelId::Sequence, Signal::Buy),
            (ModelId::Autoregressive, Signal::Sell),
            (ModelId::Volatility, Signal::Sell),
            (ModelId::Oscillator, Signal::Buy),
        ]);
        assert_eq!(agg.aggregate(&signals), Signal::Hold);
    }

    #[test]
    fn missing_models_count_as_hold() {
        let agg = SignalAggregator::default();
        assert_eq!(agg.aggregate(&BTreeMap::new()), Signal::Hold);
        let signals = votes(&[(ModelId::Oscillator, Signal::Sell)]);
        assert_eq!(agg.aggregate(&signals), Signal::Sell);
    }

    #[test]
    fn unweighted_model_contributes_nothing() {
        let agg = SignalAggregator::new([(ModelId::Sequence, 1)].into_iter().collect());
        let signals = votes(&[
            (ModelId::Sequence, Signal::Buy),
            (ModelId::Volatility, Signal::Sell),
        ]);
        assert_eq!(agg.weighted(&signals).len(), 1);
        assert_eq!(agg.aggregate(&signals), Signal::Buy);
    }

    #[test]
    fn zero_weight_never_decides() {
        let agg = SignalAggregator::new([(ModelId::Oscillator, 0)].into_iter().collect());
        let signals = votes(&[(ModelId::Oscillator, Signal::Buy)]);
        assert_eq!(agg.aggregate(&signals), Signal::Hold);
    }

    #[test]
    fn degraded_opinions_score_as_hold() {
        let agg = SignalAggregator::default();
        let opinions: BTreeMap<ModelId, Opinion> = [
            (ModelId::Sequence, Opinion::degraded("timeout")),
            (ModelId::Oscillator, Opinion::voted(Signal::Buy)),
        ]
        .into_iter()
        .collect();
        assert_eq!(agg.aggregate_opinions(&opinions), Signal::Buy);
    }

    #[test]
    fn coverage_check() {
        let table: WeightTable = [(ModelId::Sequence, 3)].into_iter().collect();
        assert!(table.check_covers([ModelId::Sequence]).is_ok());
        assert_eq!(
            table.check_covers(ModelId::ALL),
            Err(ConfigError::MissingWeight(ModelId::Autoregressive))
        );
        assert!(WeightTable::default().check_covers(ModelId::ALL).is_ok());
    }

    #[test]
    fn weight_table_reads_snake_case_keys() {
        let table: WeightTable =
            serde_json::from_str(r#"{"sequence": 5, "oscillator": 0}"#).unwrap();
        assert_eq!(table.get(ModelId::Sequence), Some(5));
        assert_eq!(table.get(ModelId::Oscillator), Some(0));
        assert_eq!(table.get(ModelId::Volatility), None);
    }
}
