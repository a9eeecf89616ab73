//! Ensemble: consult every model on the same history, then vote.
//!
//! Models run in parallel on the rayon pool; all of them finish before scoring.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::aggregator::{signals_of, SignalAggregator, Tally, WeightTable};
use crate::domain::{ModelId, Opinion, Signal, Threshold};
use crate::error::ConfigError;
use crate::indicators::EnrichedBar;
use crate::models::oscillator::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};
use crate::models::volatility::DEFAULT_SELL_ABOVE;
use crate::models::{
    consult, AutoregressiveModel, OscillatorModel, PricePredictor, SequenceModel, SignalModel,
    VolatilityModel,
};

/// Tunables for the standard four-model ensemble.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub weights: WeightTable,
    pub threshold: Threshold,
    pub oversold: f64,
    pub overbought: f64,
    pub sell_above: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            threshold: Threshold::default(),
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
            sell_above: DEFAULT_SELL_ABOVE,
        }
    }
}

/// Result of one live decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub signal: Signal,
    pub opinions: BTreeMap<ModelId, Opinion>,
    pub tally: Tally,
}

impl Decision {
    pub fn degraded_models(&self) -> impl Iterator<Item = ModelId> + '_ {
        self.opinions
            .iter()
            .filter(|(_, o)| o.is_degraded())
            .map(|(m, _)| *m)
    }
}

pub struct Ensemble {
    models: Vec<Box<dyn SignalModel>>,
    aggregator: SignalAggregator,
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("models", &self.model_ids())
            .field("weights", self.aggregator.weights())
            .finish()
    }
}

impl Ensemble {
    /// Every model must be distinct and carry a weight.
    pub fn new(models: Vec<Box<dyn SignalModel>>, weights: WeightTable) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for model in &models {
            if !seen.insert(model.id()) {
                return Err(ConfigError::DuplicateModel(model.id()));
            }
        }
        weights.check_covers(seen)?;
        Ok(Self {
            models,
            aggregator: SignalAggregator::new(weights),
        })
    }

    /// The four bundled adapters with `predictor` driving the sequence model.
    pub fn standard(
        predictor: Arc<dyn PricePredictor>,
        settings: ModelSettings,
    ) -> Result<Self, ConfigError> {
        let models: Vec<Box<dyn SignalModel>> = vec![
            Box::new(SequenceModel::new(predictor, settings.threshold)),
            Box::new(AutoregressiveModel::new()),
            Box::new(VolatilityModel::new(settings.sell_above)?),
            Box::new(OscillatorModel::new(settings.oversold, settings.overbought)?),
        ];
        Self::new(models, settings.weights)
    }

    pub fn model_ids(&self) -> Vec<ModelId> {
        self.models.iter().map(|m| m.id()).collect()
    }

    /// Longest history any model needs before it votes.
    pub fn required_history(&self) -> usize {
        self.models.iter().map(|m| m.min_history()).max().unwrap_or(0)
    }

    pub fn opinions(&self, history: &[EnrichedBar]) -> BTreeMap<ModelId, Opinion> {
        self.models
            .par_iter()
            .map(|model| (model.id(), consult(model.as_ref(), history)))
            .collect()
    }

    pub fn decide(&self, history: &[EnrichedBar]) -> Decision {
        let opinions = self.opinions(history);
        let signals = signals_of(&opinions);
        let tally = self.aggregator.tally(&signals);
        let signal = tally.decision();
        tracing::debug!(
            %signal,
            buy = tally.buy_score,
            sell = tally.sell_score,
            degraded = opinions.values().filter(|o| o.is_degraded()).count(),
            "ensemble decision"
        );
        Decision {
            signal,
            opinions,
            tally,
        }
    }
}
