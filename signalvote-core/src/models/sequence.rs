//! Sequence model adapter.
//!
//! The predictor is injected: a trained network, a remote service, or the bundled
//! `LinearTrendPredictor`. The adapter only turns the predicted next close into a
//! signal with the same relative-change rule the replay uses.

use std::sync::Arc;

use super::SignalModel;
use crate::domain::{ModelId, Signal, Threshold};
use crate::error::ModelError;
use crate::indicators::EnrichedBar;

pub const DEFAULT_WINDOW_LENGTH: usize = 50;

/// Predicts the next close from a fixed-length window of enriched rows.
pub trait PricePredictor: Send + Sync {
    fn name(&self) -> &str;

    /// Rows per input window.
    fn window_length(&self) -> usize {
        DEFAULT_WINDOW_LENGTH
    }

    /// Predicted close for the row after `window`. `Ok(None)` means the predictor abstains.
    fn predict_next_close(&self, window: &[EnrichedBar]) -> Result<Option<f64>, ModelError>;
}

/// Ordinary least-squares trend over the window closes, extrapolated one step.
#[derive(Debug, Clone)]
pub struct LinearTrendPredictor {
    window_length: usize,
}

impl LinearTrendPredictor {
    pub fn new(window_length: usize) -> Self {
        Self { window_length }
    }
}

impl Default for LinearTrendPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_LENGTH)
    }
}

impl PricePredictor for LinearTrendPredictor {
    fn name(&self) -> &str {
        "linear_trend"
    }

    fn window_length(&self) -> usize {
        self.window_length
    }

    fn predict_next_close(&self, window: &[EnrichedBar]) -> Result<Option<f64>, ModelError> {
        if window.len() < 2 {
            return Ok(None);
        }
        let n = window.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = window.iter().map(|b| b.point.close).sum::<f64>() / n;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (i, bar) in window.iter().enumerate() {
            let dx = i as f64 - x_mean;
            sxy += dx * (bar.point.close - y_mean);
            sxx += dx * dx;
        }
        let slope = sxy / sxx;
        let predicted = y_mean + slope * (n - x_mean);

        if predicted.is_finite() {
            Ok(Some(predicted))
        } else {
            Err(ModelError::InvalidInput(format!(
                "non-finite trend prediction from {} rows",
                window.len()
            )))
        }
    }
}

pub struct SequenceModel {
    predictor: Arc<dyn PricePredictor>,
    threshold: Threshold,
}

impl SequenceModel {
    pub fn new(predictor: Arc<dyn PricePredictor>, threshold: Threshold) -> Self {
        Self {
            predictor,
            threshold,
        }
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }
}

impl SignalModel for SequenceModel {
    fn id(&self) -> ModelId {
        ModelId::Sequence
    }

    fn min_history(&self) -> usize {
        self.predictor.window_length()
    }

    fn opinion(&self, history: &[EnrichedBar]) -> Result<Signal, ModelError> {
        let start = history.len().saturating_sub(self.predictor.window_length());
        let window = &history[start..];
        let Some(last) = window.last() else {
            return Ok(Signal::Hold);
        };
        Ok(match self.predictor.predict_next_close(window)? {
            Some(predicted) => self.threshold.classify(predicted, last.point.close),
            None => Signal::Hold,
        })
    }
}
