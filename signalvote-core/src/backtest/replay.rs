//! Historical replay: enrich → predict → derive signals → simulate.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::derive::{derive_signals, SignalCounts};
use super::simulator::{validate_series, BacktestResult, Simulator};
use crate::domain::{PredictedPricePoint, PricePoint, Threshold};
use crate::error::{ConfigError, EngineError};
use crate::indicators::{enrich, EnrichedBar};
use crate::models::PricePredictor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub result: BacktestResult,
    pub signals: SignalCounts,
    /// Enriched rows fed to the simulator.
    pub rows_used: usize,
    /// Windows where the predictor failed and the bar held instead.
    pub degraded_predictions: usize,
}

/// Predictions from sliding windows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRun {
    pub predictions: Vec<PredictedPricePoint>,
    pub degraded: usize,
}

/// Predict the close of every bar `i >= window_length` from bars `[i - window_length, i)`.
pub fn predict_series(
    bars: &[EnrichedBar],
    window_length: usize,
    predictor: &dyn PricePredictor,
) -> PredictionRun {
    if window_length == 0 || bars.len() <= window_length {
        return PredictionRun::default();
    }

    let outcomes: Vec<_> = (window_length..bars.len())
        .into_par_iter()
        .map(|i| {
            let window = &bars[i - window_length..i];
            (bars[i].point.date, predictor.predict_next_close(window))
        })
        .collect();

    let mut run = PredictionRun::default();
    for (date, outcome) in outcomes {
        match outcome {
            Ok(Some(predicted_close)) => run.predictions.push(PredictedPricePoint {
                date,
                predicted_close,
            }),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(%date, error = %e, "prediction failed, bar holds");
                run.degraded += 1;
            }
        }
    }
    if run.degraded > 0 {
        tracing::warn!(
            predictor = predictor.name(),
            degraded = run.degraded,
            "some prediction windows failed"
        );
    }
    run
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Replay {
    window_length: usize,
    threshold: Threshold,
    simulator: Simulator,
}

impl Replay {
    pub fn new(
        window_length: usize,
        threshold: Threshold,
        simulator: Simulator,
    ) -> Result<Self, ConfigError> {
        if window_length == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self {
            window_length,
            threshold,
            simulator,
        })
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Replay `raw` with predictions produced by `predictor`.
    ///
    /// The predictor's own window length must equal the replay's.
    pub fn run(
        &self,
        raw: &[PricePoint],
        predictor: &dyn PricePredictor,
    ) -> Result<ReplayOutcome, EngineError> {
        if predictor.window_length() != self.window_length {
            return Err(ConfigError::WindowMismatch {
                replay: self.window_length,
                predictor: predictor.window_length(),
            }
            .into());
        }
        let bars = self.prepare(raw)?;
        let run = predict_series(&bars, self.window_length, predictor);
        self.finish(&bars, &run.predictions, run.degraded)
    }

    /// Replay `raw` with predictions computed elsewhere.
    ///
    /// Predictions dated inside the first window are ignored.
    pub fn run_with_predictions(
        &self,
        raw: &[PricePoint],
        predictions: &[PredictedPricePoint],
    ) -> Result<ReplayOutcome, EngineError> {
        let bars = self.prepare(raw)?;
        let usable: Vec<PredictedPricePoint> = match bars.get(self.window_length) {
            Some(first) => predictions
                .iter()
                .filter(|p| p.date >= first.point.date)
                .copied()
                .collect(),
            None => Vec::new(),
        };
        self.finish(&bars, &usable, 0)
    }

    fn prepare(&self, raw: &[PricePoint]) -> Result<Vec<EnrichedBar>, EngineError> {
        validate_series(raw)?;
        let bars = enrich(raw);
        // predictions start at index `window_length`
        if bars.len() <= self.window_length {
            return Err(EngineError::InsufficientData {
                required: self.window_length + 1,
                available: bars.len(),
            });
        }
        Ok(bars)
    }

    fn finish(
        &self,
        bars: &[EnrichedBar],
        predictions: &[PredictedPricePoint],
        degraded_predictions: usize,
    ) -> Result<ReplayOutcome, EngineError> {
        let points: Vec<PricePoint> = bars.iter().map(|b| b.point.clone()).collect();
        let signals = derive_signals(&points, predictions, self.threshold);
        let counts: SignalCounts = signals.iter().collect();
        let series: Vec<(PricePoint, _)> = points.into_iter().zip(signals).collect();
        let result = self.simulator.simulate(&series)?;

        tracing::info!(
            rows = bars.len(),
            buy = counts.buy,
            sell = counts.sell,
            trades = result.trade_count,
            final_value = result.final_value,
            "replay finished"
        );
        Ok(ReplayOutcome {
            result,
            signals: counts,
            rows_used: bars.len(),
            degraded_predictions,
        })
    }
}
