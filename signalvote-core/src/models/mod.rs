//! Model adapters: the four predictors behind one trait.
//!
//! Each adapter inspects an enriched history and emits a single `Signal`. Failures
//! never escape: `consult` turns them into a degraded opinion that scores as HOLD.

pub mod autoregressive;
pub mod oscillator;
pub mod sequence;
pub mod volatility;

pub use autoregressive::AutoregressiveModel;
pub use oscillator::OscillatorModel;
pub use sequence::{LinearTrendPredictor, PricePredictor, SequenceModel, DEFAULT_WINDOW_LENGTH};
pub use volatility::VolatilityModel;

use crate::domain::{ModelId, Opinion, Signal};
use crate::error::ModelError;
use crate::indicators::EnrichedBar;

/// A predictive model that votes BUY/SELL/HOLD on the latest row of a history.
pub trait SignalModel: Send + Sync {
    fn id(&self) -> ModelId;

    /// Rows required before the model will vote; shorter histories hold.
    fn min_history(&self) -> usize;

    /// Vote on the last row of `history`. Only called with at least `min_history` rows.
    fn opinion(&self, history: &[EnrichedBar]) -> Result<Signal, ModelError>;
}

/// Ask `model` for its opinion, absorbing short histories and failures.
pub fn consult(model: &dyn SignalModel, history: &[EnrichedBar]) -> Opinion {
    if history.len() < model.min_history() {
        tracing::debug!(
            model = %model.id(),
            rows = history.len(),
            required = model.min_history(),
            "history too short, holding"
        );
        return Opinion::voted(Signal::Hold);
    }

    match model.opinion(history) {
        Ok(signal) => {
            tracing::debug!(model = %model.id(), %signal, "model voted");
            Opinion::voted(signal)
        }
        Err(e) => {
            tracing::warn!(model = %model.id(), error = %e, "model degraded to HOLD");
            Opinion::degraded(e.to_string())
        }
    }
}

pub(crate) fn history_closes(history: &[EnrichedBar]) -> Vec<f64> {
    history.iter().map(|b| b.point.close).collect()
}

/// Synthetic enriched rows for model tests. Indicator fields are placeholders.
#[cfg(test)]
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<EnrichedBar> {
    crate::indicators::make_points(closes)
        .into_iter()
        .map(|point| EnrichedBar {
            typical_price: point.typical_price(),
            point,
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            atr: 1.0,
            bb_width: 0.1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Signal, ModelError>);

    impl SignalModel for Fixed {
        fn id(&self) -> ModelId {
            ModelId::Volatility
        }
        fn min_history(&self) -> usize {
            3
        }
        fn opinion(&self, _: &[EnrichedBar]) -> Result<Signal, ModelError> {
            self.0.clone()
        }
    }

    #[test]
    fn short_history_votes_hold() {
        let model = Fixed(Ok(Signal::Buy));
        let opinion = consult(&model, &bars_from_closes(&[1.0, 2.0]));
        assert_eq!(opinion, Opinion::voted(Signal::Hold));
    }

    #[test]
    fn passes_through_votes() {
        let model = Fixed(Ok(Signal::Sell));
        let opinion = consult(&model, &bars_from_closes(&[1.0, 2.0, 3.0]));
        assert_eq!(opinion, Opinion::voted(Signal::Sell));
    }

    #[test]
    fn errors_become_degraded() {
        let model = Fixed(Err(ModelError::FitFailed("singular".into())));
        let opinion = consult(&model, &bars_from_closes(&[1.0, 2.0, 3.0]));
        assert!(opinion.is_degraded());
        assert_eq!(opinion.signal(), Signal::Hold);
        match opinion {
            Opinion::Degraded { reason } => assert!(reason.contains("singular")),
            other => panic!("expected degraded, got {other:?}"),
        }
    }
}
