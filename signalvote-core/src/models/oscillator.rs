//! Momentum-oscillator rule on the latest RSI.

use super::SignalModel;
use crate::domain::{ModelId, Signal};
use crate::error::{ConfigError, ModelError};
use crate::indicators::enrich::RSI_PERIOD;
use crate::indicators::EnrichedBar;

pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct OscillatorModel {
    oversold: f64,
    overbought: f64,
}

impl OscillatorModel {
    pub fn new(oversold: f64, overbought: f64) -> Result<Self, ConfigError> {
        if oversold >= overbought || !oversold.is_finite() || !overbought.is_finite() {
            return Err(ConfigError::InvalidBand {
                oversold,
                overbought,
            });
        }
        Ok(Self {
            oversold,
            overbought,
        })
    }
}

impl Default for OscillatorModel {
    fn default() -> Self {
        Self {
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
        }
    }
}

impl SignalModel for OscillatorModel {
    fn id(&self) -> ModelId {
        ModelId::Oscillator
    }

    fn min_history(&self) -> usize {
        RSI_PERIOD
    }

    fn opinion(&self, history: &[EnrichedBar]) -> Result<Signal, ModelError> {
        let rsi = history.last().map_or(f64::NAN, |b| b.rsi);
        Ok(if rsi < self.oversold {
            Signal::Buy
        } else if rsi > self.overbought {
            Signal::Sell
        } else {
            // also covers NaN
            Signal::Hold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bars_from_closes;

    fn history_with_rsi(rsi: f64) -> Vec<EnrichedBar> {
        let mut bars = bars_from_closes(&[100.0; 14]);
        if let Some(last) = bars.last_mut() {
            last.rsi = rsi;
        }
        bars
    }

    #[test]
    fn bands() {
        let model = OscillatorModel::default();
        assert_eq!(model.opinion(&history_with_rsi(25.0)), Ok(Signal::Buy));
        assert_eq!(model.opinion(&history_with_rsi(75.0)), Ok(Signal::Sell));
        assert_eq!(model.opinion(&history_with_rsi(50.0)), Ok(Signal::Hold));
        assert_eq!(model.opinion(&history_with_rsi(30.0)), Ok(Signal::Hold));
        assert_eq!(model.opinion(&history_with_rsi(70.0)), Ok(Signal::Hold));
        assert_eq!(model.opinion(&history_with_rsi(f64::NAN)), Ok(Signal::Hold));
    }

    #[test]
    fn custom_band() {
        let model = OscillatorModel::new(40.0, 60.0).unwrap();
        assert_eq!(model.opinion(&history_with_rsi(35.0)), Ok(Signal::Buy));
        assert_eq!(model.opinion(&history_with_rsi(65.0)), Ok(Signal::Sell));
    }

    #[test]
    fn rejects_inverted_band() {
        assert_eq!(
            OscillatorModel::new(70.0, 30.0).unwrap_err(),
            ConfigError::InvalidBand {
                oversold: 70.0,
                overbought: 30.0
            }
        );
        assert!(OscillatorModel::new(50.0, 50.0).is_err());
    }
}
