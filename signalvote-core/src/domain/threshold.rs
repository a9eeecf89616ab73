//! Relative-change threshold that turns a predicted price into a signal.

use super::signal::Signal;
use crate::error::ConfigError;

/// Default minimum relative move, 0.0005%.
pub const DEFAULT_THRESHOLD: f64 = 0.000005;

/// A strictly positive, finite relative-change threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::NonPositiveThreshold(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// BUY if `(predicted - close) / close > t`, SELL if `< -t`, HOLD otherwise.
    ///
    /// A non-finite prediction or a non-positive close yields HOLD.
    pub fn classify(&self, predicted: f64, close: f64) -> Signal {
        if !predicted.is_finite() || !close.is_finite() || close <= 0.0 {
            return Signal::Hold;
        }
        let pct = (predicted - close) / close;
        if pct > self.0 {
            Signal::Buy
        } else if pct < -self.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}
