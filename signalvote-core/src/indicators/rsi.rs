//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss). Lookback: period.
//! Flat window → 50; no losses → 100; no gains → 0.

use super::{closes, Indicator};
use crate::domain::PricePoint;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        rsi_of_series(&closes(points), self.period)
    }
}

pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n <= period {
        return out;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let seed = &changes[..period];
    if seed.iter().any(|c| c.is_nan()) {
        return out;
    }

    let mut avg_gain = seed.iter().filter(|c| **c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = -seed.iter().filter(|c| **c < 0.0).sum::<f64>() / period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    let p = period as f64;
    for (i, &change) in changes.iter().enumerate().skip(period) {
        if change.is_nan() {
            break;
        }
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        out[i + 1] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
