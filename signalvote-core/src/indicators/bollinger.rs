//! Bollinger band width: (upper - lower) / middle.
//!
//! middle = SMA(close, period), upper/lower = middle ± mult * stddev(close, period).
//! Uses population stddev (divide by N), so width = 2 * mult * stddev / middle.
//! Lookback: period - 1.

use super::{closes, Indicator};
use crate::domain::PricePoint;

#[derive(Debug, Clone)]
pub struct BollingerWidth {
    period: usize,
    multiplier: f64,
    name: String,
}

impl BollingerWidth {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("bb_width_{period}_{multiplier}"),
        }
    }
}

impl Indicator for BollingerWidth {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let closes = closes(points);
        let mut out = vec![f64::NAN; closes.len()];

        for (i, window) in closes.windows(self.period).enumerate() {
            let n = self.period as f64;
            let mean = window.iter().sum::<f64>() / n;
            let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
            if mean != 0.0 {
                out[i + self.period - 1] = 2.0 * self.multiplier * variance.sqrt() / mean;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_points};

    #[test]
    fn flat_series_has_zero_width() {
        let result = BollingerWidth::new(5, 2.0).compute(&make_points(&[20.0; 8]));
        assert!(result[..4].iter().all(|v| v.is_nan()));
        assert_approx(result[4], 0.0, 1e-12);
    }

    #[test]
    fn known_width() {
        // window [1, 3]: mean 2, population std 1 → 2 * 2 * 1 / 2 = 2
        let result = BollingerWidth::new(2, 2.0).compute(&make_points(&[1.0, 3.0]));
        assert_approx(result[1], 2.0, 1e-12);
    }

    #[test]
    fn short_series_is_all_nan() {
        let result = BollingerWidth::new(20, 2.0).compute(&make_points(&[1.0; 10]));
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
