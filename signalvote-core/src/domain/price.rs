//! Price observations: raw daily points and model predictions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily price observation for a single symbol.
///
/// `date` is the observation timestamp. Sources that only carry a close are
/// represented with open/high/low equal to the close and zero volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// A point carrying only a close price.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    /// Typical price `(high + low + close) / 3`, used as the volume-weighted price proxy.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Basic sanity check: finite positive close, high >= low, high/low bracket the close.
    pub fn is_sane(&self) -> bool {
        self.close.is_finite()
            && self.close > 0.0
            && self.high >= self.low
            && self.high >= self.close
            && self.low <= self.close
    }
}

/// A model's predicted close for `date`, made from the window of observations before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedPricePoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point() -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn typical_price_is_hlc_mean() {
        assert!((sample_point().typical_price() - 102.0).abs() < 1e-12);
    }

    #[test]
    fn close_only_point_is_sane() {
        let p = PricePoint::from_close(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 50.0);
        assert!(p.is_sane());
        assert_eq!(p.typical_price(), 50.0);
    }

    #[test]
    fn detects_insane_points() {
        let mut p = sample_point();
        p.high = 97.0;
        assert!(!p.is_sane());

        let mut p = sample_point();
        p.close = f64::NAN;
        assert!(!p.is_sane());

        let mut p = sample_point();
        p.close = 0.0;
        p.low = 0.0;
        assert!(!p.is_sane());
    }
}
