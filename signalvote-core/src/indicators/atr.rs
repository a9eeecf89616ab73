//! Average True Range (ATR), Wilder smoothing.
//!
//! TR[t] = max(high-low, |high-prev_close|, |low-prev_close|) for t >= 1.
//! ATR[period] = mean(TR[1..=period]); afterwards ATR[t] = (ATR[t-1]*(p-1) + TR[t]) / p.
//! Lookback: period.

use super::Indicator;
use crate::domain::PricePoint;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range series. Index 0 has no previous close and uses high - low.
pub fn true_range(points: &[PricePoint]) -> Vec<f64> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let range = p.high - p.low;
            match i.checked_sub(1).map(|j| points[j].close) {
                Some(prev) => range.max((p.high - prev).abs()).max((p.low - prev).abs()),
                None => range,
            }
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let n = points.len();
        let mut out = vec![f64::NAN; n];
        if n <= self.period {
            return out;
        }

        let tr = true_range(points);
        let p = self.period as f64;
        let mut atr = tr[1..=self.period].iter().sum::<f64>() / p;
        if atr.is_nan() {
            return out;
        }
        out[self.period] = atr;

        for i in (self.period + 1)..n {
            if tr[i].is_nan() {
                break;
            }
            atr = (atr * (p - 1.0) + tr[i]) / p;
            out[i] = atr;
        }
        out
    }
}
