//! Indicator enrichment.
//!
//! Indicators are pure functions: a price series in, a numeric series of the same
//! length out. Warm-up positions are `f64::NAN`. `enrich` combines them into one
//! aligned feature table and drops every row that lacks enough history.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod enrich;
pub mod macd;
pub mod rsi;

pub use atr::Atr;
pub use bollinger::BollingerWidth;
pub use ema::Ema;
pub use enrich::{enrich, EnrichedBar};
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;

use crate::domain::PricePoint;

/// Trait for indicators.
///
/// # Look-ahead guard
/// The value at index t may only depend on `points[0..=t]`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading positions that are NaN on a clean series.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, points: &[PricePoint]) -> Vec<f64>;
}

pub(crate) fn closes(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.close).collect()
}

/// Build close-only price points on consecutive days for tests.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, epsilon={epsilon}"
    );
}
