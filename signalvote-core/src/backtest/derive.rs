//! Per-bar signals derived from predicted closes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{PredictedPricePoint, PricePoint, Signal, Threshold};

/// For each point: the threshold rule against the prediction for the same date,
/// or HOLD when there is none.
pub fn derive_signals(
    points: &[PricePoint],
    predictions: &[PredictedPricePoint],
    threshold: Threshold,
) -> Vec<Signal> {
    let by_date: HashMap<NaiveDate, f64> = predictions
        .iter()
        .map(|p| (p.date, p.predicted_close))
        .collect();

    points
        .iter()
        .map(|point| match by_date.get(&point.date) {
            Some(&predicted) => threshold.classify(predicted, point.close),
            None => Signal::Hold,
        })
        .collect()
}

/// How many bars carried each signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalCounts {
    pub fn total(&self) -> usize {
        self.buy + self.sell + self.hold
    }
}

impl<'a> FromIterator<&'a Signal> for SignalCounts {
    fn from_iter<I: IntoIterator<Item = &'a Signal>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut counts, signal| {
            match signal {
                Signal::Buy => counts.buy += 1,
                Signal::Sell => counts.sell += 1,
                Signal::Hold => counts.hold += 1,
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_points;

    fn prediction(point: &PricePoint, predicted_close: f64) -> PredictedPricePoint {
        PredictedPricePoint {
            date: point.date,
            predicted_close,
        }
    }

    #[test]
    fn unpredicted_bars_hold() {
        let points = make_points(&[100.0, 100.0, 100.0]);
        let predictions = [prediction(&points[2], 101.0)];
        let signals = derive_signals(&points, &predictions, Threshold::default());
        assert_eq!(signals, [Signal::Hold, Signal::Hold, Signal::Buy]);
    }

    #[test]
    fn compares_against_same_date_close() {
        let points = make_points(&[100.0, 200.0]);
        let predictions = [prediction(&points[0], 99.0), prediction(&points[1], 200.0)];
        let signals = derive_signals(&points, &predictions, Threshold::default());
        assert_eq!(signals, [Signal::Sell, Signal::Hold]);
    }

    #[test]
    fn tiny_moves_clear_the_default_threshold() {
        let points = make_points(&[100.0]);
        // +0.001% beats the 0.0005% default
        let predictions = [prediction(&points[0], 100.001)];
        assert_eq!(
            derive_signals(&points, &predictions, Threshold::default()),
            [Signal::Buy]
        );
        let wide = Threshold::new(0.01).unwrap();
        assert_eq!(derive_signals(&points, &predictions, wide), [Signal::Hold]);
    }

    #[test]
    fn counts() {
        let signals = [Signal::Buy, Signal::Hold, Signal::Hold, Signal::Sell];
        let counts: SignalCounts = signals.iter().collect();
        assert_eq!(
            counts,
            SignalCounts {
                buy: 1,
                sell: 1,
                hold: 2
            }
        );
        assert_eq!(counts.total(), 4);
    }
}
