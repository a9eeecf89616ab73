//! Feature table used by the models: price points joined with their indicators.

use super::{Atr, BollingerWidth, Indicator, Macd, MacdLine, Rsi};
use crate::domain::PricePoint;
use serde::{Deserialize, Serialize};

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;

/// A price point with every indicator feature defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    pub point: PricePoint,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub atr: f64,
    /// (high + low + close) / 3, standing in for a volume-weighted price.
    pub typical_price: f64,
    pub bb_width: f64,
}

impl EnrichedBar {
    pub fn close(&self) -> f64 {
        self.point.close
    }

    /// Feature vector in a fixed order: close, rsi, macd, typical price, atr.
    pub fn features(&self) -> [f64; 5] {
        [
            self.point.close,
            self.rsi,
            self.macd,
            self.typical_price,
            self.atr,
        ]
    }

    fn is_complete(&self) -> bool {
        [
            self.rsi,
            self.macd,
            self.macd_signal,
            self.atr,
            self.typical_price,
            self.bb_width,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Number of raw rows consumed by indicator warm-up with the standard settings.
pub fn warmup_rows() -> usize {
    Macd::standard(MacdLine::Signal)
        .lookback()
        .max(Rsi::new(RSI_PERIOD).lookback())
        .max(Atr::new(ATR_PERIOD).lookback())
        .max(BollingerWidth::new(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).lookback())
}

/// Compute every feature over `points` and keep only the rows where all are defined.
pub fn enrich(points: &[PricePoint]) -> Vec<EnrichedBar> {
    let rsi = Rsi::new(RSI_PERIOD).compute(points);
    let macd = Macd::standard(MacdLine::Line).compute(points);
    let macd_signal = Macd::standard(MacdLine::Signal).compute(points);
    let atr = Atr::new(ATR_PERIOD).compute(points);
    let bb_width = BollingerWidth::new(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(points);

    let bars: Vec<EnrichedBar> = points
        .iter()
        .enumerate()
        .map(|(i, p)| EnrichedBar {
            point: p.clone(),
            rsi: rsi[i],
            macd: macd[i],
            macd_signal: macd_signal[i],
            atr: atr[i],
            typical_price: p.typical_price(),
            bb_width: bb_width[i],
        })
        .filter(EnrichedBar::is_complete)
        .collect();

    tracing::debug!(
        raw = points.len(),
        enriched = bars.len(),
        "indicator enrichment"
    );
    bars
}
