//! MACD: difference of two close EMAs, and its EMA signal line.
//!
//! - Line: EMA(close, fast) - EMA(close, slow). Lookback: slow - 1.
//! - Signal: EMA(line, signal). Lookback: slow + signal - 2.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::PricePoint;

/// Which MACD output to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        let label = match output {
            MacdLine::Line => "macd",
            MacdLine::Signal => "macd_signal",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("{label}_{fast}_{slow}_{signal}"),
        }
    }

    /// The conventional 12/26/9 configuration.
    pub fn standard(output: MacdLine) -> Self {
        Self::new(12, 26, 9, output)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdLine::Line => self.slow - 1,
            MacdLine::Signal => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let closes = closes(points);
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        match self.output {
            MacdLine::Line => line,
            MacdLine::Signal => ema_of_series(&line, self.signal),
        }
    }
}
