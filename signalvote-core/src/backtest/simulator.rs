//! Single-position trade simulator.
//!
//! The run is a left fold of `SimState::apply` over the (point, signal) series in
//! date order, followed by a forced liquidation at the final close.
//!
//! | position | BUY        | SELL        | HOLD |
//! |----------|------------|-------------|------|
//! | flat     | open long  | open short  | -    |
//! | long     | -          | close long  | -    |
//! | short    | close short| -           | -    |
//!
//! Opening spends all cash: long size = cash / close, short size = -cash / close.
//! Closing a long sets cash = size × close; closing a short sets cash = -size × close.
//! Only openings increment `trade_count`; every closure (the forced one included)
//! records a return and counts as a win when that return is positive.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::metrics;
use crate::domain::{ClosedTrade, Position, PricePoint, Side, Signal};
use crate::error::{ConfigError, EngineError};

/// Immutable outcome of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_cash: f64,
    pub final_value: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    /// Percentage, 0–100.
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub trades: Vec<ClosedTrade>,
}

impl BacktestResult {
    pub fn profit_loss(&self) -> f64 {
        self.final_value - self.initial_cash
    }

    /// Total return in percent of initial cash.
    pub fn total_return_pct(&self) -> f64 {
        self.profit_loss() / self.initial_cash * 100.0
    }

    pub fn trade_returns(&self) -> Vec<f64> {
        self.trades.iter().map(|t| t.return_pct).collect()
    }
}

/// Simulator state between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub cash: f64,
    pub position: Position,
    entry_date: Option<NaiveDate>,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub trades: Vec<ClosedTrade>,
}

impl SimState {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            position: Position::Flat,
            entry_date: None,
            trade_count: 0,
            winning_trades: 0,
            trades: Vec::new(),
        }
    }

    /// Apply one bar's signal at that bar's close.
    pub fn apply(mut self, point: &PricePoint, signal: Signal) -> Self {
        let close = point.close;
        match (self.position, signal) {
            (Position::Flat, Signal::Buy) => {
                self.position = Position::Long {
                    entry_price: close,
                    size: self.cash / close,
                };
                self.open(point.date);
            }
            (Position::Flat, Signal::Sell) => {
                self.position = Position::Short {
                    entry_price: close,
                    size: -self.cash / close,
                };
                self.open(point.date);
            }
            (Position::Long { .. }, Signal::Sell) | (Position::Short { .. }, Signal::Buy) => {
                self.close(point, false);
            }
            _ => {}
        }
        self
    }

    /// Close whatever is open at `point`'s close without counting a new trade.
    pub fn liquidate(mut self, point: &PricePoint) -> Self {
        if !self.position.is_flat() {
            self.close(point, true);
        }
        self
    }

    fn open(&mut self, date: NaiveDate) {
        self.cash = 0.0;
        self.entry_date = Some(date);
        self.trade_count += 1;
    }

    fn close(&mut self, point: &PricePoint, forced: bool) {
        let (side, entry_price, size) = match self.position {
            Position::Flat => return,
            Position::Long { entry_price, size } => (Side::Long, entry_price, size),
            Position::Short { entry_price, size } => (Side::Short, entry_price, size),
        };
        let exit_price = point.close;
        self.cash = match side {
            Side::Long => size * exit_price,
            Side::Short => -size * exit_price,
        };

        let trade = ClosedTrade {
            side,
            entry_date: self.entry_date.take().unwrap_or(point.date),
            entry_price,
            exit_date: point.date,
            exit_price,
            return_pct: side.return_pct(entry_price, exit_price),
            forced,
        };
        if trade.is_winner() {
            self.winning_trades += 1;
        }
        self.trades.push(trade);
        self.position = Position::Flat;
    }

    fn into_result(self, initial_cash: f64) -> BacktestResult {
        let returns: Vec<f64> = self.trades.iter().map(|t| t.return_pct).collect();
        BacktestResult {
            initial_cash,
            final_value: self.cash,
            trade_count: self.trade_count,
            winning_trades: self.winning_trades,
            win_rate: metrics::win_rate(self.winning_trades, self.trade_count),
            sharpe_ratio: metrics::sharpe_ratio(&returns),
            trades: self.trades,
        }
    }
}

/// Check that closes are usable and dates strictly increase.
pub fn validate_series<'a>(
    points: impl IntoIterator<Item = &'a PricePoint>,
) -> Result<usize, EngineError> {
    let mut prev: Option<NaiveDate> = None;
    let mut count = 0;
    for (index, point) in points.into_iter().enumerate() {
        if !(point.close.is_finite() && point.close > 0.0) {
            return Err(EngineError::InvalidPrice {
                index,
                price: point.close,
            });
        }
        if prev.is_some_and(|p| point.date <= p) {
            return Err(EngineError::OutOfOrder { index });
        }
        prev = Some(point.date);
        count += 1;
    }
    Ok(count)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    initial_cash: f64,
}

impl Simulator {
    pub fn new(initial_cash: f64) -> Result<Self, ConfigError> {
        if initial_cash.is_finite() && initial_cash > 0.0 {
            Ok(Self { initial_cash })
        } else {
            Err(ConfigError::NonPositiveCash(initial_cash))
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn simulate(&self, series: &[(PricePoint, Signal)]) -> Result<BacktestResult, EngineError> {
        let Some((last, _)) = series.last() else {
            return Err(EngineError::InsufficientData {
                required: 1,
                available: 0,
            });
        };
        validate_series(series.iter().map(|(p, _)| p))?;

        let state = series
            .iter()
            .fold(SimState::new(self.initial_cash), |state, (point, signal)| {
                state.apply(point, *signal)
            })
            .liquidate(last);
        let result = state.into_result(self.initial_cash);

        tracing::debug!(
            bars = series.len(),
            trades = result.trade_count,
            final_value = result.final_value,
            "simulation finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_points};

    fn series(closes: &[f64], signals: &[Signal]) -> Vec<(PricePoint, Signal)> {
        make_points(closes).into_iter().zip(signals.iter().copied()).collect()
    }

    #[test]
    fn long_round_trip() {
        let sim = Simulator::new(1000.0).unwrap();
        let result = sim
            .simulate(&series(&[100.0, 110.0], &[Signal::Buy, Signal::Sell]))
            .unwrap();
        assert_eq!(result.trade_count, 1);
        assert_eq!(result.winning_trades, 1);
        assert_approx(result.win_rate, 100.0, 1e-9);
        assert_approx(result.final_value, 1100.0, 1e-9);
        assert_approx(result.profit_loss(), 100.0, 1e-9);
        assert!(!result.trades[0].forced);
    }

    #[test]
    fn short_round_trip_return_and_cash() {
        let sim = Simulator::new(1000.0).unwrap();
        let result = sim
            .simulate(&series(&[110.0, 100.0], &[Signal::Sell, Signal::Buy]))
            .unwrap();
        assert_eq!(result.trade_count, 1);
        assert_eq!(result.trades[0].side, Side::Short);
        assert_approx(result.trades[0].return_pct, 10.0, 1e-9);
        // size = -1000/110; cash = -size × 100
        assert_approx(result.final_value, 1000.0 / 110.0 * 100.0, 1e-9);
    }

    #[test]
    fn same_direction_signals_are_ignored_while_open() {
        let state = SimState::new(500.0);
        let points = make_points(&[50.0, 60.0, 70.0]);
        let state = state
            .apply(&points[0], Signal::Buy)
            .apply(&points[1], Signal::Buy)
            .apply(&points[2], Signal::Hold);
        assert_eq!(state.trade_count, 1);
        assert_eq!(
            state.position,
            Position::Long {
                entry_price: 50.0,
                size: 10.0
            }
        );
        assert_eq!(state.cash, 0.0);
    }

    #[test]
    fn open_position_is_liquidated_at_final_close() {
        let sim = Simulator::new(1000.0).unwrap();
        let result = sim
            .simulate(&series(
                &[100.0, 105.0, 120.0],
                &[Signal::Buy, Signal::Hold, Signal::Hold],
            ))
            .unwrap();
        assert_eq!(result.trade_count, 1);
        assert_eq!(result.winning_trades, 1);
        assert_approx(result.final_value, 1200.0, 1e-9);
        let trade = &result.trades[0];
        assert!(trade.forced);
        assert_approx(trade.exit_price, 120.0, 1e-12);
    }

    #[test]
    fn losing_forced_close_is_not_a_win() {
        let sim = Simulator::new(1000.0).unwrap();
        let result = sim
            .simulate(&series(&[100.0, 90.0], &[Signal::Buy, Signal::Hold]))
            .unwrap();
        assert_eq!(result.trade_count, 1);
        assert_eq!(result.winning_trades, 0);
        assert_eq!(result.win_rate, 0.0);
    }

    #[test]
    fn all_hold_is_idle() {
        let sim = Simulator::new(2500.0).unwrap();
        let result = sim
            .simulate(&series(&[10.0, 11.0, 9.0, 12.0], &[Signal::Hold; 4]))
            .unwrap();
        assert_eq!(result.final_value, 2500.0);
        assert_eq!(result.trade_count, 0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert!(result.trades.is_empty());
    }

    #[test]
    fn sharpe_uses_every_closure() {
        let sim = Simulator::new(1000.0).unwrap();
        let result = sim
            .simulate(&series(
                &[100.0, 110.0, 110.0, 99.0],
                &[Signal::Buy, Signal::Sell, Signal::Buy, Signal::Hold],
            ))
            .unwrap();
        assert_eq!(result.trade_count, 2);
        assert_eq!(result.trades.len(), 2);
        let expected = metrics::sharpe_ratio(&result.trade_returns());
        assert_approx(result.sharpe_ratio, expected, 1e-12);
        assert!(result.sharpe_ratio.is_finite());
    }

    #[test]
    fn rejects_bad_input() {
        let sim = Simulator::new(1000.0).unwrap();
        assert_eq!(
            sim.simulate(&[]).unwrap_err(),
            EngineError::InsufficientData {
                required: 1,
                available: 0
            }
        );

        let mut bad = series(&[100.0, 101.0], &[Signal::Hold, Signal::Hold]);
        bad[1].0.date = bad[0].0.date;
        assert_eq!(
            sim.simulate(&bad).unwrap_err(),
            EngineError::OutOfOrder { index: 1 }
        );

        let mut bad = series(&[100.0, 101.0], &[Signal::Hold, Signal::Hold]);
        bad[0].0.close = 0.0;
        assert!(matches!(
            sim.simulate(&bad),
            Err(EngineError::InvalidPrice { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_non_positive_cash() {
        assert_eq!(
            Simulator::new(0.0).unwrap_err(),
            ConfigError::NonPositiveCash(0.0)
        );
        assert!(Simulator::new(f64::NAN).is_err());
    }
}
