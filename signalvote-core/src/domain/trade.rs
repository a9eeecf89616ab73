//! ClosedTrade: one realised round trip: entry → exit.

use super::position::Side;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub side: Side,

    pub entry_date: NaiveDate,
    pub entry_price: f64,

    pub exit_date: NaiveDate,
    pub exit_price: f64,

    /// Percentage return of the round trip (10.0 = +10%).
    pub return_pct: f64,

    /// True when the trade was closed by end-of-series liquidation rather than a signal.
    pub forced: bool,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }
}
