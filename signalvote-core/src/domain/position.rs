use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

/// Simulator-owned market exposure.
///
/// Exactly one variant holds at a time, so simultaneous long and short exposure
/// is unrepresentable. `size` is signed: positive when long, negative when short.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Position {
    Flat,
    Long { entry_price: f64, size: f64 },
    Short { entry_price: f64, size: f64 },
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::Long { .. } => Some(Side::Long),
            Position::Short { .. } => Some(Side::Short),
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            Position::Flat => None,
            Position::Long { entry_price, .. } | Position::Short { entry_price, .. } => {
                Some(*entry_price)
            }
        }
    }

    /// Signed position size; zero when flat.
    pub fn size(&self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long { size, .. } | Position::Short { size, .. } => *size,
        }
    }
}

impl Side {
    /// Percentage return of a round trip on this side.
    ///
    /// Long: `(exit / entry - 1) * 100`. Short: `(entry / exit - 1) * 100`.
    pub fn return_pct(&self, entry_price: f64, exit_price: f64) -> f64 {
        match self {
            Side::Long => (exit_price / entry_price - 1.0) * 100.0,
            Side::Short => (entry_price / exit_price - 1.0) * 100.0,
        }
    }
}
