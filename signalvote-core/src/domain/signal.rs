//! Signal vocabulary shared by the live decision path and the historical replay.
//!
//! A `Signal` is purely categorical. Each predictive model emits one per decision
//! point; the aggregator merges them; the simulator consumes a time series of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// True for BUY and SELL.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of BUY/SELL/HOLD.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal '{0}' (expected BUY, SELL or HOLD)")]
pub struct ParseSignalError(pub String);

impl FromStr for Signal {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            _ => Err(ParseSignalError(s.to_string())),
        }
    }
}

/// Identifier of one of the four predictive models feeding the aggregator.
///
/// The set is closed: adding a model means adding a variant, a default weight,
/// and an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    /// Sequence model trained on price/indicator windows.
    Sequence,
    /// Classical autoregressive price model.
    Autoregressive,
    /// Conditional-volatility model.
    Volatility,
    /// Momentum-oscillator rule.
    Oscillator,
}

impl ModelId {
    pub const ALL: [ModelId; 4] = [
        ModelId::Sequence,
        ModelId::Autoregressive,
        ModelId::Volatility,
        ModelId::Oscillator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Sequence => "sequence",
            ModelId::Autoregressive => "autoregressive",
            ModelId::Volatility => "volatility",
            ModelId::Oscillator => "oscillator",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of consulting one model at one decision point.
///
/// `Degraded` records that the model failed (numerical non-convergence, missing
/// dependency). It scores as HOLD, but stays distinguishable from a model that
/// actually voted HOLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Opinion {
    Voted { signal: Signal },
    Degraded { reason: String },
}

impl Opinion {
    pub fn voted(signal: Signal) -> Self {
        Opinion::Voted { signal }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Opinion::Degraded {
            reason: reason.into(),
        }
    }

    /// The signal this outcome contributes to scoring.
    pub fn signal(&self) -> Signal {
        match self {
            Opinion::Voted { signal } => *signal,
            Opinion::Degraded { .. } => Signal::Hold,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Opinion::Degraded { .. })
    }
}

/// One model's vote together with the weight it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedOpinion {
    pub model: ModelId,
    pub signal: Signal,
    pub weight: u32,
}
