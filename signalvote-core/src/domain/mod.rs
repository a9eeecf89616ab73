//! Domain types for SignalVote

pub mod position;
pub mod price;
pub mod signal;
pub mod threshold;
pub mod trade;

pub use position::{Position, Side};
pub use price::{PredictedPricePoint, PricePoint};
pub use signal::{ModelId, Opinion, ParseSignalError, Signal, WeightedOpinion};
pub use threshold::{Threshold, DEFAULT_THRESHOLD};
pub use trade::ClosedTrade;
