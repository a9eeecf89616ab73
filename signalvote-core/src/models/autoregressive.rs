//! ARIMA(1,1,1) on closes, fitted by conditional sum of squares.
//!
//! Differences d[t] = c[t] - c[t-1] follow d[t] = φ·d[t-1] + e[t] + θ·e[t-1],
//! with e[0] = 0 as the conditioning residual. (φ, θ) is chosen by a coarse grid
//! over (-1, 1) followed by a finer grid around the coarse optimum.

use super::{history_closes, SignalModel};
use crate::domain::{ModelId, Signal};
use crate::error::ModelError;
use crate::indicators::EnrichedBar;

pub const MIN_HISTORY: usize = 60;

const COARSE_STEP: f64 = 0.05;
const FINE_STEP: f64 = 0.005;
const BOUND: f64 = 0.99;

#[derive(Debug, Clone)]
pub struct AutoregressiveModel {
    min_history: usize,
}

impl AutoregressiveModel {
    pub fn new() -> Self {
        Self {
            min_history: MIN_HISTORY,
        }
    }
}

impl Default for AutoregressiveModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Fitted parameters and the state needed for a one-step forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArimaFit {
    pub phi: f64,
    pub theta: f64,
    pub sse: f64,
    last_diff: f64,
    last_residual: f64,
}

impl ArimaFit {
    /// Forecast of the next difference.
    pub fn next_diff(&self) -> f64 {
        self.phi * self.last_diff + self.theta * self.last_residual
    }
}

/// Sum of squared residuals and the final residual for one parameter pair.
fn conditional_sse(diffs: &[f64], phi: f64, theta: f64) -> (f64, f64) {
    let mut sse = 0.0;
    let mut residual = 0.0;
    for w in diffs.windows(2) {
        residual = w[1] - phi * w[0] - theta * residual;
        sse += residual * residual;
    }
    (sse, residual)
}

fn grid(center: f64, half_width: f64, step: f64) -> impl Iterator<Item = f64> {
    let lo = (center - half_width).max(-BOUND);
    let hi = (center + half_width).min(BOUND);
    let steps = ((hi - lo) / step + 1e-9).floor() as usize;
    (0..=steps).map(move |k| lo + k as f64 * step)
}

/// Fit ARIMA(1,1,1) to a close series.
pub fn fit(closes: &[f64]) -> Result<ArimaFit, ModelError> {
    if let Some(bad) = closes.iter().find(|c| !c.is_finite()) {
        return Err(ModelError::InvalidInput(format!("non-finite close {bad}")));
    }
    if closes.len() < 3 {
        return Err(ModelError::InvalidInput(format!(
            "need at least 3 closes, have {}",
            closes.len()
        )));
    }
    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let search = |center: (f64, f64), half_width: f64, step: f64| {
        let mut best: Option<(f64, f64, f64, f64)> = None;
        for phi in grid(center.0, half_width, step) {
            for theta in grid(center.1, half_width, step) {
                let (sse, residual) = conditional_sse(&diffs, phi, theta);
                if sse.is_finite() && best.map_or(true, |b| sse < b.2) {
                    best = Some((phi, theta, sse, residual));
                }
            }
        }
        best
    };

    let coarse = search((0.0, 0.0), BOUND, COARSE_STEP)
        .ok_or_else(|| ModelError::FitFailed("no finite residuals on coarse grid".into()))?;
    let (phi, theta, sse, last_residual) = search((coarse.0, coarse.1), COARSE_STEP, FINE_STEP)
        .ok_or_else(|| ModelError::FitFailed("no finite residuals on fine grid".into()))?;

    let last_diff = diffs[diffs.len() - 1];
    Ok(ArimaFit {
        phi,
        theta,
        sse,
        last_diff,
        last_residual,
    })
}

impl SignalModel for AutoregressiveModel {
    fn id(&self) -> ModelId {
        ModelId::Autoregressive
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn opinion(&self, history: &[EnrichedBar]) -> Result<Signal, ModelError> {
        let closes = history_closes(history);
        let fit = fit(&closes)?;
        let last = closes[closes.len() - 1];
        let forecast = last + fit.next_diff();
        if !forecast.is_finite() {
            return Err(ModelError::FitFailed(format!(
                "non-finite forecast (phi={}, theta={})",
                fit.phi, fit.theta
            )));
        }

        tracing::trace!(phi = fit.phi, theta = fit.theta, forecast, last, "arima fit");
        Ok(if forecast > last {
            Signal::Buy
        } else if forecast < last {
            Signal::Sell
        } else {
            Signal::Hold
        })
    }
}
