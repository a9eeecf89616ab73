//! GARCH(1,1) on percentage log returns.
//!
//! r[t] = 100·ln(c[t]/c[t-1]), e[t] = r[t] - mean(r).
//! σ²[t+1] = ω + α·e[t]² + β·σ²[t], with ω = s²·(1 - α - β) (variance targeting)
//! and σ²[0] = s². (α, β) minimises the Gaussian negative log-likelihood over a grid.
//! A forecast variance above the cutoff is treated as risk: SELL. Otherwise BUY.

use super::{history_closes, SignalModel};
use crate::domain::{ModelId, Signal};
use crate::error::{ConfigError, ModelError};
use crate::indicators::EnrichedBar;

pub const MIN_HISTORY: usize = 60;
pub const DEFAULT_SELL_ABOVE: f64 = 5.0;

const ALPHA_STEP: f64 = 0.01;
const ALPHA_MAX: f64 = 0.30;
const BETA_STEP: f64 = 0.02;
const BETA_MAX: f64 = 0.98;
const PERSISTENCE_MAX: f64 = 0.999;

#[derive(Debug, Clone)]
pub struct VolatilityModel {
    sell_above: f64,
}

impl VolatilityModel {
    pub fn new(sell_above: f64) -> Result<Self, ConfigError> {
        if sell_above.is_finite() && sell_above > 0.0 {
            Ok(Self { sell_above })
        } else {
            Err(ConfigError::NonPositiveVolatilityCutoff(sell_above))
        }
    }
}

impl Default for VolatilityModel {
    fn default() -> Self {
        Self {
            sell_above: DEFAULT_SELL_ABOVE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarchFit {
    pub mean: f64,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Forecast variance of the next return, in percent squared.
    pub next_variance: f64,
}

/// Percentage log returns of a close series.
pub fn pct_log_returns(closes: &[f64]) -> Result<Vec<f64>, ModelError> {
    if let Some(bad) = closes.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
        return Err(ModelError::InvalidInput(format!(
            "log returns need positive closes, got {bad}"
        )));
    }
    Ok(closes.windows(2).map(|w| 100.0 * (w[1] / w[0]).ln()).collect())
}

/// Negative log-likelihood (constants dropped) and the one-step-ahead variance.
fn neg_log_likelihood(residuals: &[f64], sample_var: f64, alpha: f64, beta: f64) -> (f64, f64) {
    let omega = sample_var * (1.0 - alpha - beta);
    let mut variance = sample_var;
    let mut nll = 0.0;
    for e in residuals {
        nll += variance.ln() + e * e / variance;
        variance = omega + alpha * e * e + beta * variance;
    }
    (nll, variance)
}

pub fn fit(returns: &[f64]) -> Result<GarchFit, ModelError> {
    if returns.len() < 2 {
        return Err(ModelError::InvalidInput(format!(
            "need at least 2 returns, have {}",
            returns.len()
        )));
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let residuals: Vec<f64> = returns.iter().map(|r| r - mean).collect();
    let sample_var = residuals.iter().map(|e| e * e).sum::<f64>() / n;

    // A price series with no movement has no volatility to model.
    if sample_var <= f64::EPSILON {
        return Ok(GarchFit {
            mean,
            omega: 0.0,
            alpha: 0.0,
            beta: 0.0,
            next_variance: 0.0,
        });
    }

    let alphas = (0..=(ALPHA_MAX / ALPHA_STEP).round() as usize).map(|k| k as f64 * ALPHA_STEP);
    let mut best: Option<(f64, f64, f64, f64)> = None;
    for alpha in alphas {
        let betas = (0..=(BETA_MAX / BETA_STEP).round() as usize).map(|k| k as f64 * BETA_STEP);
        for beta in betas.take_while(|b| alpha + b < PERSISTENCE_MAX) {
            let (nll, next) = neg_log_likelihood(&residuals, sample_var, alpha, beta);
            if nll.is_finite() && best.map_or(true, |b| nll < b.2) {
                best = Some((alpha, beta, nll, next));
            }
        }
    }

    let (alpha, beta, _, next_variance) = best
        .ok_or_else(|| ModelError::FitFailed("likelihood not finite anywhere on grid".into()))?;
    Ok(GarchFit {
        mean,
        omega: sample_var * (1.0 - alpha - beta),
        alpha,
        beta,
        next_variance,
    })
}

impl SignalModel for VolatilityModel {
    fn id(&self) -> ModelId {
        ModelId::Volatility
    }

    fn min_history(&self) -> usize {
        MIN_HISTORY
    }

    fn opinion(&self, history: &[EnrichedBar]) -> Result<Signal, ModelError> {
        let returns = pct_log_returns(&history_closes(history))?;
        let fit = fit(&returns)?;
        if !fit.next_variance.is_finite() {
            return Err(ModelError::FitFailed("non-finite variance forecast".into()));
        }
        tracing::trace!(
            alpha = fit.alpha,
            beta = fit.beta,
            next_variance = fit.next_variance,
            "garch fit"
        );
        Ok(if fit.next_variance > self.sell_above {
            Signal::Sell
        } else {
            Signal::Buy
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bars_from_closes;

    fn calm(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 * 1.001f64.powi(i as i32) * (1.0 + 0.0005 * (i as f64).sin()))
            .collect()
    }

    fn choppy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { 100.0 } else { 105.0 })
            .collect()
    }

    #[test]
    fn calm_market_buys() {
        let model = VolatilityModel::default();
        assert_eq!(model.opinion(&bars_from_closes(&calm(80))), Ok(Signal::Buy));
    }

    #[test]
    fn choppy_market_sells() {
        // ±4.88% moves → variance ≈ 23.8
        let model = VolatilityModel::default();
        assert_eq!(model.opinion(&bars_from_closes(&choppy(80))), Ok(Signal::Sell));
    }

    #[test]
    fn cutoff_is_configurable() {
        let model = VolatilityModel::new(50.0).unwrap();
        assert_eq!(model.opinion(&bars_from_closes(&choppy(80))), Ok(Signal::Buy));
        assert_eq!(
            VolatilityModel::new(0.0).unwrap_err(),
            ConfigError::NonPositiveVolatilityCutoff(0.0)
        );
    }

    #[test]
    fn fit_respects_stationarity() {
        let returns = pct_log_returns(&calm(120)).unwrap();
        let fit = fit(&returns).unwrap();
        assert!(fit.alpha >= 0.0 && fit.beta >= 0.0);
        assert!(fit.alpha + fit.beta < 1.0);
        assert!(fit.omega > 0.0);
    }

    #[test]
    fn flat_prices_have_zero_variance() {
        let returns = pct_log_returns(&[10.0; 65]).unwrap();
        assert_eq!(fit(&returns).unwrap().next_variance, 0.0);
    }

    #[test]
    fn non_positive_close_is_invalid() {
        assert!(matches!(
            pct_log_returns(&[10.0, 0.0, 11.0]),
            Err(ModelError::InvalidInput(_))
        ));
    }
}
