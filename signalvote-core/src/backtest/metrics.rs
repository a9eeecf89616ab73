//! Performance metrics: pure functions over realised trade returns.
//!
//! Returns are percentages (10.0 = +10%). The standard deviation is the population
//! one (divide by N), and the Sharpe ratio is scaled by sqrt(trade count) rather
//! than annualised.

/// Added to the deviation so a constant return series still yields a finite ratio.
pub const SHARPE_EPSILON: f64 = 1e-9;

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Winning trades as a percentage of opened trades; 0.0 when nothing was opened.
pub fn win_rate(winning_trades: usize, trade_count: usize) -> f64 {
    if trade_count == 0 {
        return 0.0;
    }
    winning_trades as f64 / trade_count as f64 * 100.0
}

/// mean / (std + ε) × sqrt(n); 0.0 with fewer than two returns.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    mean(returns) / (population_std_dev(returns) + SHARPE_EPSILON) * n.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(mean(&values), 5.0, 1e-12);
        assert_approx(population_std_dev(&values), 2.0, 1e-12);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn win_rate_handles_zero_trades() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert_approx(win_rate(1, 4), 25.0, 1e-12);
    }

    #[test]
    fn sharpe_needs_two_returns() {
        assert_eq!(sharpe_ratio(&[]), 0.0);
        assert_eq!(sharpe_ratio(&[12.0]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 2, population std 1, n 2 → 2 / 1 * sqrt(2)
        let s = sharpe_ratio(&[1.0, 3.0]);
        assert_approx(s, 2.0 * 2.0_f64.sqrt(), 1e-6);
    }

    #[test]
    fn sharpe_of_identical_returns_is_finite() {
        let s = sharpe_ratio(&[1.0, 1.0, 1.0]);
        assert!(s.is_finite() && s > 0.0);
    }
}
