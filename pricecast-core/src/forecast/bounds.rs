//! Per-day min/max envelope around forecast values.
//!
//! sigma = sample std of |pct change| over the last 20 returns;
//! min = max(0, p * (1 - sigma)), max = p * (1 + sigma).

use serde::{Deserialize, Serialize};

/// Returns used for the volatility estimate.
pub const BOUNDS_LOOKBACK: usize = 20;

/// Sigma used when recent returns give no usable estimate.
pub const DEFAULT_SIGMA: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastBound {
    pub min: f64,
    pub max: f64,
}

/// Relative volatility of recent closes.
pub fn relative_volatility(closes: &[f64]) -> f64 {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| ((w[1] - w[0]) / w[0]).abs())
        .collect();
    let recent = &returns[returns.len().saturating_sub(BOUNDS_LOOKBACK)..];

    if recent.len() < 2 {
        return DEFAULT_SIGMA;
    }

    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let var = recent.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (recent.len() - 1) as f64;
    let sigma = var.sqrt();

    if sigma.is_finite() && sigma > 0.0 {
        sigma
    } else {
        DEFAULT_SIGMA
    }
}

/// Envelope for each forecast value.
pub fn volatility_bounds(predicted: &[f64], closes: &[f64]) -> Vec<ForecastBound> {
    let sigma = relative_volatility(closes);
    predicted
        .iter()
        .map(|&p| ForecastBound {
            min: (p * (1.0 - sigma)).max(0.0),
            max: p * (1.0 + sigma),
        })
        .collect()
}
