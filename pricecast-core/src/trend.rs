//! Trend classification and moving-average crossover detection.
//!
//! The trend label compares the latest close with SMA7 and SMA30. Crossovers
//! (golden cross / death cross) compare SMA7 against SMA30 at the last two
//! evaluation points and are reported next to the trend, never instead of it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::{IndicatorSeries, IndicatorSnapshot};

/// Coarse directional classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "Uptrend",
            Trend::Downtrend => "Downtrend",
            Trend::Sideways => "Sideways",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying the latest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendReading {
    pub trend: Trend,
    /// Set when SMA7 or SMA30 was undefined and the label defaulted to Sideways.
    pub insufficient_data: bool,
}

/// Classify the trend from the latest close and the two moving averages.
///
/// - Uptrend: close > sma7 and sma7 > sma30
/// - Downtrend: close < sma7 and sma7 < sma30
/// - Sideways: anything else, including ties and missing averages
pub fn classify(close: f64, snapshot: &IndicatorSnapshot) -> TrendReading {
    let (sma7, sma30) = match (snapshot.sma7, snapshot.sma30) {
        (Some(fast), Some(slow)) => (fast, slow),
        _ => {
            return TrendReading {
                trend: Trend::Sideways,
                insufficient_data: true,
            }
        }
    };

    let trend = if close > sma7 && sma7 > sma30 {
        Trend::Uptrend
    } else if close < sma7 && sma7 < sma30 {
        Trend::Downtrend
    } else {
        Trend::Sideways
    };

    TrendReading {
        trend,
        insufficient_data: false,
    }
}

/// Moving-average crossover between two consecutive evaluation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    /// SMA7 moved from at-or-below SMA30 to above it.
    GoldenCross,
    /// SMA7 moved from at-or-above SMA30 to below it.
    DeathCross,
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crossover::GoldenCross => f.write_str("golden cross"),
            Crossover::DeathCross => f.write_str("death cross"),
        }
    }
}

/// Detect a crossover between `previous` and `current` snapshots.
///
/// Returns `None` when any of the four averages is undefined.
pub fn detect_crossover(
    previous: &IndicatorSnapshot,
    current: &IndicatorSnapshot,
) -> Option<Crossover> {
    let fast_prev = previous.sma7?;
    let slow_prev = previous.sma30?;
    let fast_cur = current.sma7?;
    let slow_cur = current.sma30?;

    if fast_cur > slow_cur && fast_prev <= slow_prev {
        Some(Crossover::GoldenCross)
    } else if fast_cur < slow_cur && fast_prev >= slow_prev {
        Some(Crossover::DeathCross)
    } else {
        None
    }
}

/// Crossover at the most recent point of an indicator series.
pub fn latest_crossover(series: &IndicatorSeries) -> Option<Crossover> {
    let n = series.len();
    if n < 2 {
        return None;
    }
    detect_crossover(&series.snapshot_at(n - 2), &series.snapshot_at(n - 1))
}

/// How steep the recent move is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
}

impl TrendStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendStrength::Strong => "Strong",
            TrendStrength::Moderate => "Moderate",
            TrendStrength::Weak => "Weak",
        }
    }
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closes used for the strength slope.
pub const STRENGTH_WINDOW: usize = 10;

/// Grade the slope of the last ten closes as a percentage of their mean.
///
/// Above 2% per day is strong, above 0.5% moderate, otherwise weak. Fewer
/// than ten closes always grade weak.
pub fn trend_strength(closes: &[f64]) -> TrendStrength {
    if closes.len() < STRENGTH_WINDOW {
        return TrendStrength::Weak;
    }
    let recent = &closes[closes.len() - STRENGTH_WINDOW..];
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    if mean <= 0.0 || !mean.is_finite() {
        return TrendStrength::Weak;
    }

    let slope_pct = linear_slope(recent).abs() / mean * 100.0;
    if slope_pct > 2.0 {
        TrendStrength::Strong
    } else if slope_pct > 0.5 {
        TrendStrength::Moderate
    } else {
        TrendStrength::Weak
    }
}

/// Least-squares slope of `y` against 0..n.
fn linear_slope(y: &[f64]) -> f64 {
    let n = y.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let xi = i as f64;
        num += (xi - x_mean) * (yi - y_mean);
        den += (xi - x_mean) * (xi - x_mean);
    }
    if den.abs() < 1e-12 {
        return 0.0;
    }
    num / den
}
