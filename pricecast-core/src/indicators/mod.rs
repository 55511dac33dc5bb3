//! Indicator engine: rolling SMA(7), SMA(30) and RSI(14).
//!
//! Indicators are pure functions: price history in, numeric series out.
//! Each output series has the same length as the input, carries `f64::NAN`
//! during warmup, and is aligned to the last point of its window. The
//! [`IndicatorSnapshot`] view turns NaN into `None` for consumers.

pub mod rsi;
pub mod sma;

pub use rsi::{Rsi, RsiSmoothing};
pub use sma::Sma;

use serde::{Deserialize, Serialize};

use crate::domain::{PricePoint, Series};

/// Short moving-average window.
pub const SMA_FAST_PERIOD: usize = 7;
/// Long moving-average window.
pub const SMA_SLOW_PERIOD: usize = 30;
/// Momentum oscillator window.
pub const RSI_PERIOD: usize = 14;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at index t may depend on price data from t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_7", "rsi_14").
    fn name(&self) -> &str;

    /// Number of points needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole history.
    ///
    /// Returns a `Vec<f64>` of the same length as `points`; the first
    /// `lookback()` values are `f64::NAN`.
    fn compute(&self, points: &[PricePoint]) -> Vec<f64>;
}

/// Indicator values at a single evaluation index.
///
/// Serializes with the upper-case keys used in analysis reports.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    #[serde(rename = "SMA7")]
    pub sma7: Option<f64>,
    #[serde(rename = "SMA30")]
    pub sma30: Option<f64>,
    #[serde(rename = "RSI14")]
    pub rsi14: Option<f64>,
}

impl IndicatorSnapshot {
    /// True when all three indicators are defined.
    pub fn is_complete(&self) -> bool {
        self.sma7.is_some() && self.sma30.is_some() && self.rsi14.is_some()
    }
}

/// Full per-point indicator series for one price history.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSeries {
    pub sma_fast: Vec<f64>,
    pub sma_slow: Vec<f64>,
    pub rsi: Vec<f64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.sma_fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma_fast.is_empty()
    }

    /// Snapshot at `index`; out-of-range indices yield an all-`None` snapshot.
    pub fn snapshot_at(&self, index: usize) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma7: defined(self.sma_fast.get(index).copied()),
            sma30: defined(self.sma_slow.get(index).copied()),
            rsi14: defined(self.rsi.get(index).copied()),
        }
    }

    /// Snapshot at the most recent point.
    pub fn latest(&self) -> IndicatorSnapshot {
        match self.len() {
            0 => IndicatorSnapshot::default(),
            n => self.snapshot_at(n - 1),
        }
    }

    /// Snapshots for every point, for charting collaborators.
    pub fn snapshots(&self) -> Vec<IndicatorSnapshot> {
        (0..self.len()).map(|i| self.snapshot_at(i)).collect()
    }
}

fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Computes the standard indicator set over a series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    sma_fast: Sma,
    sma_slow: Sma,
    rsi: Rsi,
}

impl IndicatorEngine {
    /// SMA(7), SMA(30) and simple-average RSI(14).
    pub fn standard() -> Self {
        Self {
            sma_fast: Sma::new(SMA_FAST_PERIOD),
            sma_slow: Sma::new(SMA_SLOW_PERIOD),
            rsi: Rsi::new(RSI_PERIOD),
        }
    }

    /// Standard windows with a different RSI smoothing.
    pub fn with_rsi_smoothing(smoothing: RsiSmoothing) -> Self {
        Self {
            rsi: Rsi::with_smoothing(RSI_PERIOD, smoothing),
            ..Self::standard()
        }
    }

    /// Indicators in evaluation order, for warmup reporting.
    pub fn indicators(&self) -> [&dyn Indicator; 3] {
        [&self.sma_fast as &dyn Indicator, &self.sma_slow, &self.rsi]
    }

    /// Points needed before every indicator is defined.
    pub fn warmup(&self) -> usize {
        self.indicators()
            .iter()
            .map(|ind| ind.lookback())
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn compute_points(&self, points: &[PricePoint]) -> IndicatorSeries {
        IndicatorSeries {
            sma_fast: self.sma_fast.compute(points),
            sma_slow: self.sma_slow.compute(points),
            rsi: self.rsi.compute(points),
        }
    }

    pub fn compute(&self, series: &Series) -> IndicatorSeries {
        self.compute_points(series.points())
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Create synthetic points from close prices for testing.
///
/// open = prev close (or close for the first point),
/// high = max(open, close) + 1.0, low = max(min(open, close) - 1.0, 0.01).
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: (open.min(close) - 1.0).max(0.01),
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
