//! Trend-extrapolation forecast used whenever the regression branch fails.
//!
//! Projects `last_close + k * drift` where drift is the mean close-to-close
//! delta over the trailing window, then clips each value to the band
//! `last * exp(±VOLATILITY_BAND * sigma * sqrt(k))`. Sigma is the relative
//! volatility of the last 20 returns, never below `MIN_DAILY_VOLATILITY`, so
//! the drift cannot widen its own limit. Values never drop below a fixed
//! fraction of the last close, so a positive last close always yields
//! positive, finite forecasts.

use crate::domain::Series;

use super::bounds::relative_volatility;
use super::Horizon;

/// Closes in the trailing drift window (four deltas).
pub const FALLBACK_WINDOW: usize = 5;

/// Band half-width in units of `sigma * sqrt(k)` on the log scale.
pub const VOLATILITY_BAND: f64 = 3.0;

/// Lower limit on the daily relative volatility used for the band.
pub const MIN_DAILY_VOLATILITY: f64 = 0.01;

/// Forecasts never go below this fraction of the last close.
pub const PRICE_FLOOR_FRACTION: f64 = 0.1;

/// Mean close-to-close delta over the last `FALLBACK_WINDOW` closes.
/// Non-finite or empty windows give zero.
pub fn recent_drift(closes: &[f64]) -> f64 {
    let start = closes.len().saturating_sub(FALLBACK_WINDOW);
    let window = &closes[start..];
    let deltas: Vec<f64> = window.windows(2).map(|w| w[1] - w[0]).collect();

    if deltas.is_empty() {
        return 0.0;
    }
    finite_or_zero(deltas.iter().sum::<f64>() / deltas.len() as f64)
}

/// Project `horizon` closes from the recent drift.
pub fn trend_extrapolation(series: &Series, horizon: Horizon) -> Vec<f64> {
    let closes = series.closes();
    let last = series.last_close();
    let drift = recent_drift(&closes);
    let sigma = band_volatility(&closes);

    (1..=horizon.days())
        .map(|k| {
            let k = k as f64;
            let raw = last + k * drift;
            let spread = (VOLATILITY_BAND * sigma * k.sqrt()).exp();
            let clipped = raw.min(last * spread).max(last / spread);
            clipped.max(last * PRICE_FLOOR_FRACTION)
        })
        .collect()
}

/// Daily relative volatility that sizes the clipping band.
pub fn band_volatility(closes: &[f64]) -> f64 {
    finite_or_zero(relative_volatility(closes)).max(MIN_DAILY_VOLATILITY)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::bounds;
    use crate::indicators::make_points;

    fn series(closes: &[f64]) -> Series {
        Series::new(make_points(closes)).unwrap()
    }

    #[test]
    fn flat_series_repeats_last_close() {
        let values = trend_extrapolation(&series(&[25.0; 12]), Horizon::new(7).unwrap());
        assert_eq!(values, vec![25.0; 7]);
    }

    #[test]
    fn single_point_repeats_last_close() {
        let values = trend_extrapolation(&series(&[12.5]), Horizon::new(3).unwrap());
        assert_eq!(values, vec![12.5; 3]);
    }

    #[test]
    fn steady_climb_extends() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let values = trend_extrapolation(&series(&closes), Horizon::new(10).unwrap());
        // sigma floors at 1%: the band at k = 10 reaches 119 * e^0.095 ≈ 130.8
        for (k, v) in values.iter().enumerate() {
            let expected = 120.0 + k as f64;
            assert!((v - expected).abs() < 1e-9, "{v} vs {expected}");
        }
    }

    #[test]
    fn drop_is_clipped_before_day_ten() {
        let mut closes = vec![100.0; 25];
        closes.push(80.0);
        let values = trend_extrapolation(&series(&closes), Horizon::new(10).unwrap());
        let sigma = band_volatility(&closes);

        // drift -5 per day; the first day is inside the band
        assert!((values[0] - 75.0).abs() < 1e-9);

        let mut first_clipped = None;
        for (i, v) in values.iter().enumerate() {
            let k = (i + 1) as f64;
            let raw = 80.0 - 5.0 * k;
            let lower = 80.0 * (-VOLATILITY_BAND * sigma * k.sqrt()).exp();
            assert!((v - raw.max(lower)).abs() < 1e-9, "day {}", i + 1);
            if lower > raw && first_clipped.is_none() {
                first_clipped = Some(i + 1);
            }
        }
        assert_eq!(first_clipped, Some(4));
    }

    #[test]
    fn single_shock_does_not_hit_the_floor() {
        let mut closes = vec![100.0; 60];
        closes.extend((0..20).map(|i| if i % 2 == 0 { 99.5 } else { 100.5 }));
        closes.push(5.0);
        let values = trend_extrapolation(&series(&closes), Horizon::new(5).unwrap());

        assert!(values[0] > 0.5 * 5.0, "day 1 {}", values[0]);
        for w in values.windows(2) {
            assert!(w[1] < w[0]);
        }
        assert!(values.iter().all(|v| *v > 5.0 * PRICE_FLOOR_FRACTION));
    }

    #[test]
    fn band_volatility_has_a_minimum() {
        assert_eq!(band_volatility(&[50.0; 30]), bounds::DEFAULT_SIGMA);
        let climb: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(band_volatility(&climb), MIN_DAILY_VOLATILITY);
    }

    #[test]
    fn crash_stays_positive() {
        let values = trend_extrapolation(
            &series(&[100.0, 60.0, 30.0, 10.0, 2.0]),
            Horizon::new(10).unwrap(),
        );
        assert_eq!(values.len(), 10);
        for v in values {
            assert!(v.is_finite());
            assert!(v >= 0.2 - 1e-12);
        }
    }

    #[test]
    fn drift_of_trailing_window() {
        assert_eq!(recent_drift(&[1.0, 1.0, 10.0, 12.0, 14.0, 16.0, 18.0]), 2.0);
        assert_eq!(recent_drift(&[7.0]), 0.0);
    }
}
