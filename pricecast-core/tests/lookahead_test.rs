//! Look-ahead contamination tests for the indicators and the forecaster.
//!
//! Invariant: no value at point t may depend on price data from t+1 or later.
//!
//! Method: compute on a truncated history (points 0..100) and the full history
//! (points 0..200). Assert points 0..100 are identical between both runs.

use chrono::NaiveDate;
use pricecast_core::domain::{PricePoint, Series};
use pricecast_core::forecast::{forecast, Horizon};
use pricecast_core::indicators::{Indicator, IndicatorEngine, Rsi, RsiSmoothing, Sma};

/// Generate N points of a deterministic pseudo-random walk.
fn make_test_points(n: usize) -> Vec<PricePoint> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut points = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        points.push(PricePoint {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000 + (i as u64 * 100),
        });
    }

    points
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &[PricePoint], truncated_len: usize) {
    let full_result = indicator.compute(full);
    let truncated_result = indicator.compute(&full[..truncated_len]);

    assert_eq!(
        truncated_result.len(),
        truncated_len,
        "{}: truncated result length mismatch",
        indicator.name()
    );

    for i in 0..truncated_len {
        let a = truncated_result[i];
        let b = full_result[i];
        if a.is_nan() {
            assert!(b.is_nan(), "{}: point {i} NaN only in truncated run", indicator.name());
        } else {
            assert!(
                (a - b).abs() < 1e-10,
                "{}: look-ahead at point {i}: truncated={a}, full={b}",
                indicator.name()
            );
        }
    }
}

#[test]
fn sma_has_no_lookahead() {
    let points = make_test_points(200);
    assert_no_lookahead(&Sma::new(7), &points, 100);
    assert_no_lookahead(&Sma::new(30), &points, 100);
}

#[test]
fn simple_rsi_has_no_lookahead() {
    let points = make_test_points(200);
    assert_no_lookahead(&Rsi::new(14), &points, 100);
}

#[test]
fn wilder_rsi_has_no_lookahead() {
    let points = make_test_points(200);
    assert_no_lookahead(&Rsi::with_smoothing(14, RsiSmoothing::Wilder), &points, 100);
}

#[test]
fn engine_indicators_have_no_lookahead() {
    let points = make_test_points(200);
    let engine = IndicatorEngine::standard();
    for indicator in engine.indicators() {
        assert_no_lookahead(indicator, &points, 100);
    }
}

/// The forecast for a prefix must not change when later points exist.
#[test]
fn forecast_uses_only_the_prefix() {
    let points = make_test_points(200);
    let prefix = Series::new(points[..120].to_vec()).unwrap();
    let engine = IndicatorEngine::standard();
    let horizon = Horizon::new(5).unwrap();

    let first = forecast(&prefix, &engine.compute(&prefix), horizon);

    let full = Series::new(points).unwrap();
    let again = full.truncated(120).unwrap();
    let second = forecast(&again, &engine.compute(&again), horizon);

    assert_eq!(first, second);
}
