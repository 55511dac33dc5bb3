//! Hold-out accuracy of the forecaster on the tail of a series.

use crate::domain::Series;
use crate::indicators::IndicatorEngine;

use super::{forecast, Horizon};

/// Points the training prefix must keep beyond the held-out tail.
pub const MIN_TRAINING_POINTS: usize = 10;

/// Forecast the last `horizon` closes from everything before them and score
/// the result as `max(0, 1 - MAPE)`.
///
/// Returns `None` when the series is shorter than `horizon + 10`.
pub fn holdout_accuracy(series: &Series, horizon: Horizon) -> Option<f64> {
    let h = horizon.days();
    if series.len() < h + MIN_TRAINING_POINTS {
        return None;
    }

    let train = series.truncated(series.len() - h)?;
    let indicators = IndicatorEngine::standard().compute(&train);
    let predicted = forecast(&train, &indicators, horizon).predicted_closes;

    let actual = &series.points()[series.len() - h..];
    let mape = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a.close).abs() / a.close)
        .sum::<f64>()
        / h as f64;

    Some((1.0 - mape).max(0.0))
}
