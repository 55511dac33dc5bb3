//! Forecast engine: regression first, trend extrapolation as fallback.
//!
//! The engine is a two-branch algorithm. [`regression::try_fit`] and the
//! plausibility check return a [`FitError`] instead of panicking; any error
//! routes to [`fallback::trend_extrapolation`]. Callers always receive
//! exactly `horizon` finite values derived from the last observed close.

pub mod accuracy;
pub mod bounds;
pub mod fallback;
pub mod regression;

pub use accuracy::holdout_accuracy;
pub use bounds::{volatility_bounds, ForecastBound};
pub use fallback::trend_extrapolation;
pub use regression::{try_fit, FitError, LinearModel, TrainingSet};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::Series;
use crate::indicators::IndicatorSeries;

/// Predictions outside `[last / MAX_RATIO, last * MAX_RATIO]` are implausible.
pub const MAX_RATIO: f64 = 10.0;

/// Forecast length in trading days, 1 through 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Horizon(usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HorizonError {
    #[error("forecast horizon must be between 1 and 10 days, got {got}")]
    OutOfRange { got: usize },
}

impl Horizon {
    pub const MIN: usize = 1;
    pub const MAX: usize = 10;

    pub fn new(days: usize) -> Result<Self, HorizonError> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Ok(Self(days))
        } else {
            Err(HorizonError::OutOfRange { got: days })
        }
    }

    pub fn days(&self) -> usize {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<usize> for Horizon {
    type Error = HorizonError;

    fn try_from(days: usize) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<Horizon> for usize {
    fn from(h: Horizon) -> usize {
        h.0
    }
}

/// Which branch produced the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    LinearRegression,
    TrendFallback,
}

impl ForecastMethod {
    /// Same spelling as the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMethod::LinearRegression => "linear_regression",
            ForecastMethod::TrendFallback => "trend_fallback",
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub horizon_days: usize,
    pub predicted_closes: Vec<f64>,
    pub method: ForecastMethod,
    /// Why the regression branch was abandoned, when it was.
    pub fallback_reason: Option<String>,
    pub bounds: Vec<ForecastBound>,
}

impl ForecastResult {
    pub fn used_fallback(&self) -> bool {
        self.method == ForecastMethod::TrendFallback
    }
}

/// Forecast `horizon` closes after the end of `series`.
pub fn forecast(series: &Series, indicators: &IndicatorSeries, horizon: Horizon) -> ForecastResult {
    let closes = series.closes();

    let (predicted_closes, method, fallback_reason) =
        match regression_forecast(&closes, indicators, horizon) {
            Ok(values) => (values, ForecastMethod::LinearRegression, None),
            Err(err) => {
                debug!(error = %err, points = closes.len(), "regression forecast rejected, using trend fallback");
                (
                    trend_extrapolation(series, horizon),
                    ForecastMethod::TrendFallback,
                    Some(err.to_string()),
                )
            }
        };

    let bounds = volatility_bounds(&predicted_closes, &closes);

    ForecastResult {
        horizon_days: horizon.days(),
        predicted_closes,
        method,
        fallback_reason,
        bounds,
    }
}

/// Regression branch. Indicator features stay frozen at the latest snapshot;
/// only the time coordinate advances.
fn regression_forecast(
    closes: &[f64],
    indicators: &IndicatorSeries,
    horizon: Horizon,
) -> Result<Vec<f64>, FitError> {
    let set = TrainingSet::build(closes, indicators);
    let model = try_fit(&set)?;

    let last_index = closes.len() - 1;
    let last_close = closes[last_index];
    let latest = indicators.latest();

    (1..=horizon.days())
        .map(|k| {
            let features = regression::features_for(last_index + k, &latest)
                .ok_or(FitError::IncompleteSnapshot)?;
            let value = model.predict(&features);
            check_plausible(k, value, last_close)
        })
        .collect()
}

fn check_plausible(day: usize, value: f64, last_close: f64) -> Result<f64, FitError> {
    let plausible = value.is_finite()
        && value > 0.0
        && value <= last_close * MAX_RATIO
        && value >= last_close / MAX_RATIO;
    if plausible {
        Ok(value)
    } else {
        Err(FitError::ImplausiblePrediction {
            day,
            value,
            last_close,
        })
    }
}
