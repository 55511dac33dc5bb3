//! Ordinary least squares over engineered indicator features.
//!
//! Each training row pairs `[time, sma7, sma30, rsi14]` observed on day t with
//! the close of day t+1. The time coordinate of a row is the label day (t+1),
//! so a forecast for day `last + k` evaluates the model at `last + k`.
//!
//! Features are standardised before fitting and the normal equations
//! `(X'X) b = X'y` are solved by Cholesky decomposition. Every way the fit can
//! go wrong is a [`FitError`] value; the caller decides what to do with it.

use thiserror::Error;

use crate::indicators::{IndicatorSeries, IndicatorSnapshot};

/// Number of engineered features per row.
pub const FEATURE_COUNT: usize = 4;

/// Feature names in column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["time_index", "sma7", "sma30", "rsi14"];

/// Fewest rows the regression will fit on.
pub const MIN_TRAINING_ROWS: usize = 10;

/// Pivots below this fraction of their original diagonal mark a singular system.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Columns whose spread is below this fraction of their magnitude are constant.
const VARIANCE_TOLERANCE: f64 = 1e-9;

/// Why the regression branch could not produce a forecast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("insufficient history: {rows} training rows, need {required}")]
    InsufficientRows { rows: usize, required: usize },

    #[error("feature '{feature}' has zero variance")]
    DegenerateFeature { feature: &'static str },

    #[error("feature matrix is singular")]
    SingularMatrix,

    #[error("fit produced non-finite coefficients")]
    NonFinite,

    #[error("latest indicator snapshot is incomplete")]
    IncompleteSnapshot,

    #[error("implausible prediction {value:.4} for day {day} (last close {last_close:.4})")]
    ImplausiblePrediction {
        day: usize,
        value: f64,
        last_close: f64,
    },
}

/// Feature rows and next-day labels.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub rows: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<f64>,
}

impl TrainingSet {
    /// Build rows for every day whose three indicators are defined and which
    /// has a following close.
    pub fn build(closes: &[f64], indicators: &IndicatorSeries) -> Self {
        let mut set = TrainingSet::default();
        for t in 0..closes.len().saturating_sub(1) {
            if let Some(features) = features_for(t + 1, &indicators.snapshot_at(t)) {
                set.rows.push(features);
                set.labels.push(closes[t + 1]);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Feature vector for label day `day` from a snapshot, if complete.
pub fn features_for(day: usize, snapshot: &IndicatorSnapshot) -> Option<[f64; FEATURE_COUNT]> {
    Some([day as f64, snapshot.sma7?, snapshot.sma30?, snapshot.rsi14?])
}

/// A fitted linear model over standardised features.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
    /// Intercept followed by one weight per standardised feature.
    weights: [f64; FEATURE_COUNT + 1],
}

impl LinearModel {
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut value = self.weights[0];
        for j in 0..FEATURE_COUNT {
            value += self.weights[j + 1] * (features[j] - self.means[j]) / self.scales[j];
        }
        value
    }

    pub fn intercept(&self) -> f64 {
        self.weights[0]
    }
}

/// Fit OLS on a training set.
pub fn try_fit(set: &TrainingSet) -> Result<LinearModel, FitError> {
    let n = set.len();
    if n < MIN_TRAINING_ROWS {
        return Err(FitError::InsufficientRows {
            rows: n,
            required: MIN_TRAINING_ROWS,
        });
    }

    let mut means = [0.0; FEATURE_COUNT];
    let mut scales = [0.0; FEATURE_COUNT];
    for j in 0..FEATURE_COUNT {
        let mean = set.rows.iter().map(|r| r[j]).sum::<f64>() / n as f64;
        let var = set.rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n as f64;
        let std = var.sqrt();
        if !std.is_finite() || std <= VARIANCE_TOLERANCE * mean.abs().max(1.0) {
            return Err(FitError::DegenerateFeature {
                feature: FEATURE_NAMES[j],
            });
        }
        means[j] = mean;
        scales[j] = std;
    }

    // Design rows: [1, z_1, .., z_4]
    const P: usize = FEATURE_COUNT + 1;
    let mut xtx = [[0.0; P]; P];
    let mut xty = [0.0; P];
    for (row, &label) in set.rows.iter().zip(&set.labels) {
        let mut x = [1.0; P];
        for j in 0..FEATURE_COUNT {
            x[j + 1] = (row[j] - means[j]) / scales[j];
        }
        for a in 0..P {
            xty[a] += x[a] * label;
            for b in 0..P {
                xtx[a][b] += x[a] * x[b];
            }
        }
    }

    let weights = cholesky_solve(&xtx, &xty)?;
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(FitError::NonFinite);
    }

    Ok(LinearModel {
        means,
        scales,
        weights,
    })
}

/// Solve `a x = b` for symmetric positive definite `a`.
fn cholesky_solve<const P: usize>(a: &[[f64; P]; P], b: &[f64; P]) -> Result<[f64; P], FitError> {
    let mut l = [[0.0; P]; P];

    for i in 0..P {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let diag = a[i][i] - sum;
                if !diag.is_finite() || diag <= PIVOT_TOLERANCE * a[i][i].abs().max(1.0) {
                    return Err(FitError::SingularMatrix);
                }
                l[i][j] = diag.sqrt();
            } else {
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }
    }

    // L z = b
    let mut z = [0.0; P];
    for i in 0..P {
        let sum: f64 = (0..i).map(|j| l[i][j] * z[j]).sum();
        z[i] = (b[i] - sum) / l[i][i];
    }

    // L^T x = z
    let mut x = [0.0; P];
    for i in (0..P).rev() {
        let sum: f64 = ((i + 1)..P).map(|j| l[j][i] * x[j]).sum();
        x[i] = (z[i] - sum) / l[i][i];
    }

    Ok(x)
}
