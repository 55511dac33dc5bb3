//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (period deltas need period + 1 closes).
//!
//! The default smoothing is a plain windowed average: every value looks only
//! at the trailing `period` close-to-close deltas. Wilder smoothing is kept as
//! an alternative for comparison against charting packages.
//!
//! Edge cases: avg_loss == 0 and avg_gain > 0 → 100; both zero → 50;
//! avg_gain == 0 and avg_loss > 0 → 0.

use super::Indicator;
use crate::domain::PricePoint;

/// How average gain and average loss are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsiSmoothing {
    /// Arithmetic mean over the trailing window.
    #[default]
    Simple,
    /// Wilder's recursive smoothing seeded with the first window mean.
    Wilder,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self::with_smoothing(period, RsiSmoothing::Simple)
    }

    pub fn with_smoothing(period: usize, smoothing: RsiSmoothing) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            smoothing,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn smoothing(&self) -> RsiSmoothing {
        self.smoothing
    }

    fn compute_simple(&self, changes: &[f64], result: &mut [f64]) {
        for i in self.period..changes.len() {
            let window = &changes[(i + 1 - self.period)..=i];
            let (gain, loss) = split_changes(window);
            result[i] = rsi_from_averages(gain / self.period as f64, loss / self.period as f64);
        }
    }

    fn compute_wilder(&self, changes: &[f64], result: &mut [f64]) {
        let (seed_gain, seed_loss) = split_changes(&changes[1..=self.period]);
        let mut avg_gain = seed_gain / self.period as f64;
        let mut avg_loss = seed_loss / self.period as f64;
        result[self.period] = rsi_from_averages(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..changes.len() {
            let gain = changes[i].max(0.0);
            let loss = (-changes[i]).max(0.0);
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            result[i] = rsi_from_averages(avg_gain, avg_loss);
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let n = points.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        // changes[i] = close[i] - close[i-1]; changes[0] is unused.
        let mut changes = vec![0.0; n];
        for i in 1..n {
            changes[i] = points[i].close - points[i - 1].close;
        }

        match self.smoothing {
            RsiSmoothing::Simple => self.compute_simple(&changes, &mut result),
            RsiSmoothing::Wilder => self.compute_wilder(&changes, &mut result),
        }

        result
    }
}

/// Sum of gains and sum of loss magnitudes over a slice of deltas.
fn split_changes(changes: &[f64]) -> (f64, f64) {
    changes.iter().fold((0.0, 0.0), |(gain, loss), &ch| {
        if ch > 0.0 {
            (gain + ch, loss)
        } else {
            (gain, loss - ch)
        }
    })
}

/// Map average gain / average loss to an RSI value in [0, 100].
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if !(avg_gain.is_finite() && avg_loss.is_finite()) {
        return 50.0;
    }
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_points};

    #[test]
    fn rsi_all_gains() {
        let points = make_points(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&points);
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let points = make_points(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&points);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_is_neutral() {
        let points = make_points(&[50.0; 20]);
        let result = Rsi::new(14).compute(&points);
        assert!(result[13].is_nan());
        assert_approx(result[14], 50.0, 1e-12);
        assert_approx(result[19], 50.0, 1e-12);
    }

    #[test]
    fn rsi_mixed_window() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Window at index 3: gains 0.34, losses 0.73 → RS = 0.34 / 0.73
        // Window at index 4: gains 0.72, losses 0.73 → RS = 0.72 / 0.73
        let points = make_points(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&points);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_simple_window_forgets_old_moves() {
        // A large early drop leaves the 3-delta window after three gains.
        let points = make_points(&[100.0, 80.0, 81.0, 82.0, 83.0]);
        let simple = Rsi::new(3).compute(&points);
        let wilder = Rsi::with_smoothing(3, RsiSmoothing::Wilder).compute(&points);
        assert_approx(simple[4], 100.0, 1e-9);
        assert!(wilder[4] < 100.0);
    }

    #[test]
    fn rsi_needs_period_plus_one_points() {
        let points = make_points(&[1.0; 14]);
        let result = Rsi::new(14).compute(&points);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_bounds() {
        let points = make_points(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for smoothing in [RsiSmoothing::Simple, RsiSmoothing::Wilder] {
            let result = Rsi::with_smoothing(3, smoothing).compute(&points);
            for (i, &v) in result.iter().enumerate() {
                if !v.is_nan() {
                    assert!(
                        (0.0..=100.0).contains(&v),
                        "RSI out of bounds at point {i}: {v}"
                    );
                }
            }
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
