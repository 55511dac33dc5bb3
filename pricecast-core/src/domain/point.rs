//! PricePoint: one daily bar for a single security.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// All prices finite and strictly positive.
    pub fn has_positive_prices(&self) -> bool {
        !self.is_void() && self.open > 0.0 && self.high > 0.0 && self.low > 0.0 && self.close > 0.0
    }

    /// Basic OHLC sanity check: high >= low and the body sits inside the range.
    pub fn is_sane(&self) -> bool {
        self.has_positive_prices()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point() -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn point_is_sane() {
        assert!(sample_point().is_sane());
    }

    #[test]
    fn point_detects_void() {
        let mut point = sample_point();
        point.close = f64::NAN;
        assert!(point.is_void());
        assert!(!point.has_positive_prices());
    }

    #[test]
    fn point_detects_inverted_range() {
        let mut point = sample_point();
        point.high = 97.0;
        assert!(point.has_positive_prices());
        assert!(!point.is_sane());
    }

    #[test]
    fn zero_close_is_not_positive() {
        let mut point = sample_point();
        point.close = 0.0;
        assert!(!point.has_positive_prices());
    }
}
