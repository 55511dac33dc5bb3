//! Series: the validated, read-only price history handed to the engine.
//!
//! Validation happens once, at construction. After that the engine treats the
//! series as immutable input and only hands out shared slices.

use chrono::NaiveDate;
use thiserror::Error;

use super::point::PricePoint;

/// Reasons a raw list of points is rejected at the engine boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,

    #[error("dates not strictly increasing at index {index}: {previous} then {current}")]
    Unordered {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("duplicate date {date} at index {index}")]
    DuplicateDate { index: usize, date: NaiveDate },

    #[error("non-positive or non-finite price on {date} (index {index})")]
    InvalidPrice { index: usize, date: NaiveDate },
}

/// Non-empty price history sorted ascending by date with unique dates and
/// positive finite prices.
#[derive(Debug, Clone)]
pub struct Series {
    points: Vec<PricePoint>,
}

impl Series {
    /// Validate and wrap a list of points.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if points.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (index, point) in points.iter().enumerate() {
            if !point.has_positive_prices() {
                return Err(SeriesError::InvalidPrice {
                    index,
                    date: point.date,
                });
            }
            if index == 0 {
                continue;
            }
            let previous = points[index - 1].date;
            if point.date == previous {
                return Err(SeriesError::DuplicateDate {
                    index,
                    date: point.date,
                });
            }
            if point.date < previous {
                return Err(SeriesError::Unordered {
                    index,
                    previous,
                    current: point.date,
                });
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn last_close(&self) -> f64 {
        self.last().close
    }

    /// First and last dates of the series.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first().date, self.last().date)
    }

    /// A new series holding the first `len` points, or `None` if `len` is zero
    /// or exceeds the series length.
    pub fn truncated(&self, len: usize) -> Option<Series> {
        if len == 0 || len > self.points.len() {
            return None;
        }
        Some(Series {
            points: self.points[..len].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn accepts_sorted_series() {
        let series = Series::new(vec![point(1, 10.0), point(2, 11.0), point(4, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_close(), 12.0);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        let (start, end) = series.date_range();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Series::new(vec![]).unwrap_err(), SeriesError::Empty);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = Series::new(vec![point(1, 10.0), point(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateDate { index: 1, .. }));
    }

    #[test]
    fn rejects_unordered_dates() {
        let err = Series::new(vec![point(2, 10.0), point(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::Unordered { index: 1, .. }));
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = Series::new(vec![point(1, 10.0), point(2, 0.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidPrice { index: 1, .. }));

        let mut bad = point(3, 10.0);
        bad.close = f64::NAN;
        let err = Series::new(vec![bad]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidPrice { index: 0, .. }));
    }

    #[test]
    fn truncated_keeps_prefix() {
        let series = Series::new(vec![point(1, 10.0), point(2, 11.0), point(3, 12.0)]).unwrap();
        let head = series.truncated(2).unwrap();
        assert_eq!(head.closes(), vec![10.0, 11.0]);
        assert!(series.truncated(0).is_none());
        assert!(series.truncated(4).is_none());
    }
}
