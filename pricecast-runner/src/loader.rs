//! CSV price loading and boundary validation.
//!
//! Reads `<data_dir>/<SYMBOL>.csv` with the columns
//! `Date,Symbol,Open,High,Low,Close,Volume`, keeps the rows inside the
//! requested date range, sorts them by date and hands them to
//! `Series::new`, which is the single point where ordering, duplicate dates
//! and price positivity are enforced.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pricecast_core::domain::{PricePoint, Series, SeriesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Columns every price file must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = ["Date", "Symbol", "Open", "High", "Low", "Close", "Volume"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: &'static str },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no data file for '{symbol}' (expected {})", .path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{} is missing columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("{symbol}: bad row {row} ({date}): {reason}")]
    BadRow {
        symbol: String,
        row: usize,
        date: NaiveDate,
        reason: &'static str,
    },

    #[error("no data for '{symbol}' between {start} and {end}")]
    EmptyRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("{symbol}: {source}")]
    Series { symbol: String, source: SeriesError },
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LoadError> {
        if start > end {
            return Err(LoadError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending at `end` (inclusive).
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end - chrono::Duration::days(i64::from(days.saturating_sub(1)));
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Trim and upper-case a symbol.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalize a symbol and check it is 2 to 10 ASCII letters or digits.
pub fn validate_symbol(raw: &str) -> Result<String, LoadError> {
    let symbol = normalize_symbol(raw);
    let invalid = |reason| LoadError::InvalidSymbol {
        symbol: symbol.clone(),
        reason,
    };

    if symbol.is_empty() {
        return Err(invalid("symbol is empty"));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("only letters and digits are allowed"));
    }
    if !(2..=10).contains(&symbol.len()) {
        return Err(invalid("length must be between 2 and 10"));
    }
    Ok(symbol)
}

/// One CSV row as written by the generator and by common exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl CsvRow {
    pub fn from_point(symbol: &str, point: &PricePoint) -> Self {
        Self {
            date: point.date,
            symbol: symbol.to_string(),
            open: point.open,
            high: point.high,
            low: point.low,
            close: point.close,
            volume: point.volume,
        }
    }

    fn to_point(&self) -> PricePoint {
        PricePoint {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Result of loading one symbol.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub symbol: String,
    pub series: Series,
    pub path: PathBuf,
    /// BLAKE3 over the loaded points, for tracing a report back to its data.
    pub dataset_hash: String,
}

/// Path of the price file for `symbol`.
pub fn csv_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{symbol}.csv"))
}

/// Load, filter and validate the price history of one symbol.
///
/// `range = None` keeps every row in the file.
pub fn load_series(
    data_dir: &Path,
    raw_symbol: &str,
    range: Option<DateRange>,
) -> Result<LoadedSeries, LoadError> {
    let symbol = validate_symbol(raw_symbol)?;
    let path = csv_path(data_dir, &symbol);
    if !path.exists() {
        return Err(LoadError::NotFound { symbol, path });
    }

    let rows = read_rows(&path)?;
    let total = rows.len();

    let mut foreign = 0usize;
    let mut points = Vec::with_capacity(total);
    for (row, record) in rows.iter().enumerate() {
        if normalize_symbol(&record.symbol) != symbol {
            foreign += 1;
            continue;
        }
        if range.is_some_and(|r| !r.contains(record.date)) {
            continue;
        }
        let point = record.to_point();
        check_row(&symbol, row + 1, &point)?;
        points.push(point);
    }

    if foreign > 0 {
        warn!(symbol = %symbol, skipped = foreign, "ignored rows belonging to other symbols");
    }

    if points.is_empty() {
        let (start, end) = match range {
            Some(r) => (r.start, r.end),
            None => (NaiveDate::MIN, NaiveDate::MAX),
        };
        return Err(LoadError::EmptyRange { symbol, start, end });
    }

    points.sort_by_key(|p| p.date);
    let dataset_hash = compute_dataset_hash(&symbol, &points);
    let series = Series::new(points).map_err(|source| LoadError::Series {
        symbol: symbol.clone(),
        source,
    })?;

    debug!(symbol = %symbol, rows = total, kept = series.len(), "loaded price series");

    Ok(LoadedSeries {
        symbol,
        series,
        path,
        dataset_hash,
    })
}

/// Read every row of a price file, checking the header first.
pub fn read_rows(path: &Path) -> Result<Vec<CsvRow>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    reader
        .deserialize()
        .collect::<Result<Vec<CsvRow>, _>>()
        .map_err(csv_err)
}

/// OHLC sanity beyond what `Series::new` checks.
fn check_row(symbol: &str, row: usize, point: &PricePoint) -> Result<(), LoadError> {
    let reason = if !point.has_positive_prices() {
        Some("prices must be finite and positive")
    } else if point.high < point.low {
        Some("high is below low")
    } else if !point.is_sane() {
        Some("open/close outside the high-low range")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(LoadError::BadRow {
            symbol: symbol.to_string(),
            row,
            date: point.date,
            reason,
        }),
        None => Ok(()),
    }
}

/// Deterministic BLAKE3 hash over the symbol and every OHLCV value.
fn compute_dataset_hash(symbol: &str, points: &[PricePoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for p in points {
        hasher.update(p.date.to_string().as_bytes());
        hasher.update(&p.open.to_le_bytes());
        hasher.update(&p.high.to_le_bytes());
        hasher.update(&p.low.to_le_bytes());
        hasher.update(&p.close.to_le_bytes());
        hasher.update(&p.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Symbols with a price file in `data_dir`, sorted.
pub fn available_symbols(data_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return Vec::new();
    };

    let mut symbols: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .filter_map(|path| path.file_stem().map(|s| normalize_symbol(&s.to_string_lossy())))
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

/// Summary of a price file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataInfo {
    pub symbol: String,
    pub total_days: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub avg_volume: f64,
}

/// Summarize the full price file of `symbol`.
pub fn data_info(data_dir: &Path, symbol: &str) -> Result<DataInfo, LoadError> {
    let loaded = load_series(data_dir, symbol, None)?;
    let points = loaded.series.points();
    let (start_date, end_date) = loaded.series.date_range();

    let highest_price = points.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest_price = points.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
    let avg_volume = points.iter().map(|p| p.volume as f64).sum::<f64>() / points.len() as f64;

    Ok(DataInfo {
        symbol: loaded.symbol,
        total_days: points.len(),
        start_date,
        end_date,
        highest_price,
        lowest_price,
        avg_volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Date,Symbol,Open,High,Low,Close,Volume\n";

    fn write_csv(dir: &Path, symbol: &str, body: &str) {
        let mut file = File::create(csv_path(dir, symbol)).unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn symbol_validation() {
        assert_eq!(validate_symbol("  fpt ").unwrap(), "FPT");
        assert_eq!(validate_symbol("vn30").unwrap(), "VN30");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("A").is_err());
        assert!(validate_symbol("ABCDEFGHIJK").is_err());
        assert!(validate_symbol("BR-K").is_err());
    }

    #[test]
    fn range_validation() {
        assert!(DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
        let r = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert!(r.contains(date(2024, 1, 1)));
        assert!(r.contains(date(2024, 1, 31)));
        assert!(!r.contains(date(2024, 2, 1)));

        let t = DateRange::trailing(date(2024, 3, 10), 10);
        assert_eq!(t.start, date(2024, 3, 1));
    }

    #[test]
    fn loads_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "FPT",
            "2024-01-04,FPT,11,12,10,11.5,300\n\
             2024-01-02,FPT,10,11,9,10.5,100\n\
             2024-01-03,FPT,10.5,11.5,10,11,200\n\
             2024-01-05,FPT,11.5,12.5,11,12,400\n",
        );

        let range = DateRange::new(date(2024, 1, 2), date(2024, 1, 4)).unwrap();
        let loaded = load_series(dir.path(), "fpt", Some(range)).unwrap();

        assert_eq!(loaded.symbol, "FPT");
        assert_eq!(loaded.series.closes(), vec![10.5, 11.0, 11.5]);
        assert!(!loaded.dataset_hash.is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_series(dir.path(), "VNM", None).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn missing_columns_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            csv_path(dir.path(), "HPG"),
            "Date,Open,Close\n2024-01-02,1,2\n",
        )
        .unwrap();
        let err = load_series(dir.path(), "HPG", None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Symbol") && msg.contains("High") && msg.contains("Volume"));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "VIC",
            "2024-01-02,VIC,10,11,9,10,100\n\
             2024-01-02,VIC,10,11,9,10.2,100\n",
        );
        let err = load_series(dir.path(), "VIC", None).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Series {
                source: SeriesError::DuplicateDate { .. },
                ..
            }
        ));
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "SSI",
            "2024-01-02,SSI,10,11,9,10,100\n\
             2024-01-03,SSI,10,11,0,10,100\n",
        );
        let err = load_series(dir.path(), "SSI", None).unwrap_err();
        assert!(matches!(err, LoadError::BadRow { row: 2, .. }));
    }

    #[test]
    fn empty_range_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "GAS", "2024-01-02,GAS,10,11,9,10,100\n");
        let range = DateRange::new(date(2023, 1, 1), date(2023, 12, 31)).unwrap();
        let err = load_series(dir.path(), "GAS", Some(range)).unwrap_err();
        assert!(matches!(err, LoadError::EmptyRange { .. }));
    }

    #[test]
    fn lists_symbols_and_summarizes() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "VCB",
            "2024-01-02,VCB,10,12,9,11,100\n\
             2024-01-03,VCB,11,13,10,12,300\n",
        );
        write_csv(dir.path(), "BVH", "2024-01-02,BVH,5,6,4,5,10\n");
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        assert_eq!(available_symbols(dir.path()), vec!["BVH", "VCB"]);

        let info = data_info(dir.path(), "VCB").unwrap();
        assert_eq!(info.total_days, 2);
        assert_eq!(info.start_date, date(2024, 1, 2));
        assert_eq!(info.end_date, date(2024, 1, 3));
        assert_eq!(info.highest_price, 13.0);
        assert_eq!(info.lowest_price, 9.0);
        assert_eq!(info.avg_volume, 200.0);
    }
}
