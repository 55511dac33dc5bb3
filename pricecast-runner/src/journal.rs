//! Daily analysis journal: one pretty JSON file per day.
//!
//! `<reports_dir>/YYYY-MM-DD.json` holds `{ "date": ..., "records": [...] }`.
//! Each analysis appends one record. A missing file or one that cannot be
//! parsed is treated as empty and rewritten on the next append. Any other
//! read failure is an error, so a day's records are never overwritten blind.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use pricecast_core::indicators::IndicatorSnapshot;
use pricecast_core::signal::Signal;
use pricecast_core::trend::Trend;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::pipeline::AdvisedReport;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to serialize journal: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub symbol: String,
    pub latest_price: f64,
    pub trend: Trend,
    pub signal: Signal,
    pub reason: String,
    #[serde(default)]
    pub ai_advice: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_indicators: Option<IndicatorSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_next_days: Option<Vec<f64>>,
}

impl JournalRecord {
    pub fn from_report(report: &AdvisedReport) -> Self {
        let analysis = &report.analysis;
        Self {
            symbol: analysis.symbol().to_string(),
            latest_price: analysis.latest_price(),
            trend: analysis.trend(),
            signal: analysis.signal(),
            reason: analysis.reason().to_string(),
            ai_advice: report.ai_advice.clone().unwrap_or_default(),
            generated_at: analysis.generated_at(),
            technical_indicators: Some(*analysis.indicators()),
            forecast_next_days: Some(analysis.forecast().predicted_closes.clone()),
        }
    }
}

/// Contents of one day's file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyJournal {
    pub date: NaiveDate,
    pub records: Vec<JournalRecord>,
}

impl DailyJournal {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            records: Vec::new(),
        }
    }
}

/// Where an append landed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOutcome {
    pub path: PathBuf,
    pub total_records_today: usize,
}

/// Aggregate counts over a window of days.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalStats {
    pub total_analyses: usize,
    pub symbols_analyzed: BTreeSet<String>,
    pub signals: BTreeMap<String, usize>,
    pub trends: BTreeMap<String, usize>,
    pub daily_counts: BTreeMap<NaiveDate, usize>,
}

/// Journal rooted at a reports directory.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Read one day's journal. Missing or unparseable files yield an empty day.
    pub fn load_day(&self, date: NaiveDate) -> Result<DailyJournal, JournalError> {
        let path = self.path_for(date);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DailyJournal::empty(date)),
            Err(source) => return Err(JournalError::Io { path, source }),
        };
        match serde_json::from_str::<DailyJournal>(&content) {
            Ok(day) => Ok(day),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt journal file, starting fresh");
                Ok(DailyJournal::empty(date))
            }
        }
    }

    /// Append a record to the file for `date`.
    pub fn append(
        &self,
        date: NaiveDate,
        record: JournalRecord,
    ) -> Result<AppendOutcome, JournalError> {
        fs::create_dir_all(&self.dir).map_err(|source| JournalError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut day = self.load_day(date)?;
        day.records.push(record);

        let path = self.path_for(date);
        let json = serde_json::to_string_pretty(&day)?;
        fs::write(&path, json).map_err(|source| JournalError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), records = day.records.len(), "journal updated");

        Ok(AppendOutcome {
            path,
            total_records_today: day.records.len(),
        })
    }

    /// Records from every day in `[start, end]`, oldest first.
    pub fn records_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, JournalRecord)>, JournalError> {
        let mut out = Vec::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let day = self.load_day(date)?;
            out.extend(day.records.into_iter().map(|r| (date, r)));
        }
        Ok(out)
    }

    /// Counts over the `days_back` days ending at `today`.
    pub fn statistics(&self, today: NaiveDate, days_back: u32) -> Result<JournalStats, JournalError> {
        let mut stats = JournalStats::default();

        for back in 0..days_back {
            let date = today - chrono::Duration::days(i64::from(back));
            if !self.path_for(date).exists() {
                continue;
            }
            let day = self.load_day(date)?;
            stats.daily_counts.insert(date, day.records.len());
            stats.total_analyses += day.records.len();

            for record in day.records {
                *stats.signals.entry(record.signal.to_string()).or_default() += 1;
                *stats.trends.entry(record.trend.to_string()).or_default() += 1;
                if !record.symbol.is_empty() {
                    stats.symbols_analyzed.insert(record.symbol);
                }
            }
        }

        Ok(stats)
    }

    /// Delete day files older than `days_to_keep` days before `today`.
    ///
    /// Files whose names are not dates are left alone.
    pub fn cleanup(&self, today: NaiveDate, days_to_keep: u32) -> Result<usize, JournalError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(JournalError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let cutoff = today - chrono::Duration::days(i64::from(days_to_keep));
        let mut deleted = 0;

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let Some(date) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                continue;
            };
            if date < cutoff {
                fs::remove_file(&path).map_err(|source| JournalError::Io {
                    path: path.clone(),
                    source,
                })?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
