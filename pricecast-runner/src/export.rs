//! Export of analysis reports and journal records.
//!
//! - **JSON**: pretty-printed array of reports, same shape as a single report
//! - **CSV**: one flattened row per report, forecast values joined with `;`
//! - **Markdown**: short human-readable summary for one report

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::ExportFormat;
use crate::journal::JournalRecord;
use crate::pipeline::AdvisedReport;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize one report to pretty JSON.
pub fn report_json(report: &AdvisedReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report to JSON")
}

/// Serialize many reports as a pretty JSON array.
pub fn reports_json(reports: &[AdvisedReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).context("failed to serialize reports to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

const REPORT_COLUMNS: [&str; 16] = [
    "symbol",
    "start_date",
    "end_date",
    "latest_price",
    "sma7",
    "sma30",
    "rsi14",
    "trend",
    "trend_strength",
    "crossover",
    "signal",
    "forecast_method",
    "forecast_next_days",
    "forecast_accuracy",
    "reason",
    "ai_advice",
];

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_default()
}

/// Export reports as CSV, one row per report.
pub fn reports_csv(reports: &[AdvisedReport]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(REPORT_COLUMNS)?;

    for report in reports {
        let a = &report.analysis;
        let (start, end) = a.date_range();
        let ind = a.indicators();
        let forecast = a
            .forecast()
            .predicted_closes
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join(";");

        wtr.write_record([
            a.symbol().to_string(),
            start.to_string(),
            end.to_string(),
            format!("{:.4}", a.latest_price()),
            opt(ind.sma7),
            opt(ind.sma30),
            opt(ind.rsi14),
            a.trend().to_string(),
            a.trend_strength().to_string(),
            a.crossover().map(|c| c.to_string()).unwrap_or_default(),
            a.signal().to_string(),
            a.forecast().method.to_string(),
            forecast,
            opt(report.forecast_accuracy),
            a.reason().to_string(),
            report.ai_advice.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Export dated journal records as CSV.
pub fn journal_csv(records: &[(NaiveDate, JournalRecord)]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "symbol",
        "latest_price",
        "trend",
        "signal",
        "generated_at",
        "reason",
        "ai_advice",
    ])?;

    for (date, r) in records {
        wtr.write_record([
            date.to_string(),
            r.symbol.clone(),
            format!("{:.4}", r.latest_price),
            r.trend.to_string(),
            r.signal.to_string(),
            r.generated_at.to_rfc3339(),
            r.reason.clone(),
            r.ai_advice.clone(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── File output ────────────────────────────────────────────────────

/// Write reports to `<export_dir>/pricecast_<stamp>.<ext>`.
///
/// Returns the path written.
pub fn save_reports(
    reports: &[AdvisedReport],
    export_dir: &Path,
    format: ExportFormat,
    stamp: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(export_dir)
        .with_context(|| format!("failed to create {}", export_dir.display()))?;

    let body = match format {
        ExportFormat::Json => reports_json(reports)?,
        ExportFormat::Csv => reports_csv(reports)?,
    };
    let path = export_dir.join(format!("pricecast_{stamp}.{}", format.extension()));
    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Human-readable summary of one report.
pub fn report_markdown(report: &AdvisedReport) -> String {
    let a = &report.analysis;
    let (start, end) = a.date_range();
    let ind = a.indicators();
    let na = |v: Option<f64>| v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "n/a".into());

    let mut md = String::new();
    md.push_str(&format!("# {} analysis\n\n", a.symbol()));
    md.push_str(&format!("Data: {start} to {end}\n\n"));

    md.push_str("| Metric | Value |\n|---|---|\n");
    md.push_str(&format!("| Latest close | {:.2} |\n", a.latest_price()));
    md.push_str(&format!("| SMA7 | {} |\n", na(ind.sma7)));
    md.push_str(&format!("| SMA30 | {} |\n", na(ind.sma30)));
    md.push_str(&format!("| RSI14 | {} |\n", na(ind.rsi14)));
    md.push_str(&format!("| Trend | {} ({}) |\n", a.trend(), a.trend_strength()));
    if let Some(cross) = a.crossover() {
        md.push_str(&format!("| Crossover | {cross} |\n"));
    }
    md.push_str(&format!("| Signal | **{}** |\n\n", a.signal()));

    md.push_str(&format!(
        "## Forecast ({} days, {})\n\n",
        a.forecast().horizon_days,
        a.forecast().method
    ));
    for (i, (value, bound)) in a
        .forecast()
        .predicted_closes
        .iter()
        .zip(&a.forecast().bounds)
        .enumerate()
    {
        md.push_str(&format!(
            "- day {}: {:.2} ({:.2} to {:.2})\n",
            i + 1,
            value,
            bound.min,
            bound.max
        ));
    }
    if let Some(acc) = report.forecast_accuracy {
        md.push_str(&format!("\nHold-out accuracy: {:.1}%\n", acc * 100.0));
    }

    md.push_str(&format!("\n## Reason\n\n{}\n", a.reason()));
    if let Some(advice) = &report.ai_advice {
        md.push_str(&format!("\n## Advice\n\n{advice}\n"));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pricecast_core::analysis::analyze_at;
    use pricecast_core::domain::{PricePoint, Series};
    use pricecast_core::forecast::Horizon;

    fn sample_report(symbol: &str) -> AdvisedReport {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let points = (0..45)
            .map(|i| {
                let close = 50.0 + i as f64 * 0.5;
                PricePoint {
                    date: start + chrono::Duration::days(i),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000,
                }
            })
            .collect();
        let series = Series::new(points).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        AdvisedReport {
            analysis: analyze_at(symbol, &series, Horizon::new(3).unwrap(), at),
            ai_advice: Some("Hold steady, watch the stop-loss.".into()),
            forecast_accuracy: Some(0.97),
            dataset_hash: "abc".into(),
        }
    }

    #[test]
    fn json_array_has_every_report() {
        let json = reports_json(&[sample_report("FPT"), sample_report("VNM")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1]["symbol"], "VNM");
        assert_eq!(arr[0]["ai_advice"], "Hold steady, watch the stop-loss.");
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = reports_csv(&[sample_report("FPT")]).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert_eq!(header.split(',').count(), REPORT_COLUMNS.len());
        let row = lines.next().unwrap();
        assert!(row.starts_with("FPT,"));
        assert!(row.contains("BUY") || row.contains("HOLD"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_forecast_values_are_joined() {
        let csv = reports_csv(&[sample_report("FPT")]).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record[12].split(';').count(), 3);
        assert_eq!(&record[13], "0.9700");
    }

    #[test]
    fn csv_labels_match_json_report() {
        let report = sample_report("FPT");
        let csv = reports_csv(std::slice::from_ref(&report)).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(&record[8], json["trend_strength"].as_str().unwrap());
        assert_eq!(&record[11], json["forecast_method"].as_str().unwrap());
        assert!(!record[11].chars().any(char::is_uppercase));
    }

    #[test]
    fn journal_csv_rows() {
        let report = sample_report("HPG");
        let record = JournalRecord::from_report(&report);
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let csv = journal_csv(&[(date, record)]).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("2024-06-01,HPG,"));
    }

    #[test]
    fn save_writes_format_extension() {
        let dir = tempfile::tempdir().unwrap();
        let reports = [sample_report("FPT")];

        let json_path =
            save_reports(&reports, &dir.path().join("out"), ExportFormat::Json, "t1").unwrap();
        assert!(json_path.ends_with("pricecast_t1.json"));
        assert!(json_path.exists());

        let csv_path = save_reports(&reports, dir.path(), ExportFormat::Csv, "t1").unwrap();
        assert!(csv_path.ends_with("pricecast_t1.csv"));
    }

    #[test]
    fn markdown_has_sections() {
        let md = report_markdown(&sample_report("VCB"));
        assert!(md.starts_with("# VCB analysis"));
        assert!(md.contains("## Forecast (3 days"));
        assert!(md.contains("- day 3:"));
        assert!(md.contains("## Reason"));
        assert!(md.contains("## Advice"));
        assert!(md.contains("97.0%"));
    }
}
