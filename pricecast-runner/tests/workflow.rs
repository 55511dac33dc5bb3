//! End-to-end: generate data → load → analyze → journal → export.

use std::fs;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pricecast_core::forecast::Horizon;
use pricecast_runner::export::{journal_csv, reports_json, save_reports};
use pricecast_runner::{
    available_symbols, build_advisor, data_info, generate_universe, partition, run_analysis,
    AdviceConfig, AdviceMode, AnalysisRequest, AppConfig, BatchAnalyzer, DateRange, ExportFormat,
    Journal, JournalRecord, LoadError, PipelineError,
};

fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 28, 16, 0, 0).unwrap()
}

#[test]
fn generated_universe_is_discoverable() {
    let dir = tempfile::tempdir().unwrap();
    generate_universe(dir.path(), 100, end()).unwrap();

    let symbols = available_symbols(dir.path());
    assert_eq!(symbols.len(), 12);
    assert!(symbols.contains(&"FPT".to_string()));

    let info = data_info(dir.path(), "fpt").unwrap();
    assert_eq!(info.total_days, 100);
    assert_eq!(info.end_date, end());
    assert!(info.lowest_price <= info.highest_price);
}

#[test]
fn analyze_journal_and_export() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    generate_universe(data.path(), 120, end()).unwrap();

    let advisor = build_advisor(&AdviceConfig::default()).unwrap();
    let request = AnalysisRequest {
        symbol: "VCB".into(),
        range: Some(DateRange::trailing(end(), 90)),
        horizon: Horizon::new(5).unwrap(),
    };
    let report = run_analysis(data.path(), &request, Some(advisor.as_ref()), at()).unwrap();

    assert_eq!(report.analysis.symbol(), "VCB");
    assert_eq!(report.analysis.date_range().1, end());
    assert_eq!(report.analysis.forecast().predicted_closes.len(), 5);
    assert!(report.ai_advice.as_deref().unwrap().contains("VCB"));

    let journal = Journal::new(out.path().join("reports"));
    let day = end();
    journal
        .append(day, JournalRecord::from_report(&report))
        .unwrap();
    let outcome = journal
        .append(day, JournalRecord::from_report(&report))
        .unwrap();
    assert_eq!(outcome.total_records_today, 2);

    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.path).unwrap()).unwrap();
    assert_eq!(on_disk["date"], "2024-06-28");
    assert_eq!(on_disk["records"][0]["symbol"], "VCB");

    let csv = journal_csv(&journal.records_between(day, day).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 3);

    let path = save_reports(&[report], &out.path().join("exports"), ExportFormat::Json, "x").unwrap();
    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved[0]["forecast_horizon_days"], 5);
    assert!(saved[0]["dataset_hash"].as_str().unwrap().len() == 64);
}

#[test]
fn batch_reports_serialize_together() {
    let data = tempfile::tempdir().unwrap();
    generate_universe(data.path(), 60, end()).unwrap();

    let symbols = available_symbols(data.path());
    let outcomes = BatchAnalyzer::new(data.path(), Horizon::new(3).unwrap()).run(&symbols, at());
    let (reports, failures) = partition(outcomes);
    assert_eq!(reports.len(), 12);
    assert!(failures.is_empty());

    let json: serde_json::Value = serde_json::from_str(&reports_json(&reports).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 12);
    assert!(json[0].get("ai_advice").is_none());
}

#[test]
fn unsorted_and_bad_rows() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("ABC.csv"),
        "Date,Symbol,Open,High,Low,Close,Volume\n\
         2024-01-03,ABC,11,12,10,11.5,100\n\
         2024-01-02,ABC,10,11,9,10.5,100\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("DUP.csv"),
        "Date,Symbol,Open,High,Low,Close,Volume\n\
         2024-01-02,DUP,10,11,9,10.5,100\n\
         2024-01-02,DUP,10,11,9,10.5,100\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("NEG.csv"),
        "Date,Symbol,Open,High,Low,Close,Volume\n\
         2024-01-02,NEG,10,11,9,-1,100\n",
    )
    .unwrap();

    let request = |symbol: &str| AnalysisRequest {
        symbol: symbol.into(),
        range: None,
        horizon: Horizon::default(),
    };

    let sorted = run_analysis(dir.path(), &request("ABC"), None, at()).unwrap();
    assert_eq!(sorted.analysis.latest_price(), 11.5);

    let dup = run_analysis(dir.path(), &request("DUP"), None, at()).unwrap_err();
    assert!(matches!(dup, PipelineError::Data(LoadError::Series { .. })));

    let neg = run_analysis(dir.path(), &request("NEG"), None, at()).unwrap_err();
    assert!(matches!(neg, PipelineError::Data(LoadError::BadRow { .. })));
}

#[test]
fn config_drives_the_advisor() {
    let config = AppConfig::from_toml_str(
        r#"
        horizon_days = 7
        [advice]
        mode = "disabled"
        "#,
    )
    .unwrap();
    assert_eq!(config.horizon.days(), 7);
    assert_eq!(config.advice.mode, AdviceMode::Disabled);
    assert!(build_advisor(&config.advice).is_none());
}
