//! Single-symbol pipeline: load → analyze → advise.
//!
//! This is the high-level entry point used by the CLI and by batch mode.

use chrono::{DateTime, Utc};
use pricecast_core::analysis::{analyze_at, AnalysisResult};
use pricecast_core::forecast::{holdout_accuracy, Horizon};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::advice::{advise_or_fallback, Advisor};
use crate::loader::{load_series, DateRange, LoadError};

/// Errors from the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// What to analyze.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub range: Option<DateRange>,
    pub horizon: Horizon,
}

/// An analysis plus collaborator extras, serialized flat.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisedReport {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    /// Advice text; `None` when advice is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_advice: Option<String>,
    /// Hold-out accuracy of the forecaster on this series, when long enough.
    pub forecast_accuracy: Option<f64>,
    pub dataset_hash: String,
}

/// Load one symbol from `data_dir`, analyze it and attach advice.
pub fn run_analysis(
    data_dir: &std::path::Path,
    request: &AnalysisRequest,
    advisor: Option<&dyn Advisor>,
    generated_at: DateTime<Utc>,
) -> Result<AdvisedReport, PipelineError> {
    let loaded = load_series(data_dir, &request.symbol, request.range)?;
    let analysis = analyze_at(&loaded.symbol, &loaded.series, request.horizon, generated_at);
    let forecast_accuracy = holdout_accuracy(&loaded.series, request.horizon);
    let ai_advice = advisor.map(|a| advise_or_fallback(a, &analysis));

    info!(
        symbol = %loaded.symbol,
        points = loaded.series.len(),
        trend = %analysis.trend(),
        signal = %analysis.signal(),
        "analysis complete"
    );

    Ok(AdvisedReport {
        analysis,
        ai_advice,
        forecast_accuracy,
        dataset_hash: loaded.dataset_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::RuleBasedAdvisor;
    use crate::synthetic::{generate_synthetic, write_price_csv, SyntheticProfile};
    use chrono::{NaiveDate, TimeZone};

    fn write_symbol(dir: &std::path::Path, symbol: &str, days: usize) {
        let profile = SyntheticProfile {
            base_price: 60.0,
            trend_strength: 2.0,
            volatility: 0.015,
        };
        let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let points = generate_synthetic(symbol, profile, days, end);
        write_price_csv(&crate::loader::csv_path(dir, symbol), symbol, &points).unwrap();
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn report_flattens_analysis_and_advice() {
        let dir = tempfile::tempdir().unwrap();
        write_symbol(dir.path(), "FPT", 90);

        let request = AnalysisRequest {
            symbol: "fpt".into(),
            range: None,
            horizon: Horizon::new(3).unwrap(),
        };
        let advisor = RuleBasedAdvisor::new();
        let report = run_analysis(dir.path(), &request, Some(&advisor), now()).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["symbol"], "FPT");
        assert_eq!(json["forecast_horizon_days"], 3);
        assert_eq!(json["forecast_next_days"].as_array().unwrap().len(), 3);
        assert!(json["ai_advice"].as_str().unwrap().contains("FPT"));
        assert!(json["forecast_accuracy"].is_number());
        assert!(json["technical_indicators"]["SMA30"].is_number());
    }

    #[test]
    fn disabled_advice_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        write_symbol(dir.path(), "VNM", 12);

        let request = AnalysisRequest {
            symbol: "VNM".into(),
            range: None,
            horizon: Horizon::default(),
        };
        let report = run_analysis(dir.path(), &request, None, now()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("ai_advice").is_none());
        assert!(json["forecast_accuracy"].is_null());
    }

    #[test]
    fn unknown_symbol_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = AnalysisRequest {
            symbol: "MWG".into(),
            range: None,
            horizon: Horizon::default(),
        };
        let err = run_analysis(dir.path(), &request, None, now()).unwrap_err();
        assert!(matches!(err, PipelineError::Data(LoadError::NotFound { .. })));
    }
}
