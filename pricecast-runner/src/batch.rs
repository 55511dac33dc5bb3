//! Batch analysis over many symbols.
//!
//! Each symbol runs the full single-symbol pipeline independently. Failures
//! are kept per symbol so one bad file never aborts the batch.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use pricecast_core::forecast::Horizon;
use pricecast_core::signal::Signal;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::advice::Advisor;
use crate::loader::DateRange;
use crate::pipeline::{run_analysis, AdvisedReport, AnalysisRequest, PipelineError};

/// Outcome for one symbol.
#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub result: Result<AdvisedReport, PipelineError>,
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub signals: BTreeMap<Signal, usize>,
}

/// Runs the pipeline for a list of symbols.
pub struct BatchAnalyzer<'a> {
    data_dir: &'a Path,
    advisor: Option<&'a dyn Advisor>,
    horizon: Horizon,
    range: Option<DateRange>,
    parallel: bool,
}

impl<'a> BatchAnalyzer<'a> {
    pub fn new(data_dir: &'a Path, horizon: Horizon) -> Self {
        Self {
            data_dir,
            advisor: None,
            horizon,
            range: None,
            parallel: true,
        }
    }

    pub fn with_advisor(mut self, advisor: Option<&'a dyn Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.range = range;
        self
    }

    /// Enable or disable rayon parallelism.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn run_one(&self, symbol: &str, generated_at: DateTime<Utc>) -> SymbolOutcome {
        let request = AnalysisRequest {
            symbol: symbol.to_string(),
            range: self.range,
            horizon: self.horizon,
        };
        let result = run_analysis(self.data_dir, &request, self.advisor, generated_at);
        if let Err(e) = &result {
            warn!(symbol, error = %e, "symbol skipped");
        }
        SymbolOutcome {
            symbol: symbol.to_string(),
            result,
        }
    }

    /// Analyze every symbol. Outcomes keep the input order.
    pub fn run(&self, symbols: &[String], generated_at: DateTime<Utc>) -> Vec<SymbolOutcome> {
        let outcomes: Vec<SymbolOutcome> = if self.parallel {
            symbols
                .par_iter()
                .map(|symbol| self.run_one(symbol, generated_at))
                .collect()
        } else {
            symbols
                .iter()
                .map(|symbol| self.run_one(symbol, generated_at))
                .collect()
        };

        let summary = summarize(&outcomes);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch complete"
        );
        outcomes
    }
}

/// Tally successes, failures and signals.
pub fn summarize(outcomes: &[SymbolOutcome]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                summary.succeeded += 1;
                *summary.signals.entry(report.analysis.signal()).or_default() += 1;
            }
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

/// Split outcomes into reports and `(symbol, error)` pairs.
pub fn partition(outcomes: Vec<SymbolOutcome>) -> (Vec<AdvisedReport>, Vec<(String, PipelineError)>) {
    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(report) => reports.push(report),
            Err(e) => failures.push((outcome.symbol, e)),
        }
    }
    (reports, failures)
}
