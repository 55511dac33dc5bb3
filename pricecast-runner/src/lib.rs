//! PriceCast Runner: everything around the analysis engine.
//!
//! This crate builds on `pricecast-core` to provide:
//! - TOML configuration
//! - CSV loading with boundary validation
//! - Pluggable advice text (rule-based or HTTP)
//! - Daily JSON journal
//! - JSON / CSV / Markdown export
//! - Parallel batch analysis
//! - Deterministic synthetic price data

pub mod advice;
pub mod batch;
pub mod config;
pub mod export;
pub mod journal;
pub mod loader;
pub mod pipeline;
pub mod synthetic;

pub use advice::{
    advise_or_fallback, build_advisor, confidence_score, market_sentiment, AdviceError, Advisor,
    HttpAdvisor, RuleBasedAdvisor, Sentiment,
};
pub use batch::{partition, summarize, BatchAnalyzer, BatchSummary, SymbolOutcome};
pub use config::{AdviceConfig, AdviceMode, AppConfig, ConfigError, ExportFormat};
pub use journal::{AppendOutcome, DailyJournal, Journal, JournalError, JournalRecord, JournalStats};
pub use loader::{
    available_symbols, data_info, load_series, DataInfo, DateRange, LoadError, LoadedSeries,
};
pub use pipeline::{run_analysis, AdvisedReport, AnalysisRequest, PipelineError};
pub use synthetic::{generate_synthetic, generate_universe, SyntheticProfile};
