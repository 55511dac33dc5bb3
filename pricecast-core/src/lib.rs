//! PriceCast Core: indicators, trend, forecast and signal for daily price series.
//!
//! This crate is the pure analysis engine:
//! - Domain types (price points, validated series)
//! - Rolling indicators (SMA7, SMA30, RSI14)
//! - Trend classification, crossover detection and trend strength
//! - Regression forecast with a trend-extrapolation fallback
//! - BUY / SELL / HOLD signal rules
//! - `AnalysisResult` assembly
//!
//! Nothing here touches the filesystem, the network or the clock except
//! `analysis::analyze`, which stamps the result with the current time.

pub mod analysis;
pub mod domain;
pub mod forecast;
pub mod indicators;
pub mod signal;
pub mod trend;

pub use analysis::{analyze, analyze_at, AnalysisResult};
pub use domain::{PricePoint, Series, SeriesError};
pub use forecast::{ForecastMethod, ForecastResult, Horizon, HorizonError};
pub use indicators::{IndicatorEngine, IndicatorSeries, IndicatorSnapshot};
pub use signal::{Signal, SignalDecision};
pub use trend::{Crossover, Trend, TrendStrength};
