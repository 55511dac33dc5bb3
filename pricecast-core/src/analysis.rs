//! AnalysisResult assembly: the one record handed to collaborators.
//!
//! `analyze` runs the full pipeline:
//! series → indicators → {trend, forecast} → signal → AnalysisResult.
//! The result is immutable once built; collaborators read it through getters
//! or its JSON form.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::domain::Series;
use crate::forecast::{self, ForecastBound, ForecastMethod, ForecastResult, Horizon};
use crate::indicators::{IndicatorEngine, IndicatorSnapshot, SMA_SLOW_PERIOD};
use crate::signal::{self, Signal};
use crate::trend::{self, Crossover, Trend, TrendStrength};

/// Annotation appended to the reason when the fallback forecaster ran.
pub const FALLBACK_NOTE: &str = "Forecast unavailable, showing trend-based estimate.";

/// Structured outcome of one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    symbol: String,
    date_range: (NaiveDate, NaiveDate),
    latest_price: f64,
    indicators: IndicatorSnapshot,
    trend: Trend,
    crossover: Option<Crossover>,
    trend_strength: TrendStrength,
    forecast: ForecastResult,
    signal: Signal,
    reason: String,
    generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        self.date_range
    }

    pub fn latest_price(&self) -> f64 {
        self.latest_price
    }

    pub fn indicators(&self) -> &IndicatorSnapshot {
        &self.indicators
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn crossover(&self) -> Option<Crossover> {
        self.crossover
    }

    pub fn trend_strength(&self) -> TrendStrength {
        self.trend_strength
    }

    pub fn forecast(&self) -> &ForecastResult {
        &self.forecast
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

/// Wire shape of an [`AnalysisResult`].
#[derive(Serialize)]
struct AnalysisRecord<'a> {
    symbol: &'a str,
    date_range: [NaiveDate; 2],
    latest_price: f64,
    technical_indicators: &'a IndicatorSnapshot,
    trend: Trend,
    forecast_horizon_days: usize,
    forecast_next_days: &'a [f64],
    signal: Signal,
    reason: &'a str,
    generated_at: DateTime<Utc>,
    forecast_bounds: &'a [ForecastBound],
    forecast_method: ForecastMethod,
    crossover: Option<Crossover>,
    trend_strength: TrendStrength,
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AnalysisRecord {
            symbol: &self.symbol,
            date_range: [self.date_range.0, self.date_range.1],
            latest_price: self.latest_price,
            technical_indicators: &self.indicators,
            trend: self.trend,
            forecast_horizon_days: self.forecast.horizon_days,
            forecast_next_days: &self.forecast.predicted_closes,
            signal: self.signal,
            reason: &self.reason,
            generated_at: self.generated_at,
            forecast_bounds: &self.forecast.bounds,
            forecast_method: self.forecast.method,
            crossover: self.crossover,
            trend_strength: self.trend_strength,
        }
        .serialize(serializer)
    }
}

/// Analyze `series` and stamp the result with the current time.
pub fn analyze(symbol: &str, series: &Series, horizon: Horizon) -> AnalysisResult {
    analyze_at(symbol, series, horizon, Utc::now())
}

/// Analyze `series` with an explicit generation timestamp.
pub fn analyze_at(
    symbol: &str,
    series: &Series,
    horizon: Horizon,
    generated_at: DateTime<Utc>,
) -> AnalysisResult {
    let engine = IndicatorEngine::standard();
    let indicator_series = engine.compute(series);
    let snapshot = indicator_series.latest();
    let latest_price = series.last_close();

    let reading = trend::classify(latest_price, &snapshot);
    let crossover = trend::latest_crossover(&indicator_series);
    let forecast = forecast::forecast(series, &indicator_series, horizon);
    let decision = signal::evaluate(reading.trend, snapshot.rsi14);

    debug!(
        symbol,
        points = series.len(),
        trend = %reading.trend,
        signal = %decision.signal,
        method = ?forecast.method,
        "analysis assembled"
    );

    let mut reason = String::new();
    if reading.insufficient_data {
        reason.push_str(&format!(
            "Insufficient data for SMA7/SMA30 ({} of {} points), trend defaults to Sideways. ",
            series.len(),
            SMA_SLOW_PERIOD
        ));
    }
    reason.push_str(&decision.reason);
    if let Some(cross) = crossover {
        let direction = match cross {
            Crossover::GoldenCross => "above",
            Crossover::DeathCross => "below",
        };
        reason.push_str(&format!(
            " A {cross} occurred on the latest session (SMA7 crossed {direction} SMA30)."
        ));
    }
    if forecast.used_fallback() {
        reason.push(' ');
        reason.push_str(FALLBACK_NOTE);
    }

    AnalysisResult {
        symbol: symbol.to_string(),
        date_range: series.date_range(),
        latest_price,
        indicators: snapshot,
        trend: reading.trend,
        crossover,
        trend_strength: trend::trend_strength(&series.closes()),
        forecast,
        signal: decision.signal,
        reason,
        generated_at,
    }
}
