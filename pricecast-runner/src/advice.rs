//! Advice generation: a plain-language commentary on an analysis.
//!
//! The [`Advisor`] trait is the seam. [`RuleBasedAdvisor`] builds text from
//! deterministic templates; [`HttpAdvisor`] posts the analysis JSON to a
//! configured endpoint. [`build_advisor`] picks one from [`AdviceConfig`].
//! The engine never knows which implementation is active.

use std::time::Duration;

use pricecast_core::analysis::AnalysisResult;
use pricecast_core::signal::{Signal, OVERBOUGHT, OVERSOLD};
use pricecast_core::trend::Trend;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::{AdviceConfig, AdviceMode};

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("advice endpoint is not configured")]
    MissingEndpoint,
    #[error("environment variable {0} is not set")]
    MissingApiKey(String),
    #[error("advice request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("advice service responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("advice service returned an empty answer")]
    EmptyAnswer,
}

/// Produces advice text for an analysis.
pub trait Advisor: Send + Sync {
    fn name(&self) -> &str;

    fn advise(&self, result: &AnalysisResult) -> Result<String, AdviceError>;
}

/// Template-based advice; same input, same text.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAdvisor;

impl RuleBasedAdvisor {
    pub fn new() -> Self {
        Self
    }

    fn opening(result: &AnalysisResult) -> String {
        let symbol = result.symbol();
        let signal = result.signal();
        match signal {
            Signal::Buy => format!("{symbol} ({signal}) shows short-term upside potential."),
            Signal::Sell => format!("Caution on {symbol} ({signal}): a short-term pullback looks likely."),
            Signal::Hold => format!("No clear edge on {symbol} ({signal}) right now; holding is reasonable."),
        }
    }

    fn supporting_factors(result: &AnalysisResult) -> Option<String> {
        let ind = result.indicators();
        let rsi = ind.rsi14;
        let fast_over_slow = match (ind.sma7, ind.sma30) {
            (Some(fast), Some(slow)) => Some(fast > slow),
            _ => None,
        };

        let mut factors: Vec<&str> = Vec::new();
        match result.signal() {
            Signal::Buy => {
                if result.trend() == Trend::Uptrend {
                    factors.push("clear uptrend");
                }
                match rsi {
                    Some(r) if r < 50.0 => factors.push("RSI far from overbought"),
                    Some(r) if r < OVERBOUGHT => factors.push("RSI in a healthy range"),
                    _ => {}
                }
                if fast_over_slow == Some(true) {
                    factors.push("SMA7 above SMA30");
                }
            }
            Signal::Sell => {
                if result.trend() == Trend::Downtrend {
                    factors.push("downtrend in place");
                }
                match rsi {
                    Some(r) if r > OVERBOUGHT => factors.push("RSI overbought"),
                    Some(r) if r > 50.0 => factors.push("RSI elevated"),
                    _ => {}
                }
                if fast_over_slow == Some(false) {
                    factors.push("SMA7 below SMA30");
                }
            }
            Signal::Hold => {
                let note = if result.trend() == Trend::Sideways {
                    "the market is moving sideways, wait for a breakout"
                } else if rsi.is_some_and(|r| r >= OVERBOUGHT) {
                    "RSI is overbought, wait for a pullback"
                } else if rsi.is_some_and(|r| r <= OVERSOLD) {
                    "RSI is oversold, a rebound is possible"
                } else {
                    "indicators are not giving a clear signal"
                };
                factors.push(note);
            }
        }

        if factors.is_empty() {
            None
        } else {
            Some(factors.join(", "))
        }
    }

    fn risk_note(result: &AnalysisResult) -> &'static str {
        match (result.signal(), result.trend()) {
            (Signal::Buy, Trend::Uptrend) => {
                "Investing carries risk; size positions sensibly and set a stop-loss."
            }
            (Signal::Sell, _) => {
                "Investing carries risk; a reversal could leave gains on the table."
            }
            _ => "Investing carries risk; be patient until a clearer signal appears.",
        }
    }
}

impl Advisor for RuleBasedAdvisor {
    fn name(&self) -> &str {
        "rule_based"
    }

    fn advise(&self, result: &AnalysisResult) -> Result<String, AdviceError> {
        let mut text = Self::opening(result);
        if let Some(factors) = Self::supporting_factors(result) {
            text.push_str(" Key factors: ");
            text.push_str(&factors);
            text.push('.');
        }
        text.push(' ');
        text.push_str(Self::risk_note(result));
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct AdviceResponse {
    advice: String,
}

/// Posts the analysis JSON to an external service and returns its `advice` field.
pub struct HttpAdvisor {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl HttpAdvisor {
    pub fn new(config: &AdviceConfig) -> Result<Self, AdviceError> {
        let endpoint = config.endpoint.clone().ok_or(AdviceError::MissingEndpoint)?;
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| AdviceError::MissingApiKey(config.api_key_env.clone()))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl Advisor for HttpAdvisor {
    fn name(&self) -> &str {
        "http"
    }

    fn advise(&self, result: &AnalysisResult) -> Result<String, AdviceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(result)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_else(|_| "unknown".into());
            return Err(AdviceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let answer: AdviceResponse = response.json()?;
        let advice = answer.advice.trim().to_string();
        if advice.is_empty() {
            return Err(AdviceError::EmptyAnswer);
        }
        Ok(advice)
    }
}

/// Pick the advisor named by the config; `None` when advice is disabled.
///
/// An HTTP advisor that cannot be built (no endpoint, no key) degrades to
/// the rule-based one with a warning.
pub fn build_advisor(config: &AdviceConfig) -> Option<Box<dyn Advisor>> {
    match config.mode {
        AdviceMode::Disabled => None,
        AdviceMode::RuleBased => Some(Box::new(RuleBasedAdvisor::new())),
        AdviceMode::Http => match HttpAdvisor::new(config) {
            Ok(advisor) => Some(Box::new(advisor)),
            Err(e) => {
                warn!(error = %e, "HTTP advisor unavailable, using rule-based advice");
                Some(Box::new(RuleBasedAdvisor::new()))
            }
        },
    }
}

/// Run `advisor`, falling back to rule-based text when it fails.
pub fn advise_or_fallback(advisor: &dyn Advisor, result: &AnalysisResult) -> String {
    match advisor.advise(result) {
        Ok(text) => text,
        Err(e) => {
            warn!(advisor = advisor.name(), symbol = result.symbol(), error = %e, "advice failed, using rule-based text");
            // Rule-based advice is infallible.
            RuleBasedAdvisor::new().advise(result).unwrap_or_default()
        }
    }
}

/// Overall market mood implied by an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// Tally bullish and bearish evidence from signal, trend and RSI.
pub fn market_sentiment(result: &AnalysisResult) -> Sentiment {
    let rsi = result.indicators().rsi14.unwrap_or(50.0);
    let (signal, trend) = (result.signal(), result.trend());
    let mut bullish = 0;
    let mut bearish = 0;

    match signal {
        Signal::Buy => bullish += 2,
        Signal::Sell => bearish += 2,
        Signal::Hold if trend == Trend::Uptrend => bullish += 1,
        Signal::Hold if trend == Trend::Downtrend => bearish += 1,
        Signal::Hold => {}
    }
    match trend {
        Trend::Uptrend => bullish += 1,
        Trend::Downtrend => bearish += 1,
        Trend::Sideways => {}
    }
    if rsi < OVERBOUGHT {
        bullish += 1;
    } else if rsi > OVERBOUGHT {
        bearish += 1;
    }

    match bullish.cmp(&bearish) {
        std::cmp::Ordering::Greater => Sentiment::Bullish,
        std::cmp::Ordering::Less => Sentiment::Bearish,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Agreement score in [0, 1] between the indicators and the signal.
pub fn confidence_score(result: &AnalysisResult) -> f64 {
    let ind = result.indicators();
    let trend = result.trend();
    let mut score: f64 = 0.5;

    if ind.rsi14.is_some_and(|r| (OVERSOLD..=OVERBOUGHT).contains(&r)) {
        score += 0.1;
    }
    if let (Some(fast), Some(slow)) = (ind.sma7, ind.sma30) {
        let aligned = (fast > slow && trend == Trend::Uptrend)
            || (fast < slow && trend == Trend::Downtrend);
        if aligned {
            score += 0.2;
        }
    }
    if result.signal() != Signal::Hold {
        score += 0.1;
    }
    if trend != Trend::Sideways {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}
