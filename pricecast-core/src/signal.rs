//! Signal engine: combines trend and momentum into BUY / SELL / HOLD.
//!
//! Every decision carries a reason sentence naming the trend, the RSI14 value
//! and the threshold involved. Downstream advice text quotes it verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::trend::Trend;

/// RSI at or above this level is overbought.
pub const OVERBOUGHT: f64 = 70.0;
/// RSI at or below this level is oversold.
pub const OVERSOLD: f64 = 30.0;

/// Trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub signal: Signal,
    pub reason: String,
}

/// Momentum zone of an RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

pub fn rsi_zone(rsi: f64) -> RsiZone {
    if rsi <= OVERSOLD {
        RsiZone::Oversold
    } else if rsi >= OVERBOUGHT {
        RsiZone::Overbought
    } else {
        RsiZone::Neutral
    }
}

/// Decide the signal for a trend and an optional RSI14 reading.
///
/// - BUY: Uptrend and RSI14 < 70
/// - SELL: Downtrend and RSI14 > 30
/// - HOLD: everything else
pub fn evaluate(trend: Trend, rsi14: Option<f64>) -> SignalDecision {
    let Some(rsi) = rsi14.filter(|v| v.is_finite()) else {
        return SignalDecision {
            signal: Signal::Hold,
            reason: format!(
                "{trend} but RSI14 is unavailable (insufficient data), so momentum cannot confirm a trade."
            ),
        };
    };

    match trend {
        Trend::Uptrend if rsi < OVERBOUGHT => SignalDecision {
            signal: Signal::Buy,
            reason: format!(
                "Uptrend (close > SMA7 > SMA30) with RSI14 at {rsi:.2}, below the overbought threshold of {OVERBOUGHT:.0}."
            ),
        },
        Trend::Uptrend => SignalDecision {
            signal: Signal::Hold,
            reason: format!(
                "Uptrend but RSI14 at {rsi:.2} is overbought (at or above {OVERBOUGHT:.0}); waiting for momentum to cool before buying."
            ),
        },
        Trend::Downtrend if rsi > OVERSOLD => SignalDecision {
            signal: Signal::Sell,
            reason: format!(
                "Downtrend (close < SMA7 < SMA30) with RSI14 at {rsi:.2}, above the oversold threshold of {OVERSOLD:.0}."
            ),
        },
        Trend::Downtrend => SignalDecision {
            signal: Signal::Hold,
            reason: format!(
                "Downtrend but RSI14 at {rsi:.2} is oversold (at or below {OVERSOLD:.0}); a rebound is possible, so not selling."
            ),
        },
        Trend::Sideways => SignalDecision {
            signal: Signal::Hold,
            reason: format!(
                "Sideways market (no strict close/SMA7/SMA30 ordering) with RSI14 at {rsi:.2}; waiting for a clear trend."
            ),
        },
    }
}
