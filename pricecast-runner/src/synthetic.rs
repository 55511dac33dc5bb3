//! Synthetic price generator for demos and tests.
//!
//! Produces a realistic-looking daily series: a linear trend plus a slow sine
//! wave seed the path, a random walk carries it forward, and a few ±7% shocks
//! land after the first 30 days. The RNG is seeded from a BLAKE3 hash of the
//! symbol, so the same symbol always yields the same series.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pricecast_core::domain::PricePoint;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::loader::{csv_path, CsvRow};

/// Shape parameters for one generated symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticProfile {
    pub base_price: f64,
    /// Total drift added across the whole window.
    pub trend_strength: f64,
    /// Daily return spread (0.01 = 1%).
    pub volatility: f64,
}

/// Default trading-day count.
pub const DEFAULT_DAYS: usize = 150;

/// Shock multipliers applied to a handful of days.
const SHOCKS: [f64; 2] = [0.93, 1.07];

/// The demo universe and the personality of each symbol.
pub fn default_universe() -> Vec<(&'static str, SyntheticProfile)> {
    let p = |base_price, trend_strength, volatility| SyntheticProfile {
        base_price,
        trend_strength,
        volatility,
    };
    vec![
        ("FPT", p(90.0, 3.0, 0.013)),
        ("VNM", p(70.0, 2.0, 0.018)),
        ("VIC", p(52.0, 1.5, 0.022)),
        ("HPG", p(38.0, 2.5, 0.020)),
        ("MWG", p(40.0, 1.8, 0.021)),
        ("VCB", p(95.0, 3.5, 0.012)),
        ("SSI", p(32.0, 2.2, 0.024)),
        ("PNJ", p(90.0, 3.2, 0.017)),
        ("GAS", p(85.0, 1.2, 0.019)),
        ("VHM", p(50.0, 2.8, 0.015)),
        ("STB", p(32.0, 2.0, 0.023)),
        ("BVH", p(47.0, 1.5, 0.018)),
    ]
}

/// Deterministic RNG for a symbol.
fn symbol_rng(symbol: &str) -> StdRng {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    StdRng::from_seed(seed)
}

/// Generate `days` consecutive daily points ending at `end`.
pub fn generate_synthetic(
    symbol: &str,
    profile: SyntheticProfile,
    days: usize,
    end: NaiveDate,
) -> Vec<PricePoint> {
    if days == 0 {
        return Vec::new();
    }

    let mut rng = symbol_rng(symbol);
    let span = (days.max(2) - 1) as f64;

    // Seed the path with trend + wave + noise, then let the walk take over.
    let mut closes: Vec<f64> = (0..days)
        .map(|i| {
            let x = i as f64 / span;
            let trend = profile.trend_strength * x;
            let wave = 2.5 * (x * 5.0 * std::f64::consts::PI).sin();
            let noise = rng.gen_range(-1.2..1.2);
            profile.base_price + trend + wave + noise
        })
        .collect();

    let spread = profile.volatility.abs().max(1e-6);
    for i in 1..days {
        let daily_return = 0.0005 + rng.gen_range(-spread..spread);
        closes[i] = closes[i - 1] * (1.0 + daily_return);
    }

    if days > 40 {
        let count = (days / 50).min(3);
        for offset in sample(&mut rng, days - 40, count).iter() {
            let day = 30 + offset;
            closes[day] *= SHOCKS[rng.gen_range(0..SHOCKS.len())];
        }
    }

    let start = end - chrono::Duration::days(days as i64 - 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &raw_close)| {
            let close = round2(raw_close.max(1.0));
            let open = round2((close * (1.0 + rng.gen_range(-0.004..0.004))).max(1.0));
            let high = round2(open.max(close) * (1.0 + rng.gen_range(0.002..0.01)));
            let low = round2((open.min(close) * (1.0 - rng.gen_range(0.002..0.01))).max(1.0));
            PricePoint {
                date: start + chrono::Duration::days(i as i64),
                open,
                high: high.max(open).max(close),
                low: low.min(open).min(close),
                close,
                volume: rng.gen_range(1_000_000..6_000_000u64),
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Write points as a `Date,Symbol,Open,High,Low,Close,Volume` CSV.
pub fn write_price_csv(path: &Path, symbol: &str, points: &[PricePoint]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for point in points {
        writer.serialize(CsvRow::from_point(symbol, point))?;
    }
    writer.flush()?;
    Ok(())
}

/// Generate and write the whole demo universe into `data_dir`.
pub fn generate_universe(data_dir: &Path, days: usize, end: NaiveDate) -> Result<Vec<PathBuf>> {
    default_universe()
        .into_iter()
        .map(|(symbol, profile)| {
            let points = generate_synthetic(symbol, profile, days, end);
            let path = csv_path(data_dir, symbol);
            write_price_csv(&path, symbol, &points)?;
            info!(symbol, rows = points.len(), path = %path.display(), "wrote synthetic prices");
            Ok(path)
        })
        .collect()
}
