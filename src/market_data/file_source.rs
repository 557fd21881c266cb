// =============================================================================
// JSON File Series Source
// =============================================================================
//
// Reads previously exported OHLCV history from `<dir>/<SYMBOL>_<label>.json`.
// When the requested label is an alias (`1h`, `daily`, ...) and no file exists
// under it, the canonical label (`1hour`, `1day`, ...) is tried next.
//
// Record shape (providers disagree on types, so both are accepted):
//   { "timestamp": "2024-03-01 15:30:00" | 1709307000000,
//     "open": "181.20" | 181.2, "high": ..., "low": ..., "close": ...,
//     "volume": ... }
//
// Providers commonly return newest-first; records are sorted ascending.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use super::source::SeriesSource;
use super::Candle;
use crate::types::Timeframe;

/// Raw record as found on disk.
#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: serde_json::Value,
    open: serde_json::Value,
    high: serde_json::Value,
    low: serde_json::Value,
    close: serde_json::Value,
    #[serde(default)]
    volume: serde_json::Value,
}

/// Series source backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate file paths for `(symbol, timeframe)`, most specific first.
    fn candidate_paths(&self, symbol: &str, timeframe: &str) -> Vec<PathBuf> {
        let mut paths = vec![self.dir.join(format!("{symbol}_{timeframe}.json"))];
        if let Some(tf) = Timeframe::parse(timeframe) {
            if tf.canonical() != timeframe {
                paths.push(self.dir.join(format!("{symbol}_{}.json", tf.canonical())));
            }
        }
        paths
    }
}

impl SeriesSource for JsonFileSource {
    async fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<Vec<Candle>> {
        let candidates = self.candidate_paths(symbol, timeframe);
        let mut path = None;
        for candidate in &candidates {
            if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                path = Some(candidate);
                break;
            }
        }
        let path = path.with_context(|| {
            format!(
                "no series file for {symbol}@{timeframe} under {}",
                self.dir.display()
            )
        })?;

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let candles = parse_series(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        debug!(
            symbol,
            timeframe,
            path = %path.display(),
            count = candles.len(),
            "series loaded from file"
        );
        Ok(candles)
    }
}

/// Parse a JSON array of records into a chronologically sorted series.
pub fn parse_series(content: &str) -> Result<Vec<Candle>> {
    let records: Vec<RawRecord> =
        serde_json::from_str(content).context("series JSON is not an array of records")?;

    let mut candles = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Ok(Candle {
                open_time: parse_timestamp(&r.timestamp)
                    .with_context(|| format!("record {i}: bad timestamp"))?,
                open: parse_string_f64(&r.open, "open")?,
                high: parse_string_f64(&r.high, "high")?,
                low: parse_string_f64(&r.low, "low")?,
                close: parse_string_f64(&r.close, "close")?,
                volume: match &r.volume {
                    serde_json::Value::Null => 0.0,
                    v => parse_string_f64(v, "volume")?,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

/// Providers send numeric values either as JSON numbers or as strings.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

/// Accept epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
/// (the last two interpreted as UTC).
fn parse_timestamp(val: &serde_json::Value) -> Result<i64> {
    match val {
        serde_json::Value::Number(n) => n.as_i64().context("timestamp is not an integer"),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.timestamp_millis());
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(ndt.and_utc().timestamp_millis());
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("unrecognised timestamp format: {s}"))?;
            date.and_hms_opt(0, 0, 0)
                .map(|ndt| ndt.and_utc().timestamp_millis())
                .context("invalid midnight for date")
        }
        _ => anyhow::bail!("timestamp has unexpected JSON type"),
    }
}
