use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::source::SeriesSource;
use crate::types::Timeframe;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, epoch milliseconds.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Composite key that identifies a unique candle series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CandleKey {
    pub symbol: String,
    pub interval: String,
}

impl CandleKey {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
        }
    }
}

impl std::fmt::Display for CandleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

// ---------------------------------------------------------------------------
// CandleBuffer -- thread-safe ring buffer per (symbol, interval)
// ---------------------------------------------------------------------------

/// Thread-safe ring-buffer that stores the most recent candles per
/// `(symbol, interval)` pair, oldest first.
///
/// A candle with the same `open_time` as the newest stored bar replaces it
/// (in-progress update); an older candle is rejected so the series stays
/// strictly increasing.
pub struct CandleBuffer {
    buffers: RwLock<HashMap<CandleKey, VecDeque<Candle>>>,
    max_candles: usize,
}

impl CandleBuffer {
    /// Create a new buffer that retains at most `max_candles` candles per key.
    pub fn new(max_candles: usize) -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            max_candles,
        }
    }

    /// Insert or replace the latest candle for the given key.
    ///
    /// Returns `false` when the candle is older than the newest stored bar.
    pub fn update(&self, key: CandleKey, candle: Candle) -> bool {
        let mut map = self.buffers.write();
        let ring = map
            .entry(key)
            .or_insert_with(|| VecDeque::with_capacity(self.max_candles + 1));
        Self::push_ordered(ring, candle, self.max_candles)
    }

    /// Bulk-load a chronologically ordered series for `key`.
    pub fn extend(&self, key: CandleKey, candles: impl IntoIterator<Item = Candle>) {
        let mut map = self.buffers.write();
        let ring = map
            .entry(key.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.max_candles + 1));

        let mut rejected = 0usize;
        for candle in candles {
            if !Self::push_ordered(ring, candle, self.max_candles) {
                rejected += 1;
            }
        }
        if rejected > 0 {
            warn!(key = %key, rejected, "out-of-order candles dropped");
        }
    }

    fn push_ordered(ring: &mut VecDeque<Candle>, candle: Candle, max_candles: usize) -> bool {
        if let Some(last) = ring.back() {
            if candle.open_time < last.open_time {
                return false;
            }
            if candle.open_time == last.open_time {
                ring.pop_back();
            }
        }
        ring.push_back(candle);
        while ring.len() > max_candles {
            ring.pop_front();
        }
        true
    }

    /// Look up a series by the label as given, then by its canonical label.
    fn lookup(&self, symbol: &str, timeframe: &str) -> Option<Vec<Candle>> {
        let map = self.buffers.read();
        let exact = CandleKey::new(symbol, timeframe);
        if let Some(ring) = map.get(&exact) {
            return Some(ring.iter().copied().collect());
        }
        let canonical = Timeframe::parse(timeframe)?.canonical();
        map.get(&CandleKey::new(symbol, canonical))
            .map(|ring| ring.iter().copied().collect())
    }
}

impl SeriesSource for CandleBuffer {
    async fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<Vec<Candle>> {
        match self.lookup(symbol, timeframe) {
            Some(candles) if !candles.is_empty() => {
                debug!(symbol, timeframe, count = candles.len(), "series served from buffer");
                Ok(candles)
            }
            _ => anyhow::bail!("no candles buffered for {symbol}@{timeframe}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
