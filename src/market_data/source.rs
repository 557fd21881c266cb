// =============================================================================
// Series Source — the boundary to whatever supplies raw OHLCV history
// =============================================================================
//
// The analysis core only needs one capability: given a symbol and a timeframe
// label, return a chronologically ordered OHLCV series. Any failure is treated
// by the caller as "timeframe unavailable".

use anyhow::{ensure, Result};

use super::Candle;

/// Provider of raw OHLCV series.
#[allow(async_fn_in_trait)]
pub trait SeriesSource {
    /// Fetch the series for `(symbol, timeframe)`, oldest bar first.
    async fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<Vec<Candle>>;
}

impl<S: SeriesSource + ?Sized> SeriesSource for &S {
    async fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<Vec<Candle>> {
        (**self).fetch_series(symbol, timeframe).await
    }
}

impl<S: SeriesSource + ?Sized> SeriesSource for std::sync::Arc<S> {
    async fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<Vec<Candle>> {
        (**self).fetch_series(symbol, timeframe).await
    }
}

/// Check that a series is usable by the indicator layer: timestamps strictly
/// increasing, prices finite and positive, volume finite and non-negative.
pub fn validate_series(candles: &[Candle]) -> Result<()> {
    for (i, c) in candles.iter().enumerate() {
        ensure!(
            [c.open, c.high, c.low, c.close]
                .iter()
                .all(|p| p.is_finite() && *p > 0.0),
            "bar {i} has a non-positive or non-finite price"
        );
        ensure!(
            c.volume.is_finite() && c.volume >= 0.0,
            "bar {i} has an invalid volume {}",
            c.volume
        );
    }
    for (i, w) in candles.windows(2).enumerate() {
        ensure!(
            w[1].open_time > w[0].open_time,
            "bar {} is not after bar {i} ({} <= {})",
            i + 1,
            w[1].open_time,
            w[0].open_time
        );
    }
    Ok(())
}
