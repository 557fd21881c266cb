// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// Default period: 14
// =============================================================================

use super::math::{true_ranges, wilder_smooth};
use crate::market_data::Candle;

/// Compute the full ATR series from a slice of OHLCV candles (oldest first).
///
/// Element `k` of the output is aligned with candle `period + k`, so the
/// output has `candles.len() - period` elements. Empty when `period` is zero
/// or there are fewer than `period + 1` candles.
pub fn calculate_atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return Vec::new();
    }
    wilder_smooth(&true_ranges(candles), period)
}

/// Compute the most recent ATR value.
///
/// Returns `None` when there is not enough data or the value is non-finite.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    calculate_atr_series(candles, period)
        .last()
        .copied()
        .filter(|atr| atr.is_finite())
}
