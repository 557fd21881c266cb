// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Split into gains (positive deltas) and losses (|negative deltas|).
// Step 3 — Wilder-smooth both: seed with the SMA of the first `period` values,
//          then avg = (prev_avg * (period - 1) + current) / period.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// A zero average loss makes RS infinite; RSI saturates at 100 in that case.
// =============================================================================

use super::math::wilder_smooth;

/// Compute the full RSI series for the given `closes` and `period`.
///
/// The returned vector has one RSI value for each close starting at index
/// `period` (the first `period` deltas seed the averages), so its length is
/// `closes.len() - period`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `closes.len() < period + 1` => empty vec
/// - average loss of exactly zero => 100.0, including a perfectly flat market
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                (delta, 0.0)
            } else {
                (0.0, delta.abs())
            }
        })
        .unzip();

    let avg_gains = wilder_smooth(&gains, period);
    let avg_losses = wilder_smooth(&losses, period);

    avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(&g, &l)| rsi_from_averages(g, l))
        .take_while(|rsi| rsi.is_finite())
        .collect()
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
