// =============================================================================
// MACD (Moving Average Convergence Divergence)
// =============================================================================
//
//   MACD line   = EMA(fast) - EMA(slow)
//   Signal line = EMA(signal) of the MACD line
//   Histogram   = MACD line - Signal line
//
// Defaults: 12 / 26 / 9. All three output series are aligned on the signal
// line, i.e. element 0 corresponds to close index `slow + signal - 2`.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

/// Aligned MACD output series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute MACD for `closes`.
///
/// Returns an empty series when `fast >= slow`, any period is zero, or there
/// are fewer than `slow + signal - 1` closes.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    if fast == 0 || signal == 0 || fast >= slow {
        return MacdSeries::default();
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if slow_ema.is_empty() {
        return MacdSeries::default();
    }

    // Fast EMA starts `slow - fast` closes earlier; drop the head to align.
    let offset = slow - fast;
    let macd_line: Vec<f64> = fast_ema
        .iter()
        .skip(offset)
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = calculate_ema(&macd_line, signal);
    if signal_line.is_empty() {
        return MacdSeries::default();
    }

    let macd: Vec<f64> = macd_line[signal - 1..signal - 1 + signal_line.len()].to_vec();
    let histogram = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}
