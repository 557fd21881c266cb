// =============================================================================
// Series Math Primitives
// =============================================================================
//
// Small helpers shared by every indicator:
//   slope              — first difference at a lag
//   normalize_with_atr — volatility-relative magnitude
//   clamp              — saturation
//   wilder_smooth      — Wilder's recursive average
//
// Wilder's smoothing:
//   r_0 = SMA of the first `period` values
//   r_i = (r_{i-1} * (period - 1) + x_i) / period
//
// This is NOT a generic EMA (alpha = 1/period rather than 2/(period+1)); RSI,
// ATR and ADX all depend on the exact recursion.
// =============================================================================

/// `series[index] - series[index - lag]`, or 0.0 when there is no earlier
/// value to compare against (or `index` is out of bounds).
pub fn slope(series: &[f64], index: usize, lag: usize) -> f64 {
    if index < lag || index >= series.len() {
        return 0.0;
    }
    series[index] - series[index - lag]
}

/// Slope of the most recent value against its predecessor.
pub fn last_slope(series: &[f64]) -> f64 {
    match series.len() {
        0 => 0.0,
        n => slope(series, n - 1, 1),
    }
}

/// Express `value` in ATR units. Degrades to 0.0 when ATR is zero.
pub fn normalize_with_atr(value: f64, atr: f64) -> f64 {
    if atr != 0.0 {
        value / atr
    } else {
        0.0
    }
}

/// Saturate `x` into `[lo, hi]`. NaN maps to `lo`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        return lo;
    }
    x.max(lo).min(hi)
}

/// Wilder's smoothing of `series` over `period`.
///
/// The output has `series.len() - period + 1` elements; element 0 is aligned
/// with `series[period - 1]`. Returns an empty `Vec` when `period == 0` or the
/// series is shorter than `period`.
pub fn wilder_smooth(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    let period_f = period as f64;
    let seed = series[..period].iter().sum::<f64>() / period_f;

    let mut result = Vec::with_capacity(series.len() - period + 1);
    result.push(seed);

    series[period..].iter().fold(seed, |prev, &x| {
        let next = (prev * (period_f - 1.0) + x) / period_f;
        result.push(next);
        next
    });

    result
}

/// True range of each bar against the previous close, starting at bar 1.
///
/// `TR_i = max(H_i - L_i, |H_i - C_{i-1}|, |L_i - C_{i-1}|)`
pub fn true_ranges(candles: &[crate::market_data::Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_before_lag_is_zero() {
        let s = [1.0, 3.0, 6.0];
        assert_eq!(slope(&s, 0, 1), 0.0);
        assert_eq!(slope(&s, 1, 2), 0.0);
        assert!((slope(&s, 2, 1) - 3.0).abs() < 1e-10);
        assert!((slope(&s, 2, 2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn slope_out_of_bounds_is_zero() {
        assert_eq!(slope(&[1.0, 2.0], 5, 1), 0.0);
        assert_eq!(last_slope(&[]), 0.0);
        assert_eq!(last_slope(&[4.0]), 0.0);
    }

    #[test]
    fn normalize_zero_atr() {
        assert_eq!(normalize_with_atr(5.0, 0.0), 0.0);
        assert!((normalize_with_atr(5.0, 2.0) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn clamp_saturates() {
        assert_eq!(clamp(3.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-3.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25, -1.0, 1.0), 0.25);
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn wilder_smooth_known_values() {
        // seed = (1+2+3)/3 = 2; next = (2*2 + 4)/3 = 8/3; next = (8/3*2 + 5)/3
        let out = wilder_smooth(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out.len(), 3);
        assert!((out[0] - 2.0).abs() < 1e-10);
        assert!((out[1] - 8.0 / 3.0).abs() < 1e-10);
        assert!((out[2] - (16.0 / 3.0 + 5.0) / 3.0).abs() < 1e-10);
    }

    #[test]
    fn wilder_smooth_insufficient() {
        assert!(wilder_smooth(&[1.0, 2.0], 3).is_empty());
        assert!(wilder_smooth(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn wilder_smooth_constant_is_constant() {
        let out = wilder_smooth(&[7.0; 30], 14);
        assert!(out.iter().all(|v| (v - 7.0).abs() < 1e-10));
    }
}
