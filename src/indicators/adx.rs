// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.
//
// Calculation pipeline:
//   1. Compute +DM (positive directional movement) and -DM per bar.
//   2. Compute True Range (TR) per bar.
//   3. Apply Wilder's smoothing (period) to +DM, -DM, and TR.
//   4. Derive +DI = smoothed(+DM) / smoothed(TR) * 100
//            -DI = smoothed(-DM) / smoothed(TR) * 100
//   5. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   6. ADX = Wilder's smoothed average of DX over `period` bars.
//
// Interpretation:
//   ADX > 25  => trending market
//   ADX < 20  => ranging / choppy market
// =============================================================================

use super::math::{true_ranges, wilder_smooth};
use crate::market_data::Candle;

/// Compute the full ADX series from a slice of OHLCV candles.
///
/// Needs at least `2 * period` candles: `period` transitions to seed the
/// smoothed +DM / -DM / TR, then `period` DX values to seed the ADX.
/// Returns an empty `Vec` otherwise (or when `period == 0`).
pub fn calculate_adx_series(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < 2 * period {
        return Vec::new();
    }

    // ------------------------------------------------------------------
    // Step 1 & 2: Raw +DM, -DM for each consecutive pair, plus TR
    // ------------------------------------------------------------------
    let (plus_dm, minus_dm): (Vec<f64>, Vec<f64>) = candles
        .windows(2)
        .map(|w| {
            let up_move = w[1].high - w[0].high;
            let down_move = w[0].low - w[1].low;

            let pdm = if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            };
            let mdm = if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            };
            (pdm, mdm)
        })
        .unzip();
    let tr_vals = true_ranges(candles);

    // ------------------------------------------------------------------
    // Step 3-5: smoothed inputs -> DI -> DX
    // ------------------------------------------------------------------
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);
    let smooth_tr = wilder_smooth(&tr_vals, period);

    let dx_values: Vec<f64> = smooth_plus
        .iter()
        .zip(smooth_minus.iter())
        .zip(smooth_tr.iter())
        .map(|((&p, &m), &tr)| compute_dx(p, m, tr))
        .collect();

    // ------------------------------------------------------------------
    // Step 6: ADX = Wilder's smoothed average of DX
    // ------------------------------------------------------------------
    wilder_smooth(&dx_values, period)
        .into_iter()
        .take_while(|adx| adx.is_finite())
        .collect()
}

/// Compute the most recent ADX value.
pub fn calculate_adx(candles: &[Candle], period: usize) -> Option<f64> {
    calculate_adx_series(candles, period).last().copied()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Compute DX from smoothed +DM, -DM, and TR values.
///
/// A zero true range yields zero DI on both sides, and a zero DI sum yields a
/// DX of 0 (no directional movement).
fn compute_dx(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> f64 {
    if smooth_tr == 0.0 {
        return 0.0;
    }

    let plus_di = (smooth_plus_dm / smooth_tr) * 100.0;
    let minus_di = (smooth_minus_dm / smooth_tr) * 100.0;

    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        return 0.0;
    }

    ((plus_di - minus_di).abs() / di_sum) * 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(0, open, high, low, close, 1.0)
    }

    #[test]
    fn adx_period_zero() {
        let candles = vec![candle(1.0, 2.0, 0.5, 1.5); 50];
        assert!(calculate_adx(&candles, 0).is_none());
    }

    #[test]
    fn adx_insufficient_data() {
        let candles = vec![candle(1.0, 2.0, 0.5, 1.5); 10];
        assert!(calculate_adx(&candles, 14).is_none());
    }

    #[test]
    fn adx_strong_uptrend() {
        let candles: Vec<Candle> = (0..60)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                candle(base, base + 1.5, base - 0.5, base + 1.0)
            })
            .collect();

        let value = calculate_adx(&candles, 14).unwrap();
        assert!(value > 25.0, "expected ADX > 25 for strong trend, got {value}");
    }

    #[test]
    fn adx_flat_market() {
        let candles = vec![candle(100.0, 101.0, 99.0, 100.0); 60];
        let value = calculate_adx(&candles, 14).unwrap();
        assert!(value < 1.0, "expected ADX near 0 for flat market, got {value}");
    }

    #[test]
    fn adx_zero_range_bars_do_not_produce_nan() {
        let candles = vec![candle(100.0, 100.0, 100.0, 100.0); 40];
        let series = calculate_adx_series(&candles, 14);
        assert!(!series.is_empty());
        assert!(series.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn adx_result_range() {
        let candles: Vec<Candle> = (0..150)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.3).sin() * 10.0;
                candle(base - 0.5, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let series = calculate_adx_series(&candles, 14);
        assert!(!series.is_empty());
        for value in series {
            assert!((0.0..=100.0).contains(&value), "ADX {value} out of [0,100] range");
        }
    }

    #[test]
    fn adx_minimum_candles_exact() {
        let period = 5;
        let min = 2 * period;
        let candles: Vec<Candle> = (0..min)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(base, base + 1.0, base - 0.5, base + 0.5)
            })
            .collect();
        assert_eq!(calculate_adx_series(&candles, period).len(), 1);
        assert!(calculate_adx(&candles[..min - 1], period).is_none());
    }
}
