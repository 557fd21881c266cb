// =============================================================================
// Supertrend — ATR band trend follower
// =============================================================================
//
// For every bar after the ATR warm-up:
//   mid   = (high + low) / 2
//   upper = mid + multiplier * ATR
//   lower = mid - multiplier * ATR
//
// The first eligible bar starts in an uptrend when its close is above `mid`,
// otherwise in a downtrend. After that, against the previously emitted level:
//
//   uptrend:   cand = max(lower, prev); close <= cand => flip down, emit upper
//                                       otherwise     => emit cand
//   downtrend: cand = min(upper, prev); close >= cand => flip up, emit lower
//                                       otherwise     => emit cand
//
// Between flips the emitted level only moves toward price (the "stair-step").
// Defaults: period 10, multiplier 3.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::atr::calculate_atr_series;
use crate::market_data::Candle;

/// Direction flag emitted for a bullish bar.
pub const UPTREND: i8 = 1;
/// Direction flag emitted for a bearish bar.
pub const DOWNTREND: i8 = -1;

/// Parallel sequences of emitted band levels and trend directions.
///
/// Element `k` is aligned with candle `period + k`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupertrendSeries {
    pub levels: Vec<f64>,
    pub directions: Vec<i8>,
}

impl SupertrendSeries {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Most recent `(level, direction)` pair.
    pub fn last(&self) -> Option<(f64, i8)> {
        Some((*self.levels.last()?, *self.directions.last()?))
    }
}

/// Accumulator carried from one bar to the next.
#[derive(Debug, Clone, Copy)]
struct BandState {
    level: f64,
    direction: i8,
}

impl BandState {
    /// Seed state from the first eligible bar.
    fn seed(close: f64, mid: f64, upper: f64, lower: f64) -> Self {
        if close > mid {
            Self { level: lower, direction: UPTREND }
        } else {
            Self { level: upper, direction: DOWNTREND }
        }
    }

    /// Apply the ratchet / flip rule for the next bar.
    fn step(self, close: f64, upper: f64, lower: f64) -> Self {
        if self.direction == UPTREND {
            let candidate = lower.max(self.level);
            if close <= candidate {
                Self { level: upper, direction: DOWNTREND }
            } else {
                Self { level: candidate, direction: UPTREND }
            }
        } else {
            let candidate = upper.min(self.level);
            if close >= candidate {
                Self { level: lower, direction: UPTREND }
            } else {
                Self { level: candidate, direction: DOWNTREND }
            }
        }
    }
}

/// Compute the Supertrend series for `candles` (oldest first).
///
/// Returns an empty series when ATR(`period`) cannot be computed.
pub fn calculate_supertrend(candles: &[Candle], period: usize, multiplier: f64) -> SupertrendSeries {
    let atr = calculate_atr_series(candles, period);
    if atr.is_empty() {
        return SupertrendSeries::default();
    }

    let bars = &candles[period..];
    let mut out = SupertrendSeries {
        levels: Vec::with_capacity(atr.len()),
        directions: Vec::with_capacity(atr.len()),
    };

    bars.iter()
        .zip(atr.iter())
        .fold(None::<BandState>, |prev, (bar, &atr)| {
            let mid = (bar.high + bar.low) / 2.0;
            let upper = mid + multiplier * atr;
            let lower = mid - multiplier * atr;

            let next = match prev {
                None => BandState::seed(bar.close, mid, upper, lower),
                Some(state) => state.step(bar.close, upper, lower),
            };

            out.levels.push(next.level);
            out.directions.push(next.direction);
            Some(next)
        });

    out
}
