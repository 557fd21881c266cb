// =============================================================================
// Indicator Bundle — every per-timeframe input the scorer needs
// =============================================================================
//
// Built once per (symbol, timeframe) from a validated series:
//   EMA(50) + ATR-normalised slope
//   RSI(14) + raw one-bar momentum
//   ATR(14)
//   Supertrend(10, 3) level + direction
//   ADX(14), or the "no trend" fallback of 25 when ADX has no value yet
//   Oscillator histogram + ATR-normalised slope (proxy, MACD, or supplied)
//
// The proxy histogram `(EMA - close) / close * 10` is a unitless ratio and
// carries no slope (always 0), so no price-level term reaches the score.
//
// Either the whole bundle is produced or none of it: a series shorter than the
// longest mandatory warm-up is rejected with `InsufficientData`.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::adx::calculate_adx;
use super::atr::calculate_atr;
use super::ema::calculate_ema;
use super::macd::calculate_macd;
use super::math::{last_slope, normalize_with_atr};
use super::rsi::calculate_rsi;
use super::supertrend::calculate_supertrend;
use crate::market_data::Candle;
use crate::runtime_config::{IndicatorParams, OscillatorMode};
use crate::types::OmissionReason;

/// Snapshot of the latest indicator values for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub ema: f64,
    /// One-bar EMA change in ATR units.
    pub ema_slope: f64,
    pub rsi: f64,
    /// One-bar RSI change, not normalised.
    pub rsi_momentum: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    /// One-bar histogram change in ATR units.
    pub macd_hist_slope: f64,
    pub supertrend: f64,
    /// +1 bullish, -1 bearish.
    pub supertrend_direction: i8,
    pub adx: f64,
    pub atr: f64,
}

/// Latest MACD readings supplied by a caller that has real MACD data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    /// Histogram one bar earlier, for the slope. Without it the slope is 0.
    pub previous_histogram: Option<f64>,
}

/// Where the oscillator fields of the bundle come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OscillatorSource {
    /// Follow `IndicatorParams::oscillator`.
    #[default]
    Configured,
    /// Use these readings instead of computing anything.
    Supplied(MacdReading),
}

/// Oscillator fields before ATR normalisation of the slope.
struct Oscillator {
    macd: f64,
    signal: f64,
    hist: f64,
    hist_change: f64,
}

/// Build the indicator bundle for `candles` (oldest first).
pub fn build_bundle(
    candles: &[Candle],
    params: &IndicatorParams,
    oscillator: OscillatorSource,
) -> Result<IndicatorBundle, OmissionReason> {
    let mode = match oscillator {
        OscillatorSource::Supplied(_) => OscillatorMode::Proxy,
        OscillatorSource::Configured => params.oscillator,
    };
    let required = params.required_bars(mode);
    if candles.len() < required {
        debug!(
            available = candles.len(),
            required, "indicator bundle: insufficient data"
        );
        return Err(insufficient(candles.len(), required));
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    // --- Trend: EMA --------------------------------------------------------
    let ema_series = calculate_ema(&closes, params.ema_period);
    let ema = *ema_series.last().ok_or(insufficient(candles.len(), required))?;

    // --- Volatility: ATR ---------------------------------------------------
    let atr = calculate_atr(candles, params.atr_period)
        .ok_or_else(|| OmissionReason::DegenerateArithmetic("atr".into()))?;

    // --- Momentum: RSI -----------------------------------------------------
    let rsi_series = calculate_rsi(&closes, params.rsi_period);
    let rsi = *rsi_series.last().ok_or(insufficient(candles.len(), required))?;
    let rsi_momentum = last_slope(&rsi_series);

    // --- Supertrend --------------------------------------------------------
    let (supertrend, supertrend_direction) = calculate_supertrend(
        candles,
        params.supertrend_period,
        params.supertrend_multiplier,
    )
    .last()
    .ok_or(insufficient(candles.len(), required))?;

    // --- Trend strength: ADX -----------------------------------------------
    let adx = calculate_adx(candles, params.adx_period).unwrap_or(params.adx_fallback);

    // --- Oscillator --------------------------------------------------------
    let osc = match oscillator {
        OscillatorSource::Supplied(reading) => Oscillator {
            macd: reading.macd,
            signal: reading.signal,
            hist: reading.histogram,
            hist_change: reading
                .previous_histogram
                .map_or(0.0, |prev| reading.histogram - prev),
        },
        OscillatorSource::Configured => match params.oscillator {
            OscillatorMode::Proxy => proxy_oscillator(ema, &closes, params.proxy_scale),
            OscillatorMode::Macd => {
                let out = calculate_macd(
                    &closes,
                    params.macd_fast,
                    params.macd_slow,
                    params.macd_signal,
                );
                let hist = *out.histogram.last().ok_or(insufficient(candles.len(), required))?;
                Oscillator {
                    macd: out.macd.last().copied().unwrap_or(0.0),
                    signal: out.signal.last().copied().unwrap_or(0.0),
                    hist,
                    hist_change: last_slope(&out.histogram),
                }
            }
        },
    };

    let bundle = IndicatorBundle {
        ema,
        ema_slope: normalize_with_atr(last_slope(&ema_series), atr),
        rsi,
        rsi_momentum,
        macd: osc.macd,
        macd_signal: osc.signal,
        macd_hist: osc.hist,
        macd_hist_slope: normalize_with_atr(osc.hist_change, atr),
        supertrend,
        supertrend_direction,
        adx,
        atr,
    };

    check_finite(&bundle)?;
    Ok(bundle)
}

/// `(EMA - last close) / last close * scale`. MACD, signal and the histogram
/// slope stay at 0.
fn proxy_oscillator(ema: f64, closes: &[f64], scale: f64) -> Oscillator {
    let hist = match closes.last() {
        Some(&close) if close != 0.0 => (ema - close) / close * scale,
        _ => 0.0,
    };
    Oscillator {
        macd: 0.0,
        signal: 0.0,
        hist,
        hist_change: 0.0,
    }
}

fn insufficient(available: usize, required: usize) -> OmissionReason {
    OmissionReason::InsufficientData {
        available,
        required,
    }
}

fn check_finite(b: &IndicatorBundle) -> Result<(), OmissionReason> {
    let fields = [
        ("ema", b.ema),
        ("ema_slope", b.ema_slope),
        ("rsi", b.rsi),
        ("rsi_momentum", b.rsi_momentum),
        ("macd", b.macd),
        ("macd_signal", b.macd_signal),
        ("macd_hist", b.macd_hist),
        ("macd_hist_slope", b.macd_hist_slope),
        ("supertrend", b.supertrend),
        ("adx", b.adx),
        ("atr", b.atr),
    ];
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(OmissionReason::DegenerateArithmetic((*name).to_string())),
        None => Ok(()),
    }
}
