// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators behind the bias
// score. Series functions return an empty `Vec` and point functions `None`
// when the input is too short, so callers handle warm-up explicitly.

pub mod adx;
pub mod atr;
pub mod bundle;
pub mod ema;
pub mod macd;
pub mod math;
pub mod rsi;
pub mod supertrend;

pub use bundle::{build_bundle, IndicatorBundle, MacdReading, OscillatorSource};
