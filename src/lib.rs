// =============================================================================
// Orac Bias — multi-timeframe directional bias engine
// =============================================================================
//
// raw OHLCV series -> indicators -> per-timeframe bundle -> per-timeframe
// score -> weighted multi-timeframe verdict.
//
// Fetching is delegated to a `SeriesSource`; everything above it is pure.

pub mod htf_analysis;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod signals;
pub mod types;

pub use htf_analysis::{
    analyze, chart_snapshot, score_one, score_one_with, AggregatedBias, TimeframeOutcome,
};
pub use indicators::{MacdReading, OscillatorSource};
pub use market_data::{Candle, SeriesSource};
pub use runtime_config::AnalysisConfig;
pub use signals::TimeframeScore;
pub use types::{Bias, Grade, OmissionReason, Timeframe};
