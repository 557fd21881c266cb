// =============================================================================
// Signals Module
// =============================================================================
//
// Turns an indicator bundle into a directional verdict for one timeframe:
// - Weighted ensemble of four clamped sub-scores
// - ADX-derived confidence and the bounded per-timeframe score

pub mod timeframe_score;
pub mod weighted_score;

pub use timeframe_score::{confidence_from_adx, score_bundle, TimeframeScore};
pub use weighted_score::{ScoreComponents, SignalContribution};
