// =============================================================================
// Timeframe Scorer — indicator bundle -> bounded score + confidence
// =============================================================================
//
// Sub-scores (each in [-1, 1]):
//   ema        = clamp(ema_slope)
//   rsi        = 0.7 * (rsi - 50) / 50 + 0.3 * clamp(rsi_momentum / 10)
//   oscillator = clamp(macd_hist_slope)
//   supertrend = direction (+1 / -1)
//
// Confidence rises linearly from 0 at ADX = 25 to 1 at ADX = 50.
// The final score halves the raw score when there is no trend at all:
//
//   score = clamp(raw * (0.5 + 0.5 * confidence) * 100, -100, 100)

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::weighted_score::ScoreComponents;
use crate::indicators::bundle::IndicatorBundle;
use crate::indicators::math::clamp;
use crate::runtime_config::AnalysisConfig;
use crate::types::Bias;

/// Scored snapshot of one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeScore {
    /// Timeframe label as the caller supplied it.
    pub timeframe: String,
    /// In [-100, 100].
    pub score: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub indicators: IndicatorBundle,
    pub bias: Bias,
    pub components: ScoreComponents,
    /// Weighted sum of the components before confidence scaling.
    pub raw_score: f64,
}

/// Map ADX to a confidence in [0, 1] around `threshold`.
pub fn confidence_from_adx(adx: f64, threshold: f64) -> f64 {
    clamp((adx - threshold) / threshold, 0.0, 1.0)
}

/// Clamp each bundle field into its sub-score.
pub fn components(bundle: &IndicatorBundle, config: &AnalysisConfig) -> ScoreComponents {
    let s = &config.scoring;
    let rsi_level = (bundle.rsi - 50.0) / 50.0;
    let rsi_momentum = clamp(bundle.rsi_momentum / s.rsi_momentum_scale, -1.0, 1.0);

    ScoreComponents {
        ema: clamp(bundle.ema_slope, -1.0, 1.0),
        rsi: s.rsi_level_weight * rsi_level + s.rsi_momentum_weight * rsi_momentum,
        oscillator: clamp(bundle.macd_hist_slope, -1.0, 1.0),
        supertrend: f64::from(bundle.supertrend_direction),
    }
}

/// Score a bundle for `timeframe`.
pub fn score_bundle(
    timeframe: &str,
    bundle: IndicatorBundle,
    config: &AnalysisConfig,
) -> TimeframeScore {
    let components = components(&bundle, config);
    let raw_score = components.weighted_sum(&config.score_weights);
    let confidence = confidence_from_adx(bundle.adx, config.scoring.adx_threshold);
    let score = clamp(raw_score * (0.5 + 0.5 * confidence) * 100.0, -100.0, 100.0);
    let bias = Bias::from_score(score, config.scoring.bias_threshold);

    debug!(
        timeframe,
        score = format!("{:.2}", score),
        confidence = format!("{:.3}", confidence),
        %bias,
        "timeframe scored"
    );

    TimeframeScore {
        timeframe: timeframe.to_string(),
        score,
        confidence,
        indicators: bundle,
        bias,
        components,
        raw_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> IndicatorBundle {
        IndicatorBundle {
            ema: 100.0,
            ema_slope: 0.0,
            rsi: 50.0,
            rsi_momentum: 0.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_hist: 0.0,
            macd_hist_slope: 0.0,
            supertrend: 95.0,
            supertrend_direction: 1,
            adx: 25.0,
            atr: 1.0,
        }
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(confidence_from_adx(10.0, 25.0), 0.0);
        assert_eq!(confidence_from_adx(25.0, 25.0), 0.0);
        assert!((confidence_from_adx(37.5, 25.0) - 0.5).abs() < 1e-10);
        assert_eq!(confidence_from_adx(50.0, 25.0), 1.0);
        assert_eq!(confidence_from_adx(90.0, 25.0), 1.0);
    }

    #[test]
    fn supertrend_only_no_trend() {
        // raw = 0.25, confidence 0 -> 0.25 * 0.5 * 100
        let s = score_bundle("1hour", bundle(), &AnalysisConfig::default());
        assert!((s.raw_score - 0.25).abs() < 1e-10);
        assert!((s.score - 12.5).abs() < 1e-10);
        assert_eq!(s.bias, Bias::Neutral);
        assert_eq!(s.timeframe, "1hour");
    }

    #[test]
    fn strong_uptrend_is_bullish() {
        let b = IndicatorBundle {
            ema_slope: 0.8,
            rsi: 100.0,
            macd_hist_slope: -0.01,
            adx: 100.0,
            ..bundle()
        };
        let s = score_bundle("1day", b, &AnalysisConfig::default());
        // 0.3*0.8 + 0.2*0.7 + 0.25*(-0.01) + 0.25
        let raw = 0.24 + 0.14 - 0.0025 + 0.25;
        assert!((s.raw_score - raw).abs() < 1e-10);
        assert!((s.score - raw * 100.0).abs() < 1e-10);
        assert_eq!(s.bias, Bias::Bullish);
    }

    #[test]
    fn sub_scores_are_clamped() {
        let b = IndicatorBundle {
            ema_slope: -7.0,
            rsi: 0.0,
            rsi_momentum: -40.0,
            macd_hist_slope: -3.0,
            supertrend_direction: -1,
            adx: 60.0,
            ..bundle()
        };
        let s = score_bundle("4hour", b, &AnalysisConfig::default());
        assert_eq!(s.components.ema, -1.0);
        assert!((s.components.rsi + 1.0).abs() < 1e-10);
        assert_eq!(s.components.oscillator, -1.0);
        assert!((s.score + 100.0).abs() < 1e-10);
        assert_eq!(s.bias, Bias::Bearish);
    }

    #[test]
    fn score_is_bounded() {
        let config = AnalysisConfig {
            score_weights: crate::runtime_config::ScoreWeights {
                ema: 2.0,
                rsi: 2.0,
                oscillator: 2.0,
                supertrend: 2.0,
            },
            ..AnalysisConfig::default()
        };
        let b = IndicatorBundle {
            ema_slope: 1.0,
            rsi: 100.0,
            rsi_momentum: 10.0,
            macd_hist_slope: 1.0,
            adx: 80.0,
            ..bundle()
        };
        let s = score_bundle("1week", b, &config);
        assert_eq!(s.score, 100.0);
    }
}
