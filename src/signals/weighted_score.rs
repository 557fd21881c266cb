// =============================================================================
// Weighted Sub-Score Ensemble
// =============================================================================
//
// Four directional sub-scores, each already in [-1, 1], combined by a fixed
// weight map into the raw per-timeframe score:
//
//   raw = w_ema * ema + w_rsi * rsi + w_osc * oscillator + w_st * supertrend
//
// With the default weights (summing to 1.0) `raw` stays in [-1, 1].

use serde::{Deserialize, Serialize};

use crate::runtime_config::ScoreWeights;

/// Clamped sub-scores feeding the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub ema: f64,
    pub rsi: f64,
    pub oscillator: f64,
    pub supertrend: f64,
}

/// The contribution of a single sub-score to the raw score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalContribution {
    pub name: &'static str,
    pub weight: f64,
    pub value: f64,
    pub contribution: f64,
}

impl ScoreComponents {
    /// Per-component contributions, in a stable order.
    pub fn contributions(&self, weights: &ScoreWeights) -> [SignalContribution; 4] {
        let entry = |name, weight: f64, value: f64| SignalContribution {
            name,
            weight,
            value,
            contribution: weight * value,
        };
        [
            entry("ema", weights.ema, self.ema),
            entry("rsi", weights.rsi, self.rsi),
            entry("oscillator", weights.oscillator, self.oscillator),
            entry("supertrend", weights.supertrend, self.supertrend),
        ]
    }

    /// Weighted sum of the sub-scores.
    pub fn weighted_sum(&self, weights: &ScoreWeights) -> f64 {
        self.contributions(weights)
            .iter()
            .map(|c| c.contribution)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_bullish_sums_to_one() {
        let c = ScoreComponents {
            ema: 1.0,
            rsi: 1.0,
            oscillator: 1.0,
            supertrend: 1.0,
        };
        assert!((c.weighted_sum(&ScoreWeights::default()) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn opposing_components_partially_cancel() {
        let c = ScoreComponents {
            ema: 1.0,
            rsi: 0.0,
            oscillator: 0.0,
            supertrend: -1.0,
        };
        // 0.30 - 0.25
        assert!((c.weighted_sum(&ScoreWeights::default()) - 0.05).abs() < 1e-10);
    }

    #[test]
    fn contributions_follow_custom_weights() {
        let w = ScoreWeights {
            ema: 0.0,
            rsi: 0.0,
            oscillator: 0.0,
            supertrend: 1.0,
        };
        let c = ScoreComponents {
            ema: 0.9,
            rsi: -0.4,
            oscillator: 0.2,
            supertrend: -1.0,
        };
        let parts = c.contributions(&w);
        assert_eq!(parts[3].name, "supertrend");
        assert!((parts[3].contribution + 1.0).abs() < 1e-10);
        assert!((c.weighted_sum(&w) + 1.0).abs() < 1e-10);
    }
}
