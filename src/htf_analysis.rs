// =============================================================================
// Multi-Timeframe Bias Aggregation
// =============================================================================
//
// Fetches every requested timeframe concurrently, scores each one on its own,
// and folds the successful scores into one verdict:
//
//   overall    = sum(w_tf * score_tf) / sum(w_tf)        (0 when nothing scored)
//   confidence = mean(confidence_tf)                      (unweighted)
//   grade/bias = from the unrounded overall score
//
// Horizon weights grow with the timeframe (15min 0.5 .. 1week 2.5). A
// timeframe that fails to fetch, validate or score is reported as omitted and
// never fails its siblings.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::indicators::bundle::{build_bundle, OscillatorSource};
use crate::market_data::{validate_series, Candle, SeriesSource};
use crate::runtime_config::AnalysisConfig;
use crate::signals::timeframe_score::{score_bundle, TimeframeScore};
use crate::types::{Bias, Grade, OmissionReason};

/// Result of evaluating a single timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeframeOutcome {
    Scored(TimeframeScore),
    Omitted {
        timeframe: String,
        reason: OmissionReason,
    },
}

impl TimeframeOutcome {
    pub fn into_score(self) -> Option<TimeframeScore> {
        match self {
            Self::Scored(s) => Some(s),
            Self::Omitted { .. } => None,
        }
    }
}

/// A timeframe left out of the aggregate, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmittedTimeframe {
    pub timeframe: String,
    pub reason: OmissionReason,
}

/// Final multi-timeframe verdict for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBias {
    pub symbol: String,
    /// Weighted mean score rounded half-up, in [-100, 100].
    pub overall_score: i64,
    pub grade: Grade,
    pub bias: Bias,
    /// Unweighted mean of the per-timeframe confidences.
    pub confidence: f64,
    /// Scored timeframes in the caller's order.
    pub timeframes: Vec<TimeframeScore>,
    pub omitted: Vec<OmittedTimeframe>,
}

/// Validate, bundle and score one already-fetched series.
pub fn evaluate_series(series: &[Candle], timeframe: &str, config: &AnalysisConfig) -> TimeframeOutcome {
    evaluate_series_with(series, timeframe, config, OscillatorSource::Configured)
}

/// [`evaluate_series`] with an explicit oscillator source, for callers that
/// hold real MACD readings.
pub fn evaluate_series_with(
    series: &[Candle],
    timeframe: &str,
    config: &AnalysisConfig,
    oscillator: OscillatorSource,
) -> TimeframeOutcome {
    let omitted = |reason| TimeframeOutcome::Omitted {
        timeframe: timeframe.to_string(),
        reason,
    };

    if let Err(e) = validate_series(series) {
        return omitted(OmissionReason::InvalidSeries(e.to_string()));
    }

    match build_bundle(series, &config.indicators, oscillator) {
        Ok(bundle) => TimeframeOutcome::Scored(score_bundle(timeframe, bundle, config)),
        Err(reason) => omitted(reason),
    }
}

/// Score a single series, or `None` when it cannot be scored.
pub fn score_one(series: &[Candle], timeframe: &str, config: &AnalysisConfig) -> Option<TimeframeScore> {
    evaluate_series(series, timeframe, config).into_score()
}

/// [`score_one`] with an explicit oscillator source.
pub fn score_one_with(
    series: &[Candle],
    timeframe: &str,
    config: &AnalysisConfig,
    oscillator: OscillatorSource,
) -> Option<TimeframeScore> {
    evaluate_series_with(series, timeframe, config, oscillator).into_score()
}

/// Fold per-timeframe outcomes into the overall verdict.
pub fn aggregate(
    symbol: &str,
    outcomes: Vec<TimeframeOutcome>,
    config: &AnalysisConfig,
) -> AggregatedBias {
    let mut timeframes = Vec::new();
    let mut omitted = Vec::new();
    for outcome in outcomes {
        match outcome {
            TimeframeOutcome::Scored(s) => timeframes.push(s),
            TimeframeOutcome::Omitted { timeframe, reason } => {
                omitted.push(OmittedTimeframe { timeframe, reason })
            }
        }
    }

    let (weighted, total_weight) = timeframes.iter().fold((0.0, 0.0), |(sum, w_sum), s| {
        let w = config.timeframe_weight(&s.timeframe);
        (sum + w * s.score, w_sum + w)
    });
    let mean = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    };
    let confidence = if timeframes.is_empty() {
        0.0
    } else {
        timeframes.iter().map(|s| s.confidence).sum::<f64>() / timeframes.len() as f64
    };

    AggregatedBias {
        symbol: symbol.to_string(),
        overall_score: round_half_up(mean),
        grade: Grade::from_score(mean),
        bias: Bias::from_score(mean, config.scoring.bias_threshold),
        confidence,
        timeframes,
        omitted,
    }
}

fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Analyse `symbol` over `timeframes`, fetching every series concurrently.
///
/// The returned timeframe list follows the order of `timeframes`, whatever
/// order the fetches complete in.
pub async fn analyze<S, T>(
    source: &S,
    symbol: &str,
    timeframes: &[T],
    config: &AnalysisConfig,
) -> AggregatedBias
where
    S: SeriesSource,
    T: AsRef<str>,
{
    let tasks = timeframes.iter().map(|tf| {
        let tf = tf.as_ref();
        async move {
            match source.fetch_series(symbol, tf).await {
                Ok(series) => evaluate_series(&series, tf, config),
                Err(e) => TimeframeOutcome::Omitted {
                    timeframe: tf.to_string(),
                    reason: OmissionReason::ProviderFailure(format!("{e:#}")),
                },
            }
        }
    });
    let outcomes = join_all(tasks).await;

    for outcome in &outcomes {
        match outcome {
            TimeframeOutcome::Omitted {
                timeframe,
                reason: reason @ OmissionReason::InsufficientData { .. },
            } => debug!(symbol, timeframe = %timeframe, %reason, "timeframe omitted"),
            TimeframeOutcome::Omitted { timeframe, reason } => {
                warn!(symbol, timeframe = %timeframe, error = %reason, "timeframe omitted")
            }
            TimeframeOutcome::Scored(_) => {}
        }
    }

    let result = aggregate(symbol, outcomes, config);
    info!(
        symbol,
        score = result.overall_score,
        grade = %result.grade,
        bias = %result.bias,
        scored = result.timeframes.len(),
        omitted = result.omitted.len(),
        "bias analysis complete"
    );
    result
}

/// Recent candles for charting, plus the score of the whole series when it
/// can be computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub symbol: String,
    pub interval: String,
    pub candles: Vec<Candle>,
    pub score: Option<TimeframeScore>,
}

/// Fetch `interval` (or the configured chart interval) and keep the last
/// `chart_limit` candles.
pub async fn chart_snapshot<S: SeriesSource>(
    source: &S,
    symbol: &str,
    interval: Option<&str>,
    config: &AnalysisConfig,
) -> anyhow::Result<ChartSnapshot> {
    let interval = interval.unwrap_or(config.chart_interval.as_str());
    let series = source.fetch_series(symbol, interval).await?;
    let score = score_one(&series, interval, config);

    let start = series.len().saturating_sub(config.chart_limit);
    let candles = series[start..].to_vec();
    debug!(symbol, interval, count = candles.len(), scored = score.is_some(), "chart snapshot");

    Ok(ChartSnapshot {
        symbol: symbol.to_string(),
        interval: interval.to_string(),
        candles,
        score,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::bundle::{IndicatorBundle, MacdReading};
    use crate::market_data::{CandleBuffer, CandleKey};
    use crate::signals::weighted_score::ScoreComponents;
    use std::collections::HashMap;
    use std::time::Duration;

    fn ramp(n: usize, start: f64, step: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = start + i as f64 * step;
                Candle::new(i as i64 * 60_000, c, c + 0.1, c - 0.3, c, 1_000.0)
            })
            .collect()
    }

    fn buffer_with(symbol: &str, series: &[(&str, Vec<Candle>)]) -> CandleBuffer {
        let buffer = CandleBuffer::new(500);
        for (tf, candles) in series {
            buffer.extend(CandleKey::new(symbol, *tf), candles.iter().copied());
        }
        buffer
    }

    fn scored(timeframe: &str, score: f64, confidence: f64) -> TimeframeOutcome {
        TimeframeOutcome::Scored(TimeframeScore {
            timeframe: timeframe.to_string(),
            score,
            confidence,
            indicators: IndicatorBundle {
                ema: 0.0,
                ema_slope: 0.0,
                rsi: 50.0,
                rsi_momentum: 0.0,
                macd: 0.0,
                macd_signal: 0.0,
                macd_hist: 0.0,
                macd_hist_slope: 0.0,
                supertrend: 0.0,
                supertrend_direction: 1,
                adx: 25.0,
                atr: 1.0,
            },
            bias: Bias::from_score(score, 20.0),
            components: ScoreComponents::default(),
            raw_score: score / 100.0,
        })
    }

    /// Delays each timeframe's fetch so completion order differs from request
    /// order.
    struct DelayedSource {
        inner: CandleBuffer,
        delays_ms: HashMap<&'static str, u64>,
    }

    impl SeriesSource for DelayedSource {
        async fn fetch_series(&self, symbol: &str, timeframe: &str) -> anyhow::Result<Vec<Candle>> {
            let delay = self.delays_ms.get(timeframe).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.inner.fetch_series(symbol, timeframe).await
        }
    }

    #[tokio::test]
    async fn all_failures_give_neutral_zero() {
        let buffer = CandleBuffer::new(500);
        let config = AnalysisConfig::default();
        let result = analyze(&buffer, "AAPL", config.default_timeframes.as_slice(), &config).await;

        assert_eq!(result.overall_score, 0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.grade, Grade::F);
        assert_eq!(result.bias, Bias::Neutral);
        assert!(result.timeframes.is_empty());
        assert_eq!(result.omitted.len(), 5);
        assert!(matches!(
            result.omitted[0].reason,
            OmissionReason::ProviderFailure(_)
        ));
    }

    #[tokio::test]
    async fn rising_series_is_bullish() {
        let buffer = buffer_with("AAPL", &[("1day", ramp(60, 100.0, 1.0))]);
        let config = AnalysisConfig::default();
        let result = analyze(&buffer, "AAPL", &["1day"], &config).await;

        assert_eq!(result.timeframes.len(), 1);
        assert!(result.overall_score > 20);
        assert_eq!(result.bias, Bias::Bullish);
        assert!(result.confidence > 0.9);
    }

    #[tokio::test]
    async fn short_series_is_omitted_not_failed() {
        let buffer = buffer_with(
            "AAPL",
            &[
                ("1hour", ramp(30, 100.0, 1.0)),
                ("1day", ramp(60, 100.0, 1.0)),
            ],
        );
        let config = AnalysisConfig::default();
        let result = analyze(&buffer, "AAPL", &["1hour", "1day"], &config).await;

        assert_eq!(result.timeframes.len(), 1);
        assert_eq!(result.timeframes[0].timeframe, "1day");
        assert_eq!(
            result.omitted,
            vec![OmittedTimeframe {
                timeframe: "1hour".into(),
                reason: OmissionReason::InsufficientData {
                    available: 30,
                    required: 50
                },
            }]
        );
    }

    #[tokio::test]
    async fn output_follows_request_order() {
        let inner = buffer_with(
            "MSFT",
            &[
                ("15min", ramp(60, 100.0, 1.0)),
                ("4hour", ramp(60, 200.0, -1.0)),
                ("1week", ramp(60, 100.0, 0.5)),
            ],
        );
        let source = DelayedSource {
            inner,
            delays_ms: HashMap::from([("15min", 30), ("4hour", 15), ("1week", 0)]),
        };
        let config = AnalysisConfig::default();
        let result = analyze(&source, "MSFT", &["15min", "4hour", "1week"], &config).await;

        let order: Vec<&str> = result.timeframes.iter().map(|s| s.timeframe.as_str()).collect();
        assert_eq!(order, vec!["15min", "4hour", "1week"]);
    }

    #[test]
    fn equal_scores_give_same_mean() {
        let config = AnalysisConfig::default();
        let outcomes = vec![
            scored("15min", 42.0, 0.2),
            scored("1day", 42.0, 0.4),
            scored("1week", 42.0, 0.6),
        ];
        let result = aggregate("X", outcomes, &config);
        assert_eq!(result.overall_score, 42);
        assert_eq!(result.grade, Grade::CPlus);
        assert!((result.confidence - 0.4).abs() < 1e-10);
    }

    #[test]
    fn longer_horizons_weigh_more() {
        let config = AnalysisConfig::default();
        // (0.5 * 10 + 2.5 * 40) / 3.0 = 35
        let result = aggregate(
            "X",
            vec![scored("15m", 10.0, 0.0), scored("weekly", 40.0, 0.0)],
            &config,
        );
        assert_eq!(result.overall_score, 35);
        assert_eq!(result.grade, Grade::C);
        assert_eq!(result.bias, Bias::Bullish);
    }

    #[test]
    fn rounding_is_half_up_and_grade_uses_unrounded() {
        let config = AnalysisConfig::default();

        let up = aggregate("X", vec![scored("1day", 12.5, 0.0)], &config);
        assert_eq!(up.overall_score, 13);
        let down = aggregate("X", vec![scored("1day", -12.5, 0.0)], &config);
        assert_eq!(down.overall_score, -12);

        let edge = aggregate("X", vec![scored("1day", 19.6, 0.0)], &config);
        assert_eq!(edge.overall_score, 20);
        assert_eq!(edge.grade, Grade::F);
        assert_eq!(edge.bias, Bias::Neutral);
    }

    #[test]
    fn omitted_outcomes_do_not_count() {
        let config = AnalysisConfig::default();
        let outcomes = vec![
            scored("1hour", -60.0, 1.0),
            TimeframeOutcome::Omitted {
                timeframe: "1day".into(),
                reason: OmissionReason::ProviderFailure("timeout".into()),
            },
        ];
        let result = aggregate("X", outcomes, &config);
        assert_eq!(result.overall_score, -60);
        assert_eq!(result.bias, Bias::Bearish);
        assert_eq!(result.omitted.len(), 1);
    }

    #[test]
    fn short_series_scores_nothing() {
        let config = AnalysisConfig::default();
        assert!(score_one(&ramp(49, 100.0, 1.0), "1day", &config).is_none());
        assert!(score_one(&ramp(50, 100.0, 1.0), "1day", &config).is_some());
    }

    #[test]
    fn score_ignores_price_scale() {
        let config = AnalysisConfig::default();
        let scaled = |s: f64| -> Vec<Candle> {
            ramp(60, 100.0, 1.0)
                .into_iter()
                .map(|c| Candle::new(c.open_time, c.open * s, c.high * s, c.low * s, c.close * s, c.volume))
                .collect()
        };

        let base = score_one(&scaled(1.0), "1day", &config).unwrap();
        for s in [0.001, 1000.0] {
            let other = score_one(&scaled(s), "1day", &config).unwrap();
            assert!((base.score - other.score).abs() < 1e-6, "scale {s}");
            assert!((base.components.oscillator - other.components.oscillator).abs() < 1e-9);
            assert_eq!(base.bias, other.bias);
            assert_eq!(Grade::from_score(base.score), Grade::from_score(other.score));
        }
        assert_eq!(base.components.oscillator, 0.0);
    }

    #[test]
    fn supplied_macd_reaches_the_score() {
        let config = AnalysisConfig::default();
        let series = ramp(60, 100.0, 1.0);
        let reading = MacdReading {
            macd: 2.0,
            signal: 1.5,
            histogram: 0.5,
            previous_histogram: Some(0.3),
        };

        let proxy = score_one(&series, "1day", &config).unwrap();
        let supplied =
            score_one_with(&series, "1day", &config, OscillatorSource::Supplied(reading)).unwrap();

        assert_eq!(supplied.indicators.macd, 2.0);
        assert!(supplied.components.oscillator > 0.0);
        assert!(supplied.score > proxy.score);
    }

    #[test]
    fn invalid_series_is_reported() {
        let mut series = ramp(60, 100.0, 1.0);
        series.swap(10, 11);
        let outcome = evaluate_series(&series, "1day", &AnalysisConfig::default());
        assert!(matches!(
            outcome,
            TimeframeOutcome::Omitted {
                reason: OmissionReason::InvalidSeries(_),
                ..
            }
        ));
        assert!(score_one(&series, "1day", &AnalysisConfig::default()).is_none());
    }

    #[tokio::test]
    async fn chart_snapshot_keeps_last_candles() {
        let buffer = buffer_with("AAPL", &[("15min", ramp(150, 100.0, 1.0))]);
        let config = AnalysisConfig::default();
        let snap = chart_snapshot(&buffer, "AAPL", None, &config).await.unwrap();

        assert_eq!(snap.interval, "15min");
        assert_eq!(snap.candles.len(), 100);
        assert_eq!(snap.candles[0].open_time, 50 * 60_000);
        assert!(snap.score.is_some());

        assert!(chart_snapshot(&buffer, "AAPL", Some("1day"), &config)
            .await
            .is_err());
    }
}
