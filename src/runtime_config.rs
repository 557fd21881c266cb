// =============================================================================
// Analysis Configuration — indicator periods, score weights, horizon weights
// =============================================================================
//
// Every tunable number used by the indicator bundle, the timeframe scorer and
// the multi-timeframe aggregator lives here, so alternate weighting schemes
// can be evaluated without touching the algorithms.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.
//
// =============================================================================

use std::collections::HashMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Timeframe;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_min_bars() -> usize {
    50
}

fn default_ema_period() -> usize {
    50
}

fn default_rsi_period() -> usize {
    14
}

fn default_atr_period() -> usize {
    14
}

fn default_supertrend_period() -> usize {
    10
}

fn default_supertrend_multiplier() -> f64 {
    3.0
}

fn default_adx_period() -> usize {
    14
}

fn default_adx_fallback() -> f64 {
    25.0
}

fn default_proxy_scale() -> f64 {
    10.0
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_rsi_level_weight() -> f64 {
    0.7
}

fn default_rsi_momentum_weight() -> f64 {
    0.3
}

fn default_rsi_momentum_scale() -> f64 {
    10.0
}

fn default_adx_threshold() -> f64 {
    25.0
}

fn default_bias_threshold() -> f64 {
    20.0
}

fn default_timeframe_weights() -> HashMap<String, f64> {
    Timeframe::ALL
        .iter()
        .map(|tf| (tf.canonical().to_string(), tf.default_weight()))
        .collect()
}

fn default_unknown_timeframe_weight() -> f64 {
    1.0
}

fn default_timeframes() -> Vec<String> {
    Timeframe::ALL
        .iter()
        .map(|tf| tf.canonical().to_string())
        .collect()
}

fn default_chart_interval() -> String {
    "15min".to_string()
}

fn default_chart_limit() -> usize {
    100
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Where the oscillator histogram comes from when the caller does not supply
/// MACD readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillatorMode {
    /// `(EMA - lastClose) / lastClose * proxy_scale`.
    Proxy,
    /// MACD(fast, slow, signal) histogram computed from closes.
    Macd,
}

impl Default for OscillatorMode {
    fn default() -> Self {
        Self::Proxy
    }
}

/// Periods and multipliers for the indicator bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Minimum bars before a timeframe is analysed at all.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,

    #[serde(default = "default_ema_period")]
    pub ema_period: usize,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    #[serde(default = "default_supertrend_period")]
    pub supertrend_period: usize,

    #[serde(default = "default_supertrend_multiplier")]
    pub supertrend_multiplier: f64,

    #[serde(default = "default_adx_period")]
    pub adx_period: usize,

    /// ADX used when the series is too short for ADX itself ("no trend").
    #[serde(default = "default_adx_fallback")]
    pub adx_fallback: f64,

    #[serde(default)]
    pub oscillator: OscillatorMode,

    /// Multiplier applied to the proxy oscillator.
    #[serde(default = "default_proxy_scale")]
    pub proxy_scale: f64,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            min_bars: default_min_bars(),
            ema_period: default_ema_period(),
            rsi_period: default_rsi_period(),
            atr_period: default_atr_period(),
            supertrend_period: default_supertrend_period(),
            supertrend_multiplier: default_supertrend_multiplier(),
            adx_period: default_adx_period(),
            adx_fallback: default_adx_fallback(),
            oscillator: OscillatorMode::default(),
            proxy_scale: default_proxy_scale(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
        }
    }
}

impl IndicatorParams {
    /// Bars needed before every mandatory indicator has at least one value.
    pub fn required_bars(&self, mode: OscillatorMode) -> usize {
        let mut required = self
            .min_bars
            .max(self.ema_period)
            .max(self.rsi_period + 1)
            .max(self.atr_period + 1)
            .max(self.supertrend_period + 1);
        if mode == OscillatorMode::Macd {
            required = required.max(self.macd_slow + self.macd_signal - 1);
        }
        required
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Weights of the four sub-scores in the per-timeframe raw score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub ema: f64,
    pub rsi: f64,
    pub oscillator: f64,
    pub supertrend: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ema: 0.30,
            rsi: 0.20,
            oscillator: 0.25,
            supertrend: 0.25,
        }
    }
}

/// Constants for sub-score shaping, confidence and bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringParams {
    #[serde(default = "default_rsi_level_weight")]
    pub rsi_level_weight: f64,

    #[serde(default = "default_rsi_momentum_weight")]
    pub rsi_momentum_weight: f64,

    /// RSI momentum is divided by this before clamping.
    #[serde(default = "default_rsi_momentum_scale")]
    pub rsi_momentum_scale: f64,

    /// ADX level at which confidence starts rising above zero.
    #[serde(default = "default_adx_threshold")]
    pub adx_threshold: f64,

    /// |score| at or above which the bias is directional.
    #[serde(default = "default_bias_threshold")]
    pub bias_threshold: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            rsi_level_weight: default_rsi_level_weight(),
            rsi_momentum_weight: default_rsi_momentum_weight(),
            rsi_momentum_scale: default_rsi_momentum_scale(),
            adx_threshold: default_adx_threshold(),
            bias_threshold: default_bias_threshold(),
        }
    }
}

// =============================================================================
// AnalysisConfig
// =============================================================================

/// Top-level configuration for the bias engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub score_weights: ScoreWeights,

    #[serde(default)]
    pub scoring: ScoringParams,

    /// Horizon weight per canonical timeframe label.
    #[serde(default = "default_timeframe_weights")]
    pub timeframe_weights: HashMap<String, f64>,

    /// Weight for labels that are neither canonical nor a known alias.
    #[serde(default = "default_unknown_timeframe_weight")]
    pub unknown_timeframe_weight: f64,

    /// Timeframes analysed when the caller does not name any.
    #[serde(default = "default_timeframes")]
    pub default_timeframes: Vec<String>,

    #[serde(default = "default_chart_interval")]
    pub chart_interval: String,

    /// Number of most recent candles returned for charting.
    #[serde(default = "default_chart_limit")]
    pub chart_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            score_weights: ScoreWeights::default(),
            scoring: ScoringParams::default(),
            timeframe_weights: default_timeframe_weights(),
            unknown_timeframe_weight: default_unknown_timeframe_weight(),
            default_timeframes: default_timeframes(),
            chart_interval: default_chart_interval(),
            chart_limit: default_chart_limit(),
        }
    }
}

impl AnalysisConfig {
    /// Horizon weight for a caller-supplied timeframe label. Aliases resolve
    /// to their canonical label; anything unrecognised gets
    /// `unknown_timeframe_weight`.
    pub fn timeframe_weight(&self, label: &str) -> f64 {
        if let Some(w) = self.timeframe_weights.get(label) {
            return *w;
        }
        Timeframe::parse(label)
            .and_then(|tf| self.timeframe_weights.get(tf.canonical()).copied())
            .unwrap_or(self.unknown_timeframe_weight)
    }

    /// Reject settings that would make the indicators or the weighted mean
    /// meaningless.
    pub fn validate(&self) -> Result<()> {
        let p = &self.indicators;
        ensure!(p.ema_period > 0, "ema_period must be positive");
        ensure!(p.rsi_period > 0, "rsi_period must be positive");
        ensure!(p.atr_period > 0, "atr_period must be positive");
        ensure!(p.supertrend_period > 0, "supertrend_period must be positive");
        ensure!(p.adx_period > 0, "adx_period must be positive");
        ensure!(
            p.supertrend_multiplier > 0.0,
            "supertrend_multiplier must be positive"
        );
        ensure!(
            p.macd_fast > 0 && p.macd_signal > 0 && p.macd_fast < p.macd_slow,
            "macd periods must satisfy 0 < fast < slow and signal > 0"
        );

        let w = &self.score_weights;
        ensure!(
            [w.ema, w.rsi, w.oscillator, w.supertrend]
                .iter()
                .all(|x| x.is_finite() && *x >= 0.0),
            "score weights must be finite and non-negative"
        );
        ensure!(
            self.timeframe_weights
                .values()
                .chain(std::iter::once(&self.unknown_timeframe_weight))
                .all(|x| x.is_finite() && *x > 0.0),
            "timeframe weights must be finite and positive"
        );
        ensure!(
            self.scoring.adx_threshold > 0.0,
            "adx_threshold must be positive"
        );
        ensure!(
            self.scoring.rsi_momentum_scale > 0.0,
            "rsi_momentum_scale must be positive"
        );
        Ok(())
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analysis config from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid analysis config in {}", path.display()))?;

        info!(
            path = %path.display(),
            timeframes = ?config.default_timeframes,
            oscillator = ?config.indicators.oscillator,
            "analysis config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise analysis config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "analysis config saved (atomic)");
        Ok(())
    }
}
