// =============================================================================
// Shared types used across the bias engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Categorical directional verdict derived from a bounded score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    /// `score >= threshold` is Bullish, `score <= -threshold` is Bearish.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Self::Bullish
        } else if score <= -threshold {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

impl Default for Bias {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for Bias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Letter grade for the strength of an overall score, independent of sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    #[serde(rename = "C+")]
    CPlus,
    B,
    #[serde(rename = "B+")]
    BPlus,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// Grade `|score|` against the fixed thresholds 80/70/60/50/40/30/20.
    pub fn from_score(score: f64) -> Self {
        let abs = score.abs();
        if abs >= 80.0 {
            Self::APlus
        } else if abs >= 70.0 {
            Self::A
        } else if abs >= 60.0 {
            Self::BPlus
        } else if abs >= 50.0 {
            Self::B
        } else if abs >= 40.0 {
            Self::CPlus
        } else if abs >= 30.0 {
            Self::C
        } else if abs >= 20.0 {
            Self::D
        } else {
            Self::F
        }
    }
}

impl Default for Grade {
    fn default() -> Self {
        Self::F
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{label}")
    }
}

/// Sampling granularities with a known horizon weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Min15,
    Hour1,
    Hour4,
    Day1,
    Week1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Self::Min15,
        Self::Hour1,
        Self::Hour4,
        Self::Day1,
        Self::Week1,
    ];

    /// Resolve a caller-supplied label, including the common aliases.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "15min" | "15m" => Some(Self::Min15),
            "1hour" | "1h" | "60min" => Some(Self::Hour1),
            "4hour" | "4h" => Some(Self::Hour4),
            "1day" | "1D" | "daily" => Some(Self::Day1),
            "1week" | "1W" | "weekly" => Some(Self::Week1),
            _ => None,
        }
    }

    /// Canonical label used for config keys and file names.
    pub fn canonical(self) -> &'static str {
        match self {
            Self::Min15 => "15min",
            Self::Hour1 => "1hour",
            Self::Hour4 => "4hour",
            Self::Day1 => "1day",
            Self::Week1 => "1week",
        }
    }

    /// Built-in horizon weight: longer horizons count for more.
    pub fn default_weight(self) -> f64 {
        match self {
            Self::Min15 => 0.5,
            Self::Hour1 => 1.0,
            Self::Hour4 => 1.5,
            Self::Day1 => 2.0,
            Self::Week1 => 2.5,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Why a timeframe was left out of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum OmissionReason {
    /// Fewer bars than the indicator set needs.
    InsufficientData { available: usize, required: usize },
    /// The series source failed.
    ProviderFailure(String),
    /// The series is unordered or carries unusable prices.
    InvalidSeries(String),
    /// A derived field came out non-finite.
    DegenerateArithmetic(String),
}

impl std::fmt::Display for OmissionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData {
                available,
                required,
            } => write!(f, "insufficient data: {available} bars, need {required}"),
            Self::ProviderFailure(e) => write!(f, "provider failure: {e}"),
            Self::InvalidSeries(e) => write!(f, "invalid series: {e}"),
            Self::DegenerateArithmetic(field) => write!(f, "non-finite {field}"),
        }
    }
}
