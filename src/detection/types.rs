use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the confidence scale shared by every detector.
pub const MAX_CONFIDENCE: u8 = 100;

/// A single language guess produced by one detector.
///
/// Values are immutable once built; every constructor clamps the confidence
/// into `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    language: String,
    confidence: u8,
    source: String,
}

impl DetectionResult {
    pub fn new(language: impl Into<String>, confidence: u8, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            confidence: confidence.min(MAX_CONFIDENCE),
            source: source.into(),
        }
    }

    /// Builds a result from a fractional score on the 0–100 scale, rounding to
    /// the nearest integer. NaN and negative scores collapse to zero.
    pub fn from_score(language: impl Into<String>, score: f64, source: impl Into<String>) -> Self {
        let confidence = if score.is_nan() {
            0
        } else {
            score.round().clamp(0.0, MAX_CONFIDENCE as f64) as u8
        };
        Self::new(language, confidence, source)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    /// Name of the detector that produced this result.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}% via {})",
            self.language, self.confidence, self.source
        )
    }
}

/// Listing row describing one registered detector, for configuration UIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub enabled: bool,
    /// Position in the detection order, `None` when disabled.
    pub position: Option<usize>,
    pub configurable: bool,
    /// Detector's own threshold on the 0–100 scale.
    pub threshold: u8,
}

/// Composite outcome of the analytical protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionAnalysis {
    /// What the sequential protocol returned.
    pub primary: Option<DetectionResult>,
    /// Accepted results other than the primary one.
    pub alternatives: Vec<DetectionResult>,
    /// Results that fell below the global threshold.
    pub fallback: Vec<DetectionResult>,
    /// Every result from the exhaustive run, ranked.
    pub all: Vec<DetectionResult>,
    pub consensus_language: Option<String>,
    pub average_confidence: f64,
}

impl DetectionAnalysis {
    pub fn empty() -> Self {
        Self {
            primary: None,
            alternatives: Vec::new(),
            fallback: Vec::new(),
            all: Vec::new(),
            consensus_language: None,
            average_confidence: 0.0,
        }
    }
}

/// Advisory concerns about a code snippet. None of them block detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputWarning {
    Empty,
    TooShort { length: usize },
    MixedIndentation,
    SingleLongLine { length: usize },
}

impl fmt::Display for InputWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputWarning::Empty => write!(f, "Code is empty"),
            InputWarning::TooShort { length } => write!(
                f,
                "Code is very short ({} characters), detection may be unreliable",
                length
            ),
            InputWarning::MixedIndentation => {
                write!(f, "Code mixes tab and space indentation")
            }
            InputWarning::SingleLongLine { length } => write!(
                f,
                "Code is a single long line ({} characters), it may be minified",
                length
            ),
        }
    }
}
