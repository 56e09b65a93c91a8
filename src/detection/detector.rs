//! Detector capability traits
//!
//! Every classification strategy implements [`Detector`]. Two optional
//! capabilities are discovered at runtime instead of by detector identity:
//!
//! - [`ConfigurableDetector`]: an opaque JSON payload the detector owns
//! - [`LanguageFilter`]: an allow-list restricting which languages the
//!   detector may report
//!
//! # Example
//!
//! ```ignore
//! use langtag::detection::Detector;
//!
//! async fn classify(detector: &dyn Detector, code: &str) {
//!     match detector.detect(code).await {
//!         Ok(Some(result)) => println!("{}", result),
//!         Ok(None) => println!("no guess"),
//!         Err(e) => eprintln!("{} failed: {}", detector.name(), e),
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::types::{DetectionResult, MAX_CONFIDENCE};

/// Errors a detector may report
///
/// Detectors are expected to degrade to `Ok(None)` on their own, but adapter
/// detectors wrapping third-party classifiers may still surface failures. The
/// orchestrator treats any `Err` as "no result" for that detector only.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detection failed: {0}")]
    Failed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Core trait every detection strategy implements
#[async_trait]
pub trait Detector: Send + Sync {
    /// Stable, globally unique identifier. Used as the join key for
    /// configuration and lookup; must never change.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// Canonical language identifiers this detector can report.
    fn supported_languages(&self) -> Vec<String>;

    /// Classifies `code`. Returns `Ok(None)` for empty or whitespace-only
    /// input and whenever the best guess falls below the detector's own
    /// threshold.
    async fn detect(&self, code: &str) -> Result<Option<DetectionResult>, DetectorError>;

    /// Detector's own threshold on the 0.0–1.0 scale.
    fn threshold(&self) -> f64;

    fn set_threshold(&mut self, threshold: f64);

    fn as_configurable(&self) -> Option<&dyn ConfigurableDetector> {
        None
    }

    fn as_configurable_mut(&mut self) -> Option<&mut dyn ConfigurableDetector> {
        None
    }

    fn as_language_filter(&self) -> Option<&dyn LanguageFilter> {
        None
    }

    fn as_language_filter_mut(&mut self) -> Option<&mut dyn LanguageFilter> {
        None
    }

    fn is_configurable(&self) -> bool {
        self.as_configurable().is_some()
    }

    /// Whether the detector may report `language`. Detectors without a
    /// [`LanguageFilter`] accept everything.
    fn accepts_language(&self, language: &str) -> bool {
        self.as_language_filter()
            .map_or(true, |filter| filter.is_language_enabled(language))
    }
}

/// Optional capability: detector-owned opaque configuration
pub trait ConfigurableDetector: Send + Sync {
    fn get_configuration(&self) -> Value;

    fn set_configuration(&mut self, payload: Value) -> Result<(), DetectorError>;
}

/// Optional capability: language allow-list
///
/// An empty allow-list means every language is allowed.
pub trait LanguageFilter: Send + Sync {
    fn enabled_languages(&self) -> Vec<String>;

    fn set_enabled_languages(&mut self, languages: Vec<String>);

    fn is_language_enabled(&self, language: &str) -> bool {
        let enabled = self.enabled_languages();
        enabled.is_empty() || enabled.iter().any(|l| l == language)
    }
}

/// Converts a 0–100 external threshold into the 0.0–1.0 internal scale.
pub fn threshold_to_internal(threshold: u8) -> f64 {
    f64::from(threshold.min(MAX_CONFIDENCE)) / 100.0
}

/// Converts a 0.0–1.0 internal threshold into the 0–100 external scale.
pub fn threshold_to_external(threshold: f64) -> u8 {
    if threshold.is_nan() {
        return 0;
    }
    (threshold * 100.0).round().clamp(0.0, MAX_CONFIDENCE as f64) as u8
}

/// Clamps a threshold into the 0.0–1.0 scale.
pub fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, 1.0)
    }
}
