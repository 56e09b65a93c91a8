//! Language detection engine
//!
//! Detectors are pluggable strategies behind the [`Detector`] trait. The
//! [`DetectorRegistry`] owns them together with the detection order, the
//! [`DetectionOrchestrator`] runs them, and the [`ConfigurationManager`] is
//! the only component that changes thresholds, order and allow-lists.

pub mod configuration;
pub mod detector;
pub mod orchestrator;
pub mod registry;
pub mod service;
pub mod types;

pub use configuration::{
    ConfigurationManager, ConfigurationSummary, DetectionSettings, ImportOutcome,
    ValidationReport,
};
pub use detector::{ConfigurableDetector, Detector, DetectorError, LanguageFilter};
pub use orchestrator::{DetectionOrchestrator, DEFAULT_CONFIDENCE_THRESHOLD};
pub use registry::DetectorRegistry;
pub use service::DetectionService;
pub use types::{DetectionAnalysis, DetectionResult, DetectorInfo, InputWarning, MAX_CONFIDENCE};
