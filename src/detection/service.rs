//! Detection service
//!
//! `DetectionService` is the surface collaborators use. It owns the
//! orchestrator and exposes:
//!
//! 1. Startup composition (`register_detector` / `unregister_detector`)
//! 2. Per-snippet detection (`detect_language`, `detect_with_all_methods`,
//!    `analyze`)
//! 3. Settings persistence as opaque structured data (`get_configuration` /
//!    `set_configuration`)
//! 4. Listings for configuration UIs (`get_registered_detectors` /
//!    `get_detection_order`)
//!
//! # Example
//!
//! ```no_run
//! use langtag::detection::DetectionService;
//! use langtag::languages::LanguageCatalog;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DetectionService::with_defaults(LanguageCatalog::builtin()?);
//!
//! if let Some(result) = service.detect_language("fn main() { println!(\"hi\"); }").await {
//!     println!("{} ({}%)", result.language(), result.confidence());
//! }
//! # Ok(())
//! # }
//! ```

use tracing::debug;

use super::configuration::{self, ConfigurationManager, DetectionSettings};
use super::detector::Detector;
use super::orchestrator::DetectionOrchestrator;
use super::types::{DetectionAnalysis, DetectionResult, DetectorInfo, InputWarning};
use crate::config::ConfigError;
use crate::detectors::{PatternDetector, ShebangDetector};
use crate::languages::LanguageCatalog;

#[derive(Default)]
pub struct DetectionService {
    orchestrator: DetectionOrchestrator,
}

impl DetectionService {
    /// An empty service; nothing is detected until detectors are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in detectors: shebang first, then pattern scoring
    /// over `catalog`.
    pub fn with_defaults(catalog: LanguageCatalog) -> Self {
        let mut service = Self::new();
        service.register_detector(Box::new(ShebangDetector::new()));
        service.register_detector(Box::new(PatternDetector::new(catalog.into_definitions())));

        debug!(
            detectors = service.orchestrator.registry().len(),
            "Detection service ready"
        );
        service
    }

    pub fn register_detector(&mut self, detector: Box<dyn Detector>) {
        self.orchestrator.register_detector(detector);
    }

    pub fn unregister_detector(&mut self, name: &str) -> bool {
        self.orchestrator.unregister_detector(name)
    }

    pub async fn detect_language(&self, code: &str) -> Option<DetectionResult> {
        self.orchestrator.detect_language(code).await
    }

    pub async fn detect_with_all_methods(&self, code: &str) -> Vec<DetectionResult> {
        self.orchestrator.detect_with_all_methods(code).await
    }

    pub async fn analyze(&self, code: &str) -> DetectionAnalysis {
        self.orchestrator.analyze(code).await
    }

    pub fn validate_input(&self, code: &str) -> Vec<InputWarning> {
        DetectionOrchestrator::validate_input(code)
    }

    pub fn get_configuration(&self) -> DetectionSettings {
        configuration::snapshot(&self.orchestrator)
    }

    pub fn set_configuration(&mut self, settings: DetectionSettings) -> Result<(), ConfigError> {
        self.configuration().apply(&settings)
    }

    pub fn get_registered_detectors(&self) -> Vec<DetectorInfo> {
        self.orchestrator.detector_infos()
    }

    pub fn get_detection_order(&self) -> Vec<String> {
        self.orchestrator.registry().order().to_vec()
    }

    /// Every language some registered detector can report.
    pub fn supported_languages(&self) -> Vec<String> {
        self.orchestrator.registry().supported_languages()
    }

    /// Writer view over thresholds, order, allow-lists and payloads.
    pub fn configuration(&mut self) -> ConfigurationManager<'_> {
        ConfigurationManager::new(&mut self.orchestrator)
    }

    pub fn orchestrator(&self) -> &DetectionOrchestrator {
        &self.orchestrator
    }
}
