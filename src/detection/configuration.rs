//! Configuration management
//!
//! [`ConfigurationManager`] is the single writer for the global threshold,
//! the detection order, the language allow-list and per-detector payloads.
//! It borrows the orchestrator mutably, so no detection can run while a
//! configuration change is in flight.
//!
//! Settings travel as [`DetectionSettings`], where every field is optional
//! and absent fields are left untouched. Bulk application is atomic: if
//! any part fails, the previous settings are restored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

use super::detector::threshold_to_external;
use super::orchestrator::DetectionOrchestrator;
use super::types::{DetectorInfo, MAX_CONFIDENCE};
use crate::config::ConfigError;

const LOW_THRESHOLD_WARNING: u8 = 10;
const HIGH_THRESHOLD_WARNING: u8 = 90;

/// Persistable detection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_order: Option<Vec<String>>,

    /// Allow-list pushed to every detector with a language filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_languages: Option<Vec<String>>,

    /// Per-detector thresholds on the 0–100 scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector_thresholds: Option<BTreeMap<String, u8>>,

    /// Opaque payloads keyed by detector name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detectors: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Blocking problems
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSummary {
    pub confidence_threshold: u8,
    pub detection_order: Vec<String>,
    pub total_detectors: usize,
    pub enabled_detectors: usize,
    pub supported_languages: usize,
    pub detectors: Vec<DetectorInfo>,
}

impl fmt::Display for ConfigurationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detection Configuration:")?;
        writeln!(f, "  Confidence Threshold: {}", self.confidence_threshold)?;
        writeln!(
            f,
            "  Detectors: {} enabled of {} registered",
            self.enabled_detectors, self.total_detectors
        )?;
        writeln!(f, "  Detection Order: {}", self.detection_order.join(" -> "))?;
        writeln!(f, "  Supported Languages: {}", self.supported_languages)?;
        for detector in &self.detectors {
            let state = match detector.position {
                Some(position) => format!("#{}", position + 1),
                None => "disabled".to_string(),
            };
            writeln!(
                f,
                "    - {} ({}) [{}] threshold {}{}",
                detector.name,
                detector.display_name,
                state,
                detector.threshold,
                if detector.configurable { ", configurable" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// Result of importing serialized settings. Never an error: failures are
/// reported through `success` and `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    fn failure(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            warnings: Vec::new(),
        }
    }
}

pub struct ConfigurationManager<'a> {
    orchestrator: &'a mut DetectionOrchestrator,
}

impl<'a> ConfigurationManager<'a> {
    pub fn new(orchestrator: &'a mut DetectionOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Fully populated snapshot of the live settings.
    pub fn current(&self) -> DetectionSettings {
        snapshot(&*self.orchestrator)
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&*self.orchestrator)
    }

    pub fn summary(&self) -> ConfigurationSummary {
        summarize(&*self.orchestrator)
    }

    /// Applies `settings` atomically: on any failure the previous settings
    /// are restored and the error returned.
    pub fn apply(&mut self, settings: &DetectionSettings) -> Result<(), ConfigError> {
        self.check(settings)?;

        let previous = self.current();
        if let Err(e) = self.apply_unchecked(settings) {
            warn!(error = %e, "Configuration change failed, restoring previous settings");
            if let Err(restore) = self.apply_unchecked(&previous) {
                warn!(error = %restore, "Failed to restore previous settings");
            }
            return Err(e);
        }

        debug!("Applied detection settings");
        Ok(())
    }

    pub fn set_detector_configuration(
        &mut self,
        name: &str,
        payload: Value,
    ) -> Result<(), ConfigError> {
        let detector = self
            .orchestrator
            .detector_mut(name)
            .ok_or_else(|| ConfigError::UnknownDetector(name.to_string()))?;
        let configurable = detector
            .as_configurable_mut()
            .ok_or_else(|| ConfigError::NotConfigurable(name.to_string()))?;

        configurable
            .set_configuration(payload)
            .map_err(|source| ConfigError::DetectorRejected {
                name: name.to_string(),
                source,
            })?;

        debug!(detector = %name, "Updated detector configuration");
        Ok(())
    }

    pub fn detector_configuration(&self, name: &str) -> Result<Value, ConfigError> {
        let detector = self
            .orchestrator
            .registry()
            .lookup(name)
            .ok_or_else(|| ConfigError::UnknownDetector(name.to_string()))?;

        detector
            .as_configurable()
            .map(|c| c.get_configuration())
            .ok_or_else(|| ConfigError::NotConfigurable(name.to_string()))
    }

    pub fn export_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(&self.current())
            .map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    pub fn export_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.current()).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    pub fn import_json(&mut self, content: &str) -> ImportOutcome {
        match serde_json::from_str::<DetectionSettings>(content) {
            Ok(settings) => self.import(&settings),
            Err(e) => ImportOutcome::failure(vec![format!("Invalid settings JSON: {}", e)]),
        }
    }

    pub fn import_yaml(&mut self, content: &str) -> ImportOutcome {
        match serde_yaml::from_str::<DetectionSettings>(content) {
            Ok(settings) => self.import(&settings),
            Err(e) => ImportOutcome::failure(vec![format!("Invalid settings YAML: {}", e)]),
        }
    }

    /// Applies, revalidates, and rolls back when the result is invalid.
    ///
    /// Entries for detectors that are not registered are skipped with a
    /// warning, so saved settings survive a detector that failed to load.
    fn import(&mut self, settings: &DetectionSettings) -> ImportOutcome {
        let previous = self.current();
        let (settings, mut warnings) = self.without_unregistered(settings);

        if let Err(e) = self.apply(&settings) {
            return ImportOutcome {
                success: false,
                errors: vec![e.to_string()],
                warnings,
            };
        }

        let report = self.validate();
        warnings.extend(report.warnings);
        if !report.is_valid {
            warn!(issues = report.issues.len(), "Imported settings are invalid, rolling back");
            if let Err(e) = self.apply_unchecked(&previous) {
                warn!(error = %e, "Failed to restore previous settings");
            }
            return ImportOutcome {
                success: false,
                errors: report.issues,
                warnings,
            };
        }

        ImportOutcome {
            success: true,
            errors: Vec::new(),
            warnings,
        }
    }

    /// Copy of `settings` without thresholds or payloads for unregistered
    /// detectors, plus one warning per skipped name.
    fn without_unregistered(&self, settings: &DetectionSettings) -> (DetectionSettings, Vec<String>) {
        let registry = self.orchestrator.registry();
        let mut settings = settings.clone();
        let mut skipped = BTreeSet::new();

        if let Some(thresholds) = settings.detector_thresholds.as_mut() {
            thresholds.retain(|name, _| {
                let known = registry.contains(name);
                if !known {
                    skipped.insert(name.clone());
                }
                known
            });
        }
        if let Some(payloads) = settings.detectors.as_mut() {
            payloads.retain(|name, _| {
                let known = registry.contains(name);
                if !known {
                    skipped.insert(name.clone());
                }
                known
            });
        }

        let warnings = skipped
            .into_iter()
            .map(|name| {
                debug!(detector = %name, "Skipping settings for unregistered detector");
                format!("Ignored settings for unregistered detector '{}'", name)
            })
            .collect();
        (settings, warnings)
    }

    /// Range and name checks that need no mutation.
    fn check(&self, settings: &DetectionSettings) -> Result<(), ConfigError> {
        if let Some(threshold) = settings.confidence_threshold {
            check_range("confidence_threshold", threshold)?;
        }

        let registry = self.orchestrator.registry();

        if let Some(thresholds) = &settings.detector_thresholds {
            for (name, threshold) in thresholds {
                if !registry.contains(name) {
                    return Err(ConfigError::UnknownDetector(name.clone()));
                }
                check_range(&format!("detector_thresholds.{}", name), *threshold)?;
            }
        }

        if let Some(payloads) = &settings.detectors {
            for name in payloads.keys() {
                let detector = registry
                    .lookup(name)
                    .ok_or_else(|| ConfigError::UnknownDetector(name.clone()))?;
                if !detector.is_configurable() {
                    return Err(ConfigError::NotConfigurable(name.clone()));
                }
            }
        }

        Ok(())
    }

    fn apply_unchecked(&mut self, settings: &DetectionSettings) -> Result<(), ConfigError> {
        if let Some(threshold) = settings.confidence_threshold {
            self.orchestrator.set_confidence_threshold(threshold);
        }

        if let Some(thresholds) = &settings.detector_thresholds {
            for (name, threshold) in thresholds {
                if !self.orchestrator.set_detector_threshold(name, *threshold) {
                    return Err(ConfigError::UnknownDetector(name.clone()));
                }
            }
        }

        if let Some(order) = &settings.detection_order {
            self.orchestrator.set_detection_order(order.as_slice());
        }

        if let Some(languages) = &settings.enabled_languages {
            for detector in self.orchestrator.detectors_mut() {
                if let Some(filter) = detector.as_language_filter_mut() {
                    filter.set_enabled_languages(languages.clone());
                }
            }
        }

        if let Some(payloads) = &settings.detectors {
            for (name, payload) in payloads {
                self.set_detector_configuration(name, payload.clone())?;
            }
        }

        Ok(())
    }
}

fn check_range(field: &str, value: u8) -> Result<(), ConfigError> {
    if value > MAX_CONFIDENCE {
        return Err(ConfigError::ParseError {
            field: field.to_string(),
            error: format!("must be between 0 and {}, got {}", MAX_CONFIDENCE, value),
        });
    }
    Ok(())
}

pub(crate) fn snapshot(orchestrator: &DetectionOrchestrator) -> DetectionSettings {
    let registry = orchestrator.registry();
    let detectors = registry.list_all();

    let enabled_languages = detectors
        .iter()
        .find_map(|d| d.as_language_filter())
        .map(|filter| filter.enabled_languages())
        .unwrap_or_default();

    let detector_thresholds = detectors
        .iter()
        .map(|d| (d.name().to_string(), threshold_to_external(d.threshold())))
        .collect();

    let payloads = detectors
        .iter()
        .filter_map(|d| {
            d.as_configurable()
                .map(|c| (d.name().to_string(), c.get_configuration()))
        })
        .collect();

    DetectionSettings {
        confidence_threshold: Some(orchestrator.confidence_threshold()),
        detection_order: Some(registry.order().to_vec()),
        enabled_languages: Some(enabled_languages),
        detector_thresholds: Some(detector_thresholds),
        detectors: Some(payloads),
    }
}

pub(crate) fn validate(orchestrator: &DetectionOrchestrator) -> ValidationReport {
    let registry = orchestrator.registry();
    let mut report = ValidationReport::default();

    let total = registry.len();
    let enabled = registry.order().len();

    if total == 0 {
        report.issues.push("No detectors are registered".to_string());
    } else if enabled == 0 {
        report.issues.push("No detectors are enabled".to_string());
    }
    for name in registry.order() {
        if !registry.contains(name) {
            report.issues.push(format!(
                "Detection order references unregistered detector '{}'",
                name
            ));
        }
    }

    let threshold = orchestrator.confidence_threshold();
    if threshold < LOW_THRESHOLD_WARNING {
        report.warnings.push(format!(
            "Confidence threshold {} is very low; expect false positives",
            threshold
        ));
    } else if threshold > HIGH_THRESHOLD_WARNING {
        report.warnings.push(format!(
            "Confidence threshold {} is very high; most snippets will go undetected",
            threshold
        ));
    }

    for detector in registry.list_in_order() {
        if let Some(filter) = detector.as_language_filter() {
            if filter.enabled_languages().is_empty() {
                report.warnings.push(format!(
                    "Detector '{}' has an empty language allow-list; every language is considered",
                    detector.name()
                ));
            }
        }
    }

    if enabled == 1 {
        report.recommendations.push(
            "Only one detector is enabled; enable another for fallback coverage".to_string(),
        );
    }
    if enabled > 0 && enabled < total {
        report.recommendations.push(format!(
            "{} of {} registered detectors are enabled",
            enabled, total
        ));
    }

    report.is_valid = report.issues.is_empty();
    report
}

pub(crate) fn summarize(orchestrator: &DetectionOrchestrator) -> ConfigurationSummary {
    let registry = orchestrator.registry();
    ConfigurationSummary {
        confidence_threshold: orchestrator.confidence_threshold(),
        detection_order: registry.order().to_vec(),
        total_detectors: registry.len(),
        enabled_detectors: registry.order().len(),
        supported_languages: registry.supported_languages().len(),
        detectors: orchestrator.detector_infos(),
    }
}
