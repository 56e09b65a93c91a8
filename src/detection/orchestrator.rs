//! Detection orchestration
//!
//! The orchestrator runs detectors from the registry under one of three
//! protocols:
//!
//! 1. **Sequential**: try enabled detectors in order, accept the first result
//!    that clears every gate
//! 2. **Exhaustive**: run every registered detector concurrently, rank all
//!    results by confidence
//! 3. **Analytical**: combine both into a [`DetectionAnalysis`]
//!
//! A failing or panicking detector never aborts a protocol; it is logged and
//! counted as "no result".

use futures_util::future::join_all;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

use super::detector::{threshold_to_external, threshold_to_internal, Detector};
use super::registry::DetectorRegistry;
use super::types::{DetectionAnalysis, DetectionResult, DetectorInfo, InputWarning, MAX_CONFIDENCE};

/// Global threshold used until configured otherwise.
pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 30;

/// Trimmed snippets shorter than this are flagged as unreliable.
pub const MIN_RELIABLE_LENGTH: usize = 20;

/// A single-line snippet longer than this is flagged as likely minified.
pub const LONG_LINE_LENGTH: usize = 200;

pub struct DetectionOrchestrator {
    registry: DetectorRegistry,
    confidence_threshold: u8,
}

impl DetectionOrchestrator {
    pub fn new() -> Self {
        Self::with_registry(DetectorRegistry::new())
    }

    pub fn with_registry(registry: DetectorRegistry) -> Self {
        Self {
            registry,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn confidence_threshold(&self) -> u8 {
        self.confidence_threshold
    }

    /// Updates the global gate and pushes the same value to every registered
    /// detector's own threshold.
    pub fn set_confidence_threshold(&mut self, threshold: u8) {
        let threshold = threshold.min(MAX_CONFIDENCE);
        debug!(threshold, "Setting global confidence threshold");
        self.confidence_threshold = threshold;

        let internal = threshold_to_internal(threshold);
        for detector in self.registry.iter_mut() {
            detector.set_threshold(internal);
        }
    }

    /// Overrides one detector's own threshold. Returns `false` when no such
    /// detector is registered.
    pub fn set_detector_threshold(&mut self, name: &str, threshold: u8) -> bool {
        match self.registry.lookup_mut(name) {
            Some(detector) => {
                debug!(detector = %name, threshold, "Setting detector threshold");
                detector.set_threshold(threshold_to_internal(threshold));
                true
            }
            None => false,
        }
    }

    pub fn detector_threshold(&self, name: &str) -> Option<u8> {
        self.registry
            .lookup(name)
            .map(|d| threshold_to_external(d.threshold()))
    }

    pub fn register_detector(&mut self, detector: Box<dyn Detector>) {
        self.registry.register(detector);
    }

    pub fn unregister_detector(&mut self, name: &str) -> bool {
        self.registry.unregister(name).is_some()
    }

    pub fn set_detection_order<S: AsRef<str>>(&mut self, names: &[S]) {
        self.registry.set_order(names);
    }

    pub fn enable_detector(&mut self, name: &str) -> bool {
        self.registry.enable(name)
    }

    pub fn disable_detector(&mut self, name: &str) -> bool {
        self.registry.disable(name)
    }

    pub(crate) fn detector_mut(&mut self, name: &str) -> Option<&mut (dyn Detector + 'static)> {
        self.registry.lookup_mut(name)
    }

    pub(crate) fn detectors_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Detector>> {
        self.registry.iter_mut()
    }

    /// Sequential protocol: the first enabled detector whose result clears
    /// the global threshold, its own threshold, and its language filter.
    pub async fn detect_language(&self, code: &str) -> Option<DetectionResult> {
        if code.trim().is_empty() {
            return None;
        }

        for detector in self.registry.list_in_order() {
            let Some(result) = run_detector(detector, code).await else {
                continue;
            };

            if self.accepts(detector, &result) {
                debug!(
                    detector = %detector.name(),
                    language = %result.language(),
                    confidence = result.confidence(),
                    "Accepted detection"
                );
                return Some(result);
            }

            debug!(
                detector = %detector.name(),
                language = %result.language(),
                confidence = result.confidence(),
                threshold = self.confidence_threshold,
                "Rejected detection"
            );
        }

        None
    }

    /// Exhaustive protocol: every registered detector, regardless of order
    /// or enablement, joined when all settle. No threshold filtering.
    pub async fn detect_with_all_methods(&self, code: &str) -> Vec<DetectionResult> {
        if code.trim().is_empty() {
            return Vec::new();
        }

        let detectors = self.registry.list_all();
        let outcomes = join_all(detectors.iter().map(|d| run_detector(*d, code))).await;

        let mut results: Vec<DetectionResult> = outcomes.into_iter().flatten().collect();
        // Stable: equal confidences keep registration order.
        results.sort_by(|a, b| b.confidence().cmp(&a.confidence()));
        results
    }

    /// Analytical protocol: sequential primary plus an exhaustive breakdown.
    pub async fn analyze(&self, code: &str) -> DetectionAnalysis {
        if code.trim().is_empty() {
            return DetectionAnalysis::empty();
        }

        let primary = self.detect_language(code).await;
        let all = self.detect_with_all_methods(code).await;

        let (accepted, fallback): (Vec<DetectionResult>, Vec<DetectionResult>) = all
            .iter()
            .cloned()
            .partition(|r| r.confidence() >= self.confidence_threshold);

        let mut alternatives = accepted.clone();
        if let Some(primary) = &primary {
            if let Some(index) = alternatives.iter().position(|r| r == primary) {
                alternatives.remove(index);
            }
        }

        DetectionAnalysis {
            consensus_language: consensus_language(&accepted),
            average_confidence: average_confidence(&accepted),
            primary,
            alternatives,
            fallback,
            all,
        }
    }

    /// Advisory checks on a snippet. Never blocks detection.
    pub fn validate_input(code: &str) -> Vec<InputWarning> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return vec![InputWarning::Empty];
        }

        let mut warnings = Vec::new();

        let length = trimmed.chars().count();
        if length < MIN_RELIABLE_LENGTH {
            warnings.push(InputWarning::TooShort { length });
        }

        let tab_indented = code.lines().any(|l| l.starts_with('\t'));
        let space_indented = code.lines().any(|l| l.starts_with(' '));
        if tab_indented && space_indented {
            warnings.push(InputWarning::MixedIndentation);
        }

        let mut lines = trimmed.lines();
        if let (Some(only), None) = (lines.next(), lines.next()) {
            let length = only.chars().count();
            if length > LONG_LINE_LENGTH {
                warnings.push(InputWarning::SingleLongLine { length });
            }
        }

        warnings
    }

    /// One listing row per registered detector, in registration order.
    pub fn detector_infos(&self) -> Vec<DetectorInfo> {
        let order = self.registry.order();
        self.registry
            .list_all()
            .into_iter()
            .map(|d| {
                let position = order.iter().position(|n| n == d.name());
                DetectorInfo {
                    name: d.name().to_string(),
                    display_name: d.display_name().to_string(),
                    description: d.description().to_string(),
                    enabled: position.is_some(),
                    position,
                    configurable: d.is_configurable(),
                    threshold: threshold_to_external(d.threshold()),
                }
            })
            .collect()
    }

    fn accepts(&self, detector: &dyn Detector, result: &DetectionResult) -> bool {
        let own_threshold = threshold_to_external(detector.threshold());
        result.confidence() >= self.confidence_threshold
            && result.confidence() >= own_threshold
            && detector.accepts_language(result.language())
    }
}

impl Default for DetectionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one detector, converting errors and panics into `None`.
async fn run_detector(detector: &dyn Detector, code: &str) -> Option<DetectionResult> {
    match AssertUnwindSafe(detector.detect(code)).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(detector = %detector.name(), error = %e, "Detector failed, skipping");
            None
        }
        Err(_) => {
            error!(detector = %detector.name(), "Detector panicked, skipping");
            None
        }
    }
}

/// Most frequent language among `accepted`. Ties go to the language that
/// appears first, and `accepted` is ranked by confidence.
fn consensus_language(accepted: &[DetectionResult]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for result in accepted {
        *counts.entry(result.language()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for result in accepted {
        let count = counts[result.language()];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((result.language(), count));
        }
    }

    best.map(|(language, _)| language.to_string())
}

fn average_confidence(accepted: &[DetectionResult]) -> f64 {
    if accepted.is_empty() {
        return 0.0;
    }
    let total: u32 = accepted.iter().map(|r| u32::from(r.confidence())).sum();
    let mean = f64::from(total) / accepted.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::detector::DetectorError;
    use async_trait::async_trait;

    enum Behavior {
        Returns(&'static str, u8),
        Nothing,
        Fails,
        Panics,
    }

    struct ScriptedDetector {
        name: &'static str,
        behavior: Behavior,
        threshold: f64,
    }

    impl ScriptedDetector {
        fn boxed(name: &'static str, behavior: Behavior) -> Box<dyn Detector> {
            Box::new(Self {
                name,
                behavior,
                threshold: 0.0,
            })
        }
    }

    #[async_trait]
    impl Detector for ScriptedDetector {
        fn name(&self) -> &str {
            self.name
        }

        fn display_name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "scripted"
        }

        fn supported_languages(&self) -> Vec<String> {
            match self.behavior {
                Behavior::Returns(language, _) => vec![language.to_string()],
                _ => vec![],
            }
        }

        async fn detect(&self, _code: &str) -> Result<Option<DetectionResult>, DetectorError> {
            match self.behavior {
                Behavior::Returns(language, confidence) => {
                    Ok(Some(DetectionResult::new(language, confidence, self.name)))
                }
                Behavior::Nothing => Ok(None),
                Behavior::Fails => Err(DetectorError::Failed("boom".to_string())),
                Behavior::Panics => panic!("detector exploded"),
            }
        }

        fn threshold(&self) -> f64 {
            self.threshold
        }

        fn set_threshold(&mut self, threshold: f64) {
            self.threshold = threshold;
        }
    }

    fn orchestrator(detectors: Vec<Box<dyn Detector>>) -> DetectionOrchestrator {
        let mut orchestrator = DetectionOrchestrator::new();
        for detector in detectors {
            orchestrator.register_detector(detector);
        }
        orchestrator
    }

    #[tokio::test]
    async fn test_sequential_returns_first_accepted() {
        let orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("a", Behavior::Returns("alpha", 20)),
            ScriptedDetector::boxed("b", Behavior::Returns("beta", 60)),
            ScriptedDetector::boxed("c", Behavior::Returns("gamma", 90)),
        ]);

        let result = orchestrator.detect_language("some code").await.unwrap();
        assert_eq!(result.language(), "beta");
        assert_eq!(result.source(), "b");
    }

    #[tokio::test]
    async fn test_sequential_continues_past_failures() {
        let orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("fails", Behavior::Fails),
            ScriptedDetector::boxed("panics", Behavior::Panics),
            ScriptedDetector::boxed("nothing", Behavior::Nothing),
            ScriptedDetector::boxed("ok", Behavior::Returns("alpha", 70)),
        ]);

        let result = orchestrator.detect_language("some code").await.unwrap();
        assert_eq!(result.source(), "ok");
    }

    #[tokio::test]
    async fn test_sequential_skips_disabled_detectors() {
        let mut orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("a", Behavior::Returns("alpha", 80)),
            ScriptedDetector::boxed("b", Behavior::Returns("beta", 80)),
        ]);
        orchestrator.disable_detector("a");

        let result = orchestrator.detect_language("some code").await.unwrap();
        assert_eq!(result.language(), "beta");
    }

    #[tokio::test]
    async fn test_whitespace_input_short_circuits() {
        let orchestrator = orchestrator(vec![ScriptedDetector::boxed(
            "a",
            Behavior::Returns("alpha", 100),
        )]);

        assert!(orchestrator.detect_language("  \n\t ").await.is_none());
        assert!(orchestrator.detect_with_all_methods("").await.is_empty());
        assert_eq!(orchestrator.analyze("\n").await, DetectionAnalysis::empty());
    }

    #[tokio::test]
    async fn test_detector_own_threshold_gates_sequential() {
        let mut orchestrator = orchestrator(vec![ScriptedDetector::boxed(
            "a",
            Behavior::Returns("alpha", 50),
        )]);
        orchestrator.set_confidence_threshold(10);
        assert!(orchestrator.detect_language("code").await.is_some());

        orchestrator.set_detector_threshold("a", 60);
        assert!(orchestrator.detect_language("code").await.is_none());
    }

    #[tokio::test]
    async fn test_exhaustive_ranks_by_confidence() {
        let orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("a", Behavior::Returns("alpha", 90)),
            ScriptedDetector::boxed("b", Behavior::Returns("beta", 40)),
            ScriptedDetector::boxed("c", Behavior::Returns("gamma", 70)),
            ScriptedDetector::boxed("d", Behavior::Fails),
        ]);

        let confidences: Vec<u8> = orchestrator
            .detect_with_all_methods("code")
            .await
            .iter()
            .map(|r| r.confidence())
            .collect();
        assert_eq!(confidences, vec![90, 70, 40]);
    }

    #[tokio::test]
    async fn test_exhaustive_ignores_enablement() {
        let mut orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("a", Behavior::Returns("alpha", 10)),
            ScriptedDetector::boxed("b", Behavior::Returns("beta", 20)),
        ]);
        orchestrator.set_detection_order::<&str>(&[]);

        assert_eq!(orchestrator.detect_with_all_methods("code").await.len(), 2);
    }

    #[test]
    fn test_set_threshold_pushes_to_detectors() {
        let mut orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("a", Behavior::Nothing),
            ScriptedDetector::boxed("b", Behavior::Nothing),
        ]);
        orchestrator.set_confidence_threshold(45);

        assert_eq!(orchestrator.confidence_threshold(), 45);
        assert_eq!(orchestrator.detector_threshold("a"), Some(45));
        assert_eq!(orchestrator.detector_threshold("b"), Some(45));

        orchestrator.set_detector_threshold("b", 80);
        assert_eq!(orchestrator.detector_threshold("a"), Some(45));
        assert_eq!(orchestrator.detector_threshold("b"), Some(80));
        assert!(!orchestrator.set_detector_threshold("missing", 10));
    }

    #[test]
    fn test_consensus_picks_most_frequent() {
        let accepted = vec![
            DetectionResult::new("beta", 95, "x"),
            DetectionResult::new("alpha", 80, "y"),
            DetectionResult::new("alpha", 60, "z"),
        ];
        assert_eq!(consensus_language(&accepted), Some("alpha".to_string()));
    }

    #[test]
    fn test_consensus_tie_goes_to_highest_ranked() {
        let accepted = vec![
            DetectionResult::new("beta", 95, "x"),
            DetectionResult::new("alpha", 80, "y"),
        ];
        assert_eq!(consensus_language(&accepted), Some("beta".to_string()));
        assert_eq!(consensus_language(&[]), None);
    }

    #[test]
    fn test_average_confidence() {
        let accepted = vec![
            DetectionResult::new("a", 90, "x"),
            DetectionResult::new("b", 70, "y"),
            DetectionResult::new("c", 41, "z"),
        ];
        assert_eq!(average_confidence(&accepted), 67.0);
        assert_eq!(average_confidence(&[]), 0.0);
    }

    #[test]
    fn test_validate_input_flags() {
        assert_eq!(
            DetectionOrchestrator::validate_input("   "),
            vec![InputWarning::Empty]
        );
        assert_eq!(
            DetectionOrchestrator::validate_input("x = 1"),
            vec![InputWarning::TooShort { length: 5 }]
        );

        let mixed = "fn main() {\n\tlet a = 1;\n    let b = 2;\n}";
        assert!(DetectionOrchestrator::validate_input(mixed).contains(&InputWarning::MixedIndentation));

        let long_line = "a".repeat(LONG_LINE_LENGTH + 1);
        assert_eq!(
            DetectionOrchestrator::validate_input(&long_line),
            vec![InputWarning::SingleLongLine {
                length: LONG_LINE_LENGTH + 1
            }]
        );
    }

    #[test]
    fn test_detector_infos_reflect_order() {
        let mut orchestrator = orchestrator(vec![
            ScriptedDetector::boxed("a", Behavior::Nothing),
            ScriptedDetector::boxed("b", Behavior::Nothing),
        ]);
        orchestrator.set_detection_order(&["b"]);

        let infos = orchestrator.detector_infos();
        assert_eq!(infos.len(), 2);
        assert!(!infos[0].enabled);
        assert_eq!(infos[0].position, None);
        assert!(infos[1].enabled);
        assert_eq!(infos[1].position, Some(0));
        assert!(!infos[1].configurable);
    }
}
