//! Orchestrator behavior across the three detection protocols

mod support;

use langtag::detection::{DetectionOrchestrator, DetectionService};
use langtag::detectors::PatternDetector;
use langtag::languages::{LanguageCatalog, LanguagePatternDefinition};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use support::{MockDetector, MockResponse};
use yare::parameterized;

fn orchestrator(detectors: Vec<MockDetector>) -> DetectionOrchestrator {
    let mut orchestrator = DetectionOrchestrator::new();
    for detector in detectors {
        orchestrator.register_detector(detector.boxed());
    }
    orchestrator
}

#[parameterized(
    empty = { "" },
    spaces = { "    " },
    newlines = { "\n\n" },
    mixed = { " \t\r\n " },
)]
fn test_blank_input_never_detected(code: &str) {
    let detector = MockDetector::returning("always", "alpha", 100);
    let calls = detector.call_counter();
    let mut orchestrator = orchestrator(vec![detector]);
    orchestrator.set_confidence_threshold(0);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    assert!(runtime.block_on(orchestrator.detect_language(code)).is_none());
    assert!(runtime
        .block_on(orchestrator.detect_with_all_methods(code))
        .is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[parameterized(
    below_global = { 29, 30, 0, false },
    at_global = { 30, 30, 0, true },
    below_own = { 50, 30, 60, false },
    above_both = { 70, 30, 60, true },
)]
fn test_effective_threshold_gates_sequential(
    confidence: u8,
    global: u8,
    own: u8,
    accepted: bool,
) {
    let mut orchestrator = orchestrator(vec![MockDetector::new("d")
        .with_fallback(MockResponse::Detect("alpha", confidence))]);
    orchestrator.set_confidence_threshold(global);
    orchestrator.set_detector_threshold("d", own);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let result = runtime.block_on(orchestrator.detect_language("code"));
    assert_eq!(result.is_some(), accepted);
}

#[tokio::test]
async fn test_sequential_stops_at_first_accepted() {
    let first = MockDetector::returning("first", "alpha", 80);
    let second = MockDetector::returning("second", "beta", 90);
    let second_calls = second.call_counter();
    let orchestrator = orchestrator(vec![first, second]);

    let result = orchestrator.detect_language("code").await.unwrap();
    assert_eq!(result.language(), "alpha");
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_and_panics_do_not_abort_sequential() {
    let orchestrator = orchestrator(vec![
        MockDetector::failing("broken"),
        MockDetector::panicking("explodes"),
        MockDetector::returning("steady", "gamma", 75),
    ]);

    let result = orchestrator.detect_language("code").await.unwrap();
    assert_eq!(result.source(), "steady");
}

#[tokio::test]
async fn test_language_filter_rejects_result() {
    let orchestrator = orchestrator(vec![
        MockDetector::returning("filtered", "alpha", 90).with_language_filter(&["beta"]),
        MockDetector::returning("open", "alpha", 40),
    ]);

    let result = orchestrator.detect_language("code").await.unwrap();
    assert_eq!(result.source(), "open");
}

#[tokio::test]
async fn test_empty_language_filter_allows_everything() {
    let orchestrator = orchestrator(vec![
        MockDetector::returning("filtered", "alpha", 90).with_language_filter(&[])
    ]);

    let result = orchestrator.detect_language("code").await.unwrap();
    assert_eq!(result.language(), "alpha");
}

#[tokio::test]
async fn test_sequential_is_idempotent() {
    let catalog = LanguageCatalog::builtin().unwrap();
    let service = DetectionService::with_defaults(catalog);
    let code = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n";

    let first = service.detect_language(code).await;
    for _ in 0..5 {
        assert_eq!(service.detect_language(code).await, first);
    }
    assert_eq!(first.unwrap().language(), "go");
}

#[parameterized(
    ascending = { [40, 70, 90] },
    descending = { [90, 70, 40] },
    mixed = { [90, 40, 70] },
)]
fn test_exhaustive_ranking_ignores_registration_order(confidences: [u8; 3]) {
    let orchestrator = orchestrator(
        confidences
            .iter()
            .enumerate()
            .map(|(i, c)| MockDetector::returning(&format!("d{}", i), "alpha", *c))
            .collect(),
    );

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ranked: Vec<u8> = runtime
        .block_on(orchestrator.detect_with_all_methods("code"))
        .iter()
        .map(|r| r.confidence())
        .collect();
    assert_eq!(ranked, vec![90, 70, 40]);
}

#[tokio::test]
async fn test_exhaustive_runs_disabled_and_survives_failures() {
    let mut orchestrator = orchestrator(vec![
        MockDetector::returning("disabled", "alpha", 10),
        MockDetector::failing("broken"),
        MockDetector::panicking("explodes"),
        MockDetector::new("silent"),
        MockDetector::returning("enabled", "beta", 55),
    ]);
    orchestrator.disable_detector("disabled");

    let results = orchestrator.detect_with_all_methods("code").await;
    let sources: Vec<&str> = results.iter().map(|r| r.source()).collect();
    assert_eq!(sources, vec!["enabled", "disabled"]);
}

#[tokio::test]
async fn test_exhaustive_awaits_detectors_concurrently() {
    let orchestrator = orchestrator(
        (0..4)
            .map(|i| {
                MockDetector::returning(&format!("slow{}", i), "alpha", 50)
                    .with_delay(Duration::from_millis(200))
            })
            .collect(),
    );

    let started = Instant::now();
    let results = orchestrator.detect_with_all_methods("code").await;
    assert_eq!(results.len(), 4);
    assert!(started.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_analysis_consensus_and_partition() {
    let orchestrator = orchestrator(vec![
        MockDetector::returning("a", "beta", 95),
        MockDetector::returning("b", "alpha", 80),
        MockDetector::returning("c", "alpha", 60),
        MockDetector::returning("d", "gamma", 20),
    ]);

    let analysis = orchestrator.analyze("code").await;

    let primary = analysis.primary.unwrap();
    assert_eq!(primary.source(), "a");
    assert_eq!(analysis.consensus_language.as_deref(), Some("alpha"));
    assert_eq!(analysis.alternatives.len(), 2);
    assert!(analysis.alternatives.iter().all(|r| r.source() != "a"));
    assert_eq!(analysis.fallback.len(), 1);
    assert_eq!(analysis.fallback[0].language(), "gamma");
    assert_eq!(analysis.all.len(), 4);
    assert_eq!(analysis.average_confidence, 78.33);
}

#[tokio::test]
async fn test_analysis_with_nothing_accepted() {
    let orchestrator = orchestrator(vec![MockDetector::returning("a", "alpha", 5)]);

    let analysis = orchestrator.analyze("code").await;
    assert!(analysis.primary.is_none());
    assert!(analysis.consensus_language.is_none());
    assert_eq!(analysis.average_confidence, 0.0);
    assert_eq!(analysis.fallback.len(), 1);
}

#[parameterized(
    unknown_dropped = { &["x", "nonexistent", "y"], &["x", "y"] },
    duplicates_dropped = { &["y", "x", "y"], &["y", "x"] },
    empty = { &[], &[] },
)]
fn test_set_order_keeps_registry_invariant(requested: &[&str], expected: &[&str]) {
    let mut orchestrator = orchestrator(vec![MockDetector::new("x"), MockDetector::new("y")]);
    orchestrator.set_detection_order(requested);

    assert_eq!(orchestrator.registry().order(), expected);
    for name in orchestrator.registry().order() {
        assert!(orchestrator.registry().contains(name));
    }
}

#[test]
fn test_registry_invariant_after_mutation_sequence() {
    let mut orchestrator = orchestrator(vec![
        MockDetector::new("a"),
        MockDetector::new("b"),
        MockDetector::new("c"),
    ]);

    orchestrator.set_detection_order(&["c", "a"]);
    orchestrator.unregister_detector("a");
    orchestrator.register_detector(MockDetector::new("d").boxed());
    orchestrator.enable_detector("b");
    orchestrator.unregister_detector("c");
    orchestrator.register_detector(MockDetector::new("a").boxed());

    let registry = orchestrator.registry();
    assert_eq!(registry.order(), ["d", "b", "a"]);
    assert!(registry.is_valid());
    for name in registry.order() {
        assert!(registry.contains(name));
    }
}

#[test]
fn test_late_registration_keeps_own_threshold() {
    let mut orchestrator = orchestrator(vec![MockDetector::new("early")]);
    orchestrator.set_confidence_threshold(70);
    orchestrator.register_detector(MockDetector::new("late").boxed());

    assert_eq!(orchestrator.detector_threshold("early"), Some(70));
    assert_eq!(orchestrator.detector_threshold("late"), Some(0));
}

#[tokio::test]
async fn test_pattern_detector_example_through_orchestrator() {
    let definition = LanguagePatternDefinition::new("alpha").with_keywords(["foo", "bar"]);
    let mut orchestrator = DetectionOrchestrator::new();
    orchestrator.register_detector(Box::new(PatternDetector::new(vec![definition])));

    orchestrator.set_confidence_threshold(30);
    let result = orchestrator.detect_language("foo bar foo").await.unwrap();
    assert_eq!(result.language(), "alpha");
    assert_eq!(result.confidence(), 40);

    orchestrator.set_confidence_threshold(50);
    assert!(orchestrator.detect_language("foo bar foo").await.is_none());
}

#[tokio::test]
async fn test_exhaustive_keeps_zero_confidence_results() {
    let definition = LanguagePatternDefinition::new("alpha").with_keywords(["foo"]);
    let mut orchestrator = DetectionOrchestrator::new();
    orchestrator.register_detector(Box::new(PatternDetector::new(vec![definition])));
    orchestrator.set_confidence_threshold(0);

    let results = orchestrator.detect_with_all_methods("qux").await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].language(), "alpha");
    assert_eq!(results[0].confidence(), 0);
}
