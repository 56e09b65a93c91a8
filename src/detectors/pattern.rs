//! Pattern-scoring detector
//!
//! Scores code against every enabled [`LanguagePatternDefinition`] using
//! lexical evidence only. Each definition yields five sub-scores on the
//! 0–100 scale, combined with fixed weights:
//!
//! | factor   | weight | rule                                              |
//! |----------|--------|---------------------------------------------------|
//! | keywords | 40%    | matches / min(len, 10)                            |
//! | patterns | 30%    | matched / evaluated, first 8 regexes              |
//! | imports  | 15%    | matches / len                                     |
//! | builtins | 10%    | matches / min(len, 15)                            |
//! | comments | 5%     | line and block checks, averaged over configured   |
//!
//! Definitions are iterated alphabetically and ranked with a stable sort, so
//! equal scores resolve to the alphabetically first language.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::detection::detector::{
    clamp_threshold, threshold_to_external, threshold_to_internal, ConfigurableDetector, Detector,
    DetectorError, LanguageFilter,
};
use crate::detection::types::{DetectionResult, MAX_CONFIDENCE};
use crate::languages::{CommentStyle, LanguagePatternDefinition};

pub const PATTERN_DETECTOR_NAME: &str = "pattern";

const KEYWORD_WEIGHT: f64 = 0.40;
const PATTERN_WEIGHT: f64 = 0.30;
const IMPORT_WEIGHT: f64 = 0.15;
const BUILTIN_WEIGHT: f64 = 0.10;
const COMMENT_WEIGHT: f64 = 0.05;

const KEYWORD_CAP: usize = 10;
const BUILTIN_CAP: usize = 15;
const MAX_PATTERNS: usize = 8;

const DEFAULT_THRESHOLD: f64 = 0.3;

/// Per-language score breakdown, every field on the 0–100 scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageScore {
    pub language: String,
    pub keywords: f64,
    pub patterns: f64,
    pub imports: f64,
    pub builtins: f64,
    pub comments: f64,
    pub total: f64,
}

/// Opaque configuration payload of the pattern detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDetectorConfig {
    #[serde(default)]
    pub enabled_languages: Option<Vec<String>>,
    /// Own threshold on the 0–100 scale
    #[serde(default)]
    pub threshold: Option<u8>,
}

struct CompiledDefinition {
    definition: LanguagePatternDefinition,
    patterns: Vec<Regex>,
}

impl CompiledDefinition {
    fn compile(definition: LanguagePatternDefinition) -> Self {
        let patterns = definition
            .patterns
            .iter()
            .take(MAX_PATTERNS)
            .filter_map(|pattern| match Regex::new(&format!("(?m){}", pattern)) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(
                        language = %definition.name,
                        pattern = %pattern,
                        error = %e,
                        "Skipping invalid language pattern"
                    );
                    None
                }
            })
            .collect();

        Self {
            definition,
            patterns,
        }
    }
}

pub struct PatternDetector {
    definitions: Vec<CompiledDefinition>,
    enabled_languages: Vec<String>,
    threshold: f64,
}

impl PatternDetector {
    /// Builds the detector from an externally supplied catalog. Definitions
    /// are compiled once and kept read-only.
    pub fn new(definitions: Vec<LanguagePatternDefinition>) -> Self {
        let mut definitions: Vec<CompiledDefinition> =
            definitions.into_iter().map(CompiledDefinition::compile).collect();
        definitions.sort_by(|a, b| a.definition.name.cmp(&b.definition.name));

        debug!(count = definitions.len(), "Loaded language pattern definitions");

        Self {
            definitions,
            enabled_languages: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = clamp_threshold(threshold);
        self
    }

    pub fn with_enabled_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_enabled_languages(languages.into_iter().map(Into::into).collect());
        self
    }

    /// Scores every enabled definition, ranked by total descending.
    pub fn score(&self, code: &str) -> Vec<LanguageScore> {
        let tokens = identifier_tokens(code);

        let mut scores: Vec<LanguageScore> = self
            .definitions
            .iter()
            .filter(|compiled| self.is_language_enabled(&compiled.definition.name))
            .map(|compiled| score_definition(compiled, code, &tokens))
            .collect();

        // Stable: equal totals stay in alphabetical order.
        scores.sort_by(|a, b| b.total.total_cmp(&a.total));
        scores
    }
}

#[async_trait]
impl Detector for PatternDetector {
    fn name(&self) -> &str {
        PATTERN_DETECTOR_NAME
    }

    fn display_name(&self) -> &str {
        "Pattern Matching"
    }

    fn description(&self) -> &str {
        "Weighted keyword, regex, import, builtin and comment scoring against language definitions"
    }

    fn supported_languages(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|c| c.definition.name.clone())
            .collect()
    }

    async fn detect(&self, code: &str) -> Result<Option<DetectionResult>, DetectorError> {
        if code.trim().is_empty() {
            return Ok(None);
        }

        let Some(best) = self.score(code).into_iter().next() else {
            return Ok(None);
        };

        let result = DetectionResult::from_score(&best.language, best.total, PATTERN_DETECTOR_NAME);
        let threshold = threshold_to_external(self.threshold);

        if result.confidence() < threshold {
            debug!(
                language = %best.language,
                confidence = result.confidence(),
                threshold,
                "Best pattern score below threshold"
            );
            return Ok(None);
        }

        Ok(Some(result))
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn set_threshold(&mut self, threshold: f64) {
        self.threshold = clamp_threshold(threshold);
    }

    fn as_configurable(&self) -> Option<&dyn ConfigurableDetector> {
        Some(self)
    }

    fn as_configurable_mut(&mut self) -> Option<&mut dyn ConfigurableDetector> {
        Some(self)
    }

    fn as_language_filter(&self) -> Option<&dyn LanguageFilter> {
        Some(self)
    }

    fn as_language_filter_mut(&mut self) -> Option<&mut dyn LanguageFilter> {
        Some(self)
    }
}

impl LanguageFilter for PatternDetector {
    fn enabled_languages(&self) -> Vec<String> {
        self.enabled_languages.clone()
    }

    fn set_enabled_languages(&mut self, languages: Vec<String>) {
        let languages: BTreeSet<String> = languages.into_iter().collect();
        for language in &languages {
            if !self.definitions.iter().any(|c| &c.definition.name == language) {
                debug!(language = %language, "Enabled language has no pattern definition");
            }
        }
        self.enabled_languages = languages.into_iter().collect();
    }

    fn is_language_enabled(&self, language: &str) -> bool {
        self.enabled_languages.is_empty() || self.enabled_languages.iter().any(|l| l == language)
    }
}

impl ConfigurableDetector for PatternDetector {
    fn get_configuration(&self) -> Value {
        let config = PatternDetectorConfig {
            enabled_languages: Some(self.enabled_languages.clone()),
            threshold: Some(threshold_to_external(self.threshold)),
        };
        serde_json::to_value(config).unwrap_or(Value::Null)
    }

    fn set_configuration(&mut self, payload: Value) -> Result<(), DetectorError> {
        let config: PatternDetectorConfig = serde_json::from_value(payload)
            .map_err(|e| DetectorError::InvalidConfiguration(e.to_string()))?;

        if let Some(threshold) = config.threshold {
            if threshold > MAX_CONFIDENCE {
                return Err(DetectorError::InvalidConfiguration(format!(
                    "threshold must be between 0 and 100, got {}",
                    threshold
                )));
            }
        }

        if let Some(languages) = config.enabled_languages {
            self.set_enabled_languages(languages);
        }
        if let Some(threshold) = config.threshold {
            self.threshold = threshold_to_internal(threshold);
        }
        Ok(())
    }
}

fn identifier_tokens(code: &str) -> HashSet<&str> {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = IDENTIFIER_REGEX
        .get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("Invalid identifier regex"));
    re.find_iter(code).map(|m| m.as_str()).collect()
}

fn score_definition(
    compiled: &CompiledDefinition,
    code: &str,
    tokens: &HashSet<&str>,
) -> LanguageScore {
    let definition = &compiled.definition;

    let keywords = list_score(&definition.keywords, tokens, Some(KEYWORD_CAP));
    let patterns = pattern_score(&compiled.patterns, code);
    let imports = list_score(&definition.imports, tokens, None);
    let builtins = list_score(&definition.builtins, tokens, Some(BUILTIN_CAP));
    let comments = comment_score(&definition.comments, code);

    let total = keywords * KEYWORD_WEIGHT
        + patterns * PATTERN_WEIGHT
        + imports * IMPORT_WEIGHT
        + builtins * BUILTIN_WEIGHT
        + comments * COMMENT_WEIGHT;

    LanguageScore {
        language: definition.name.clone(),
        keywords,
        patterns,
        imports,
        builtins,
        comments,
        total,
    }
}

/// `matches / min(len, cap) × 100`, capped at 100. An empty list scores 0.
fn list_score(list: &[String], tokens: &HashSet<&str>, cap: Option<usize>) -> f64 {
    if list.is_empty() {
        return 0.0;
    }

    let matches = list
        .iter()
        .filter(|entry| tokens.contains(entry.as_str()))
        .count();
    let denominator = cap.map_or(list.len(), |cap| list.len().min(cap));

    (matches as f64 / denominator as f64 * 100.0).min(100.0)
}

fn pattern_score(patterns: &[Regex], code: &str) -> f64 {
    if patterns.is_empty() {
        return 0.0;
    }
    let matched = patterns.iter().filter(|re| re.is_match(code)).count();
    matched as f64 / patterns.len() as f64 * 100.0
}

/// Line-token check and block-pair check, each worth 50 points, averaged
/// over the checks the language configures and rescaled to 0–100.
fn comment_score(comments: &CommentStyle, code: &str) -> f64 {
    let mut configured = 0u32;
    let mut earned = 0u32;

    let line_tokens: Vec<&str> = comments
        .line
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    if !line_tokens.is_empty() {
        configured += 1;
        let found = code.lines().any(|line| {
            let line = line.trim_start();
            line_tokens.iter().any(|token| line.starts_with(token))
        });
        if found {
            earned += 1;
        }
    }

    let blocks: Vec<_> = comments
        .block
        .iter()
        .filter(|b| !b.start.is_empty() && !b.end.is_empty())
        .collect();
    if !blocks.is_empty() {
        configured += 1;
        let found = blocks.iter().any(|block| {
            code.find(&block.start)
                .map_or(false, |i| code[i + block.start.len()..].contains(&block.end))
        });
        if found {
            earned += 1;
        }
    }

    if configured == 0 {
        return 0.0;
    }
    f64::from(earned * 50) / f64::from(configured * 50) * 100.0
}
