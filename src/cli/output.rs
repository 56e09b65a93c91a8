//! Output formatting for multiple formats
//!
//! JSON and YAML serialize the library types directly; the human format is
//! laid out here.
//!
//! # Example
//!
//! ```
//! use langtag::cli::output::{OutputFormat, OutputFormatter};
//! use langtag::detection::DetectionResult;
//!
//! let result = DetectionResult::new("rust", 87, "pattern");
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_result(Some(&result)).unwrap();
//! assert!(output.contains("\"language\": \"rust\""));
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::config::LangtagConfig;
use crate::detection::{
    ConfigurationSummary, DetectionAnalysis, DetectionResult, ValidationReport,
};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Everything `langtag config` reports
#[derive(Debug, Serialize)]
pub struct ConfigReport<'a> {
    pub environment: std::collections::BTreeMap<String, String>,
    pub summary: &'a ConfigurationSummary,
    pub validation: &'a ValidationReport,
}

impl<'a> ConfigReport<'a> {
    pub fn new(
        config: &LangtagConfig,
        summary: &'a ConfigurationSummary,
        validation: &'a ValidationReport,
    ) -> Self {
        Self {
            environment: config.to_display_map(),
            summary,
            validation,
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Sequential result; `None` renders as `null` or "No language detected".
    pub fn format_result(&self, result: Option<&DetectionResult>) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(match result {
                Some(result) => format!(
                    "{} (confidence {}%, via {})",
                    result.language(),
                    result.confidence(),
                    result.source()
                ),
                None => "No language detected".to_string(),
            }),
            _ => self.serialize(&result, "detection result"),
        }
    }

    /// Exhaustive results, already ranked.
    pub fn format_results(&self, results: &[DetectionResult]) -> Result<String> {
        match self.format {
            OutputFormat::Human => {
                if results.is_empty() {
                    return Ok("No detector produced a result".to_string());
                }
                let mut out = String::new();
                for (rank, result) in results.iter().enumerate() {
                    writeln!(
                        out,
                        "{:>2}. {:<12} {:>3}%  ({})",
                        rank + 1,
                        result.language(),
                        result.confidence(),
                        result.source()
                    )?;
                }
                Ok(out.trim_end().to_string())
            }
            _ => self.serialize(&results, "detection results"),
        }
    }

    pub fn format_analysis(&self, analysis: &DetectionAnalysis) -> Result<String> {
        match self.format {
            OutputFormat::Human => self.format_analysis_human(analysis),
            _ => self.serialize(analysis, "detection analysis"),
        }
    }

    pub fn format_languages(&self, languages: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(languages.join("\n")),
            _ => self.serialize(&languages, "language list"),
        }
    }

    pub fn format_config(&self, report: &ConfigReport<'_>) -> Result<String> {
        match self.format {
            OutputFormat::Human => self.format_config_human(report),
            _ => self.serialize(report, "configuration report"),
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)
                .with_context(|| format!("Failed to serialize {} to YAML", what)),
            _ => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
        }
    }

    fn format_analysis_human(&self, analysis: &DetectionAnalysis) -> Result<String> {
        let mut out = String::new();

        match &analysis.primary {
            Some(primary) => writeln!(
                out,
                "Primary: {} ({}%, via {})",
                primary.language(),
                primary.confidence(),
                primary.source()
            )?,
            None => writeln!(out, "Primary: none")?,
        }
        if let Some(consensus) = &analysis.consensus_language {
            writeln!(out, "Consensus: {}", consensus)?;
        }
        writeln!(out, "Average confidence: {:.2}", analysis.average_confidence)?;

        if !analysis.alternatives.is_empty() {
            writeln!(out, "Alternatives:")?;
            for result in &analysis.alternatives {
                writeln!(out, "  - {}", result)?;
            }
        }
        if !analysis.fallback.is_empty() {
            writeln!(out, "Below threshold:")?;
            for result in &analysis.fallback {
                writeln!(out, "  - {}", result)?;
            }
        }

        Ok(out.trim_end().to_string())
    }

    fn format_config_human(&self, report: &ConfigReport<'_>) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "Environment:")?;
        for (key, value) in &report.environment {
            writeln!(out, "  {}: {}", key, value)?;
        }
        writeln!(out)?;
        write!(out, "{}", report.summary)?;
        writeln!(out)?;

        let validation = report.validation;
        writeln!(
            out,
            "Validation: {}",
            if validation.is_valid { "ok" } else { "FAILED" }
        )?;
        for issue in &validation.issues {
            writeln!(out, "  error: {}", issue)?;
        }
        for warning in &validation.warnings {
            writeln!(out, "  warning: {}", warning)?;
        }
        for recommendation in &validation.recommendations {
            writeln!(out, "  hint: {}", recommendation)?;
        }

        Ok(out.trim_end().to_string())
    }
}
