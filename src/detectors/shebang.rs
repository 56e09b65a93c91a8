//! Interpreter-line detector
//!
//! Recognizes scripts by their `#!` line. Handles direct interpreter paths
//! (`#!/bin/bash`), `env` indirection with or without flags
//! (`#!/usr/bin/env -S deno run`) and versioned binaries (`python3.11`).

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::detection::detector::{clamp_threshold, threshold_to_external, Detector, DetectorError};
use crate::detection::types::DetectionResult;

pub const SHEBANG_DETECTOR_NAME: &str = "shebang";

const SHEBANG_CONFIDENCE: u8 = 95;
const DEFAULT_THRESHOLD: f64 = 0.3;

/// Interpreter stem to canonical language.
const INTERPRETERS: &[(&str, &str)] = &[
    ("bash", "bash"),
    ("dash", "bash"),
    ("deno", "typescript"),
    ("ksh", "bash"),
    ("node", "javascript"),
    ("nodejs", "javascript"),
    ("perl", "perl"),
    ("php", "php"),
    ("powershell", "powershell"),
    ("pwsh", "powershell"),
    ("python", "python"),
    ("ruby", "ruby"),
    ("sh", "bash"),
    ("zsh", "bash"),
];

pub struct ShebangDetector {
    threshold: f64,
}

impl ShebangDetector {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Interpreter stem named by the first line, if it is a shebang.
    pub fn interpreter(code: &str) -> Option<&str> {
        static SHEBANG_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = SHEBANG_REGEX.get_or_init(|| {
            Regex::new(r"^#!\s*(?:\S*/)?(?:env\s+(?:-\S+\s+)*)?([A-Za-z]+)")
                .expect("Invalid shebang regex")
        });

        let first_line = code.trim_start().lines().next()?;
        re.captures(first_line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    fn language_for(interpreter: &str) -> Option<&'static str> {
        INTERPRETERS
            .iter()
            .find(|(name, _)| *name == interpreter)
            .map(|(_, language)| *language)
    }
}

impl Default for ShebangDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for ShebangDetector {
    fn name(&self) -> &str {
        SHEBANG_DETECTOR_NAME
    }

    fn display_name(&self) -> &str {
        "Shebang"
    }

    fn description(&self) -> &str {
        "Maps the #! interpreter line of a script to its language"
    }

    fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = INTERPRETERS
            .iter()
            .map(|(_, language)| language.to_string())
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }

    async fn detect(&self, code: &str) -> Result<Option<DetectionResult>, DetectorError> {
        if code.trim().is_empty() {
            return Ok(None);
        }

        let Some(interpreter) = Self::interpreter(code) else {
            return Ok(None);
        };
        let Some(language) = Self::language_for(interpreter) else {
            debug!(interpreter = %interpreter, "Unknown shebang interpreter");
            return Ok(None);
        };

        if SHEBANG_CONFIDENCE < threshold_to_external(self.threshold) {
            return Ok(None);
        }

        Ok(Some(DetectionResult::new(
            language,
            SHEBANG_CONFIDENCE,
            SHEBANG_DETECTOR_NAME,
        )))
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn set_threshold(&mut self, threshold: f64) {
        self.threshold = clamp_threshold(threshold);
    }
}
