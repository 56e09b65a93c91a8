//! Process configuration for langtag
//!
//! Settings are loaded from environment variables with defaults and turned
//! into a [`DetectionSettings`] payload, which the configuration manager
//! applies like any other settings source.
//!
//! # Environment Variables
//!
//! - `LANGTAG_CONFIDENCE_THRESHOLD`: global threshold, 0–100 - default: "30"
//! - `LANGTAG_DETECTION_ORDER`: comma-separated detector names - default:
//!   registration order
//! - `LANGTAG_ENABLED_LANGUAGES`: comma-separated allow-list - default: all
//! - `LANGTAG_CATALOG`: YAML or JSON language catalog - default: bundled
//! - `LANGTAG_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use langtag::detection::DetectionService;
//! use langtag::LangtagConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LangtagConfig::default();
//! config.validate()?;
//!
//! let mut service = DetectionService::with_defaults(config.load_catalog()?);
//! service.set_configuration(config.to_settings())?;
//! # Ok(())
//! # }
//! ```

use crate::detection::detector::DetectorError;
use crate::detection::{DetectionSettings, MAX_CONFIDENCE};
use crate::languages::{CatalogError, LanguageCatalog};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_CONFIDENCE_THRESHOLD: u16 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Unknown detector: {0}")]
    UnknownDetector(String),

    #[error("Detector '{0}' does not accept configuration")]
    NotConfigurable(String),

    /// A detector refused its configuration payload
    #[error("Detector '{name}' rejected configuration: {source}")]
    DetectorRejected {
        name: String,
        #[source]
        source: DetectorError,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Main configuration structure for langtag
///
/// `Default::default()` reads `LANGTAG_*` environment variables and falls
/// back to defaults for anything missing or unparsable.
#[derive(Debug, Clone, PartialEq)]
pub struct LangtagConfig {
    /// Global confidence threshold; `validate()` enforces 0–100
    pub confidence_threshold: u16,

    /// Sequential detector order; `None` keeps registration order
    pub detection_order: Option<Vec<String>>,

    /// Language allow-list; empty allows every language
    pub enabled_languages: Vec<String>,

    /// External language catalog; `None` uses the bundled one
    pub catalog: Option<PathBuf>,

    pub log_level: String,
}

impl Default for LangtagConfig {
    fn default() -> Self {
        let confidence_threshold = env::var("LANGTAG_CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

        let detection_order = env::var("LANGTAG_DETECTION_ORDER")
            .ok()
            .map(|v| split_list(&v))
            .filter(|names| !names.is_empty());

        let enabled_languages = env::var("LANGTAG_ENABLED_LANGUAGES")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let catalog = env::var("LANGTAG_CATALOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let log_level = env::var("LANGTAG_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            confidence_threshold,
            detection_order,
            enabled_languages,
            catalog,
            log_level,
        }
    }
}

impl LangtagConfig {
    /// Checks that:
    /// - the threshold is within 0–100
    /// - the log level is known
    /// - a configured catalog file exists
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confidence_threshold > u16::from(MAX_CONFIDENCE) {
            return Err(ConfigError::ValidationFailed(format!(
                "Confidence threshold must be between 0 and 100, got {}",
                self.confidence_threshold
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if let Some(path) = &self.catalog {
            if !path.is_file() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Catalog file not found: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// Loads the configured catalog, or the bundled one.
    pub fn load_catalog(&self) -> Result<LanguageCatalog, ConfigError> {
        let catalog = match &self.catalog {
            Some(path) => LanguageCatalog::from_path(path)?,
            None => LanguageCatalog::builtin()?,
        };
        Ok(catalog)
    }

    /// Settings payload for the configuration manager. Unset values are
    /// left absent so they do not override other sources.
    pub fn to_settings(&self) -> DetectionSettings {
        DetectionSettings {
            confidence_threshold: Some(
                u8::try_from(self.confidence_threshold).unwrap_or(MAX_CONFIDENCE),
            ),
            detection_order: self.detection_order.clone(),
            enabled_languages: if self.enabled_languages.is_empty() {
                None
            } else {
                Some(self.enabled_languages.clone())
            },
            ..Default::default()
        }
    }

    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        map.insert(
            "confidence_threshold".to_string(),
            self.confidence_threshold.to_string(),
        );
        map.insert(
            "detection_order".to_string(),
            self.detection_order
                .as_ref()
                .map_or_else(|| "registration".to_string(), |o| o.join(",")),
        );
        map.insert(
            "enabled_languages".to_string(),
            if self.enabled_languages.is_empty() {
                "all".to_string()
            } else {
                self.enabled_languages.join(",")
            },
        );
        map.insert(
            "catalog".to_string(),
            self.catalog
                .as_ref()
                .map_or_else(|| "builtin".to_string(), |p| p.display().to_string()),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for LangtagConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Langtag Configuration:")?;
        writeln!(f, "  Confidence Threshold: {}", self.confidence_threshold)?;
        match &self.detection_order {
            Some(order) => writeln!(f, "  Detection Order: {}", order.join(", "))?,
            None => writeln!(f, "  Detection Order: registration order")?,
        }
        if self.enabled_languages.is_empty() {
            writeln!(f, "  Enabled Languages: all")?;
        } else {
            writeln!(f, "  Enabled Languages: {}", self.enabled_languages.join(", "))?;
        }
        match &self.catalog {
            Some(path) => writeln!(f, "  Catalog: {}", path.display())?,
            None => writeln!(f, "  Catalog: builtin")?,
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
