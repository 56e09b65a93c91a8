//! langtag - pluggable source-code language detection
//!
//! Given a snippet of source text, langtag names its programming language
//! with a 0–100 confidence score. Detection strategies are interchangeable
//! [`Detector`]s run by an orchestrator under one of three protocols:
//!
//! - **Sequential**: first acceptable answer in the configured order
//! - **Exhaustive**: every detector, ranked by confidence
//! - **Analytical**: both, plus consensus and average confidence
//!
//! # Example Usage
//!
//! ```no_run
//! use langtag::detection::DetectionService;
//! use langtag::languages::LanguageCatalog;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut service = DetectionService::with_defaults(LanguageCatalog::builtin()?);
//! service.configuration().import_json(r#"{"confidence_threshold": 50}"#);
//!
//! let ranked = service.detect_with_all_methods("def main():\n    pass\n").await;
//! for result in ranked {
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`detection`]: detector contract, registry, orchestrator, configuration
//! - [`detectors`]: built-in pattern-scoring and shebang detectors
//! - [`languages`]: language pattern definitions and catalog loading
//! - [`config`]: environment-driven process configuration

pub mod cli;
pub mod config;
pub mod detection;
pub mod detectors;
pub mod languages;
pub mod util;

pub use config::{ConfigError, LangtagConfig};
pub use detection::{
    ConfigurationManager, DetectionAnalysis, DetectionOrchestrator, DetectionResult,
    DetectionService, DetectionSettings, Detector, DetectorError, DetectorRegistry,
};
pub use detectors::{PatternDetector, ShebangDetector};
pub use languages::{LanguageCatalog, LanguagePatternDefinition};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
