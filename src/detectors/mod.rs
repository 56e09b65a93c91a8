//! Built-in detection strategies

pub mod pattern;
pub mod shebang;

pub use pattern::{LanguageScore, PatternDetector, PatternDetectorConfig, PATTERN_DETECTOR_NAME};
pub use shebang::{ShebangDetector, SHEBANG_DETECTOR_NAME};
