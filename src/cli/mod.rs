pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, DetectArgs, LanguagesArgs, SourceArgs};
pub use output::{ConfigReport, OutputFormat, OutputFormatter};
