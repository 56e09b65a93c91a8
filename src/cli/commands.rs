use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pluggable source-code language detection
#[derive(Parser, Debug)]
#[command(
    name = "langtag",
    about = "Detect the programming language of a code snippet",
    version,
    author,
    long_about = "langtag runs a configurable chain of detectors (interpreter lines, \
                  weighted lexical pattern scoring) over a code snippet and reports \
                  the detected language with a 0-100 confidence."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect the language of a file or stdin",
        long_about = "Runs the detection chain over a snippet. Exits 0 when a language \
                      was detected, 2 when none was, and 1 on errors.\n\n\
                      Examples:\n  \
                      langtag detect main.rs\n  \
                      cat script | langtag detect\n  \
                      langtag detect --all --format json snippet.txt\n  \
                      langtag detect --analyze --threshold 50 snippet.txt"
    )]
    Detect(DetectArgs),

    #[command(about = "List the languages the detectors can report")]
    Languages(LanguagesArgs),

    #[command(
        about = "Show the effective configuration and its validation report",
        long_about = "Loads settings from LANGTAG_* environment variables and an optional \
                      settings file, then prints the resulting configuration. Exits 1 \
                      when the configuration is invalid."
    )]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "FILE", help = "File to classify (reads stdin when omitted)")]
    pub file: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with = "analyze",
        help = "Run every detector and print the ranked results"
    )]
    pub all: bool,

    #[arg(long, help = "Print primary, alternatives, consensus and fallback results")]
    pub analyze: bool,

    #[arg(
        short = 't',
        long,
        value_name = "0-100",
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Global confidence threshold"
    )]
    pub threshold: Option<u8>,

    #[arg(
        long,
        value_delimiter = ',',
        value_name = "LANG,...",
        help = "Restrict detection to these languages"
    )]
    pub languages: Option<Vec<String>>,

    #[command(flatten)]
    pub sources: SourceArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct LanguagesArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

/// Where the catalog and saved settings come from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(
        long,
        value_name = "PATH",
        help = "Language catalog (YAML or JSON); overrides LANGTAG_CATALOG"
    )]
    pub catalog: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        help = "Saved detection settings (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
