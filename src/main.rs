use langtag::cli::commands::{CliArgs, Commands, ConfigArgs, DetectArgs, LanguagesArgs, SourceArgs};
use langtag::cli::output::{ConfigReport, OutputFormat, OutputFormatter};
use langtag::detection::{DetectionService, DetectionSettings, ImportOutcome};
use langtag::util::logging::{self, LoggingConfig};
use langtag::{LangtagConfig, NAME, VERSION};

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use tracing::{debug, error, info, warn, Level};

const EXIT_DETECTED: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOT_DETECTED: i32 = 2;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args, args.quiet).await,
        Commands::Languages(languages_args) => handle_languages(languages_args),
        Commands::Config(config_args) => handle_config(config_args),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let config = if let Some(level_str) = &args.log_level {
        LoggingConfig::with_level(logging::parse_level(level_str))
    } else if args.verbose {
        LoggingConfig::with_level(Level::DEBUG)
    } else if args.quiet {
        LoggingConfig::with_level(Level::ERROR)
    } else {
        LoggingConfig::from_env()
    };

    logging::init_logging(config);
}

async fn handle_detect(args: &DetectArgs, quiet: bool) -> i32 {
    let (_, mut service) = match build_service(&args.sources) {
        Ok(built) => built,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_ERROR;
        }
    };

    let overrides = DetectionSettings {
        confidence_threshold: args.threshold,
        enabled_languages: args.languages.clone(),
        ..Default::default()
    };
    if let Err(e) = service.set_configuration(overrides) {
        error!("Invalid command-line settings: {}", e);
        return EXIT_ERROR;
    }

    let code = match read_input(args.file.as_deref()) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_ERROR;
        }
    };

    let format = OutputFormat::from(args.format);
    if format == OutputFormat::Human && !quiet {
        for warning in service.validate_input(&code) {
            eprintln!("warning: {}", warning);
        }
    }

    let formatter = OutputFormatter::new(format);
    let (output, detected) = if args.all {
        let results = service.detect_with_all_methods(&code).await;
        (formatter.format_results(&results), !results.is_empty())
    } else if args.analyze {
        let analysis = service.analyze(&code).await;
        (formatter.format_analysis(&analysis), analysis.primary.is_some())
    } else {
        let result = service.detect_language(&code).await;
        (formatter.format_result(result.as_ref()), result.is_some())
    };

    match output {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return EXIT_ERROR;
        }
    }

    if detected {
        EXIT_DETECTED
    } else {
        info!("No language detected");
        EXIT_NOT_DETECTED
    }
}

fn handle_languages(args: &LanguagesArgs) -> i32 {
    let (_, service) = match build_service(&args.sources) {
        Ok(built) => built,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_ERROR;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_languages(&service.supported_languages()) {
        Ok(output) => {
            println!("{}", output);
            EXIT_DETECTED
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            EXIT_ERROR
        }
    }
}

fn handle_config(args: &ConfigArgs) -> i32 {
    let (config, mut service) = match build_service(&args.sources) {
        Ok(built) => built,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_ERROR;
        }
    };

    let manager = service.configuration();
    let summary = manager.summary();
    let validation = manager.validate();

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_config(&ConfigReport::new(&config, &summary, &validation)) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return EXIT_ERROR;
        }
    }

    if validation.is_valid {
        EXIT_DETECTED
    } else {
        EXIT_ERROR
    }
}

/// Environment config, then catalog, then the optional settings file.
fn build_service(sources: &SourceArgs) -> Result<(LangtagConfig, DetectionService)> {
    let mut config = LangtagConfig::default();
    if let Some(catalog) = &sources.catalog {
        config.catalog = Some(catalog.clone());
    }
    config.validate().context("Configuration error")?;

    let catalog = config
        .load_catalog()
        .context("Failed to load language catalog")?;
    debug!(languages = catalog.len(), "Loaded language catalog");

    let mut service = DetectionService::with_defaults(catalog);
    service
        .set_configuration(config.to_settings())
        .context("Failed to apply environment settings")?;

    if let Some(path) = &sources.config {
        let outcome = import_settings(&mut service, path)?;
        for warning in &outcome.warnings {
            warn!("{}", warning);
        }
        if !outcome.success {
            bail!(
                "Settings file {} rejected: {}",
                path.display(),
                outcome.errors.join("; ")
            );
        }
    }

    Ok((config, service))
}

fn import_settings(service: &mut DetectionService, path: &Path) -> Result<ImportOutcome> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("json"));

    let mut manager = service.configuration();
    Ok(if is_json {
        manager.import_json(&content)
    } else {
        manager.import_yaml(&content)
    })
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            if atty::is(atty::Stream::Stdin) {
                bail!("No input: pass a FILE or pipe code on stdin");
            }
            let mut code = String::new();
            io::stdin()
                .read_to_string(&mut code)
                .context("Failed to read stdin")?;
            Ok(code)
        }
    }
}
