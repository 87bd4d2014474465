mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use typedef_core::{Error as CoreError, Schema, ValidationReport, Validator, report_json_schema};

use config::{ConfigError, load_settings};
use logging::init_logging;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "typedef", version, about = "Check schemas and validate JSON documents")]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Construct and check a schema file.
    Check(CheckArgs),
    /// Validate instance files against a schema.
    Validate(ValidateArgs),
    /// Print the JSON Schema of validation reports.
    ReportSchema,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Schema file to check.
    #[arg(value_name = "SCHEMA")]
    schema: PathBuf,
    /// Print the normalized schema on success.
    #[arg(long, default_value_t = false)]
    print: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Schema file to validate against.
    #[arg(long, value_name = "SCHEMA")]
    schema: PathBuf,
    /// Instance files to validate.
    #[arg(value_name = "INSTANCE", required = true)]
    instances: Vec<PathBuf>,
    /// Maximum nested ref depth (0 = unlimited).
    #[arg(long)]
    max_depth: Option<usize>,
    /// Stop after this many errors per instance (0 = unlimited).
    #[arg(long)]
    max_errors: Option<usize>,
    /// Settings file; defaults to ./typedef.toml when present.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct InstanceReport<'a> {
    instance: &'a str,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_json).map_err(CliError::Logging) {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }

    let outcome = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Validate(args) => run_validate(args),
        Command::ReportSchema => run_report_schema(),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            tracing::error!(event = "command_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run_check(args: CheckArgs) -> Result<bool, CliError> {
    let schema = load_schema(&args.schema)?;
    if args.print {
        println!("{}", serde_json::to_string_pretty(&schema.to_json())?);
    } else {
        println!("schema ok: {}", args.schema.display());
    }
    Ok(true)
}

fn run_validate(args: ValidateArgs) -> Result<bool, CliError> {
    let ValidateArgs {
        schema,
        instances,
        max_depth,
        max_errors,
        config,
    } = args;

    let settings = load_settings(config.as_deref(), Path::new("."))?;
    let validator_config = settings.validator_config(max_depth, max_errors);
    let schema_path = schema;
    let schema = load_schema(&schema_path)?;
    let validator = Validator::new(validator_config);

    let mut all_valid = true;
    for path in &instances {
        let started = Instant::now();
        let instance = load_json(path)?;
        let errors = validator.validate(&schema, &instance)?;
        let report = ValidationReport::new(errors, validator.config());

        tracing::info!(
            event = "instance_validated",
            instance = %path.display(),
            errors = report.errors.len(),
            truncated = report.truncated,
            duration_ms = started.elapsed().as_millis() as u64
        );

        all_valid &= report.is_ok();
        let display = path.display().to_string();
        let line = InstanceReport {
            instance: &display,
            report: &report,
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(all_valid)
}

fn run_report_schema() -> Result<bool, CliError> {
    println!("{}", serde_json::to_string_pretty(&report_json_schema())?);
    Ok(true)
}

fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let value = load_json(path)?;
    let schema = Schema::from_json(&value)?;
    schema.check()?;
    tracing::debug!(event = "schema_loaded", path = %path.display());
    Ok(schema)
}

fn load_json(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}
