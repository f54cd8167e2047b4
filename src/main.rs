//! perf-matrix binary entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use perf_matrix::config::{
    BasicValidator, ConfigLoader, HarnessConfig, LogFormat, LogLevel, SuiteNameValidator,
    DEFAULT_CONFIG_FILE,
};
use perf_matrix::perf::{CountingAllocator, Registry, Runner, SuiteRunner};
use perf_matrix::{scenarios, HarnessResult};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator::system();

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> HarnessResult<ExitCode> {
    let registry = scenarios::registry()?;
    let mut config = read_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => {
            init_tracing(&config, cli.log_level);
            print_listing(&registry);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { path, force } => {
            init_tracing(&config, cli.log_level);
            if path.exists() && !force {
                eprintln!("{} already exists, use --force to overwrite", path.display());
                return Ok(ExitCode::FAILURE);
            }
            ConfigLoader::new().save(&HarnessConfig::default(), &path)?;
            info!(path = %path.display(), "Wrote default configuration");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => {
            args.apply(&mut config);
            init_tracing(&config, cli.log_level);
            run(&registry, &config, &args)
        }
    }
}

/// Load the file configuration without validating it yet; validation runs
/// after CLI flags are merged so its warnings reach the log.
fn read_config(path: Option<&Path>) -> HarnessResult<HarnessConfig> {
    let loader = ConfigLoader::new();
    let config = match path {
        Some(path) => loader.load(path)?,
        None => loader.load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    Ok(config)
}

fn run(registry: &Registry, config: &HarnessConfig, args: &RunArgs) -> HarnessResult<ExitCode> {
    ConfigLoader::new()
        .with_validator(BasicValidator::new())
        .with_validator(SuiteNameValidator::new(registry.names()))
        .validate(config)?;

    let mut overrides = config.overrides();
    overrides.extend(args.params.iter().cloned());

    let timing = config.timing();
    info!(
        warmup = timing.warmup,
        iterations = timing.iterations,
        confidence = %timing.confidence,
        "Starting benchmark run"
    );

    let report = Runner::new(registry, timing)
        .with_title(format!("perf-matrix {}", env!("CARGO_PKG_VERSION")))
        .with_overrides(overrides)
        .run(&config.run.suites)?;

    let format = config.report.format;
    let Some(output) = &config.report.output else {
        report.emit(std::io::stdout().lock(), format)?;
        return Ok(ExitCode::SUCCESS);
    };

    print!("{}", report.summary());
    match report.write_to(output, format) {
        Ok(()) => {
            info!(path = %output.display(), %format, "Report written");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Failed to write report, printing it instead");
            report.emit(std::io::stdout().lock(), format)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_listing(registry: &Registry) {
    for suite in registry.suites() {
        print_suite(suite);
    }
}

fn print_suite(suite: &dyn SuiteRunner) {
    println!("{} - {}", suite.name(), suite.description());
    for parameter in suite.parameters().parameters() {
        let values: Vec<String> = parameter.values.iter().map(u64::to_string).collect();
        println!("  param {} = [{}]", parameter.name, values.join(", "));
    }
    for op in suite.operations() {
        let marker = if op.baseline { " (baseline)" } else { "" };
        println!("  {:<28} {}{}", op.name, op.kind, marker);
    }
    println!();
}

/// Initialize logging on stderr. `--log-level` wins over `RUST_LOG`, which
/// wins over the config file.
fn init_tracing(config: &HarnessConfig, cli_level: Option<LogLevel>) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_string())),
    };
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}
