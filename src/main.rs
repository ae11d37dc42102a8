//! memon - version 0.1.0
//!
//! Process tree memory analyzer with tracing logging.
//! This is the main entry point that resolves configuration, handles
//! subcommands and runs the analysis once or in watch mode.

mod cli;
mod commands;
mod config;
mod monitor;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_snapshot};
use config::{resolve_config, show_config, validate_effective_config, Config};
use monitor::{run_single, run_watch, RunContext};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so stdout carries only the report.
fn setup_logging(config: &Config, verbose: bool) {
    let mut level = config.log_level();
    if verbose {
        level = level.max(LogLevel::Debug);
    }

    let log_level = match level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {:?}", level);
}

/// Main application entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = resolve_config(&args)?;

    // Early exits for show/check modes
    if args.check_config {
        return Ok(match validate_effective_config(&config) {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration invalid: {}", e);
                ExitCode::FAILURE
            }
        });
    }

    if args.show_config {
        show_config(&config, args.config_format)?;
        return Ok(ExitCode::SUCCESS);
    }

    // Config and Check report on the configuration themselves
    match &args.command {
        Some(Commands::Config {
            output,
            format,
            commented,
        }) => {
            command_config(output.clone(), *format, *commented)?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Check) => {
            setup_logging(&config, args.verbose);
            return command_check(&config);
        }
        _ => {}
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    setup_logging(&config, args.verbose);
    debug!("Effective config: {:?}", config);

    if let Some(Commands::Snapshot { output }) = &args.command {
        command_snapshot(output, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let query = args
        .process_name
        .clone()
        .context("A process name is required")?;

    info!("Starting memon for '{}'", query);
    let ctx = RunContext::from_config(query, &config)?;

    match config.watch_interval {
        Some(seconds) => run_watch(ctx, Duration::from_secs(seconds)).await,
        None => run_single(ctx).await,
    }
}
