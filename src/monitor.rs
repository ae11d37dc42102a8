//! Single-pass and watch-mode execution.
//!
//! Each pass enumerates the process table on a blocking thread and is raced
//! against Ctrl+C. Output for a pass is rendered completely before it is
//! written, so an interrupt never leaves half a tree on the terminal.

use anyhow::{Context, Result};
use chrono::Local;
use console::Term;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info};

use memon::analysis::{analyze, AnalysisOptions, AnalysisOutcome, DEFAULT_INIT_PID, DEFAULT_TOP_N};
use memon::process::{open_source, ProcessSource, SourceError};

use crate::config::{Config, DEFAULT_NAME_WIDTH};
use crate::render::{should_use_colors, Renderer};

/// Everything a pass needs, resolved once at startup.
pub struct RunContext {
    pub query: String,
    pub source: Arc<dyn ProcessSource>,
    pub options: AnalysisOptions,
    pub renderer: Renderer,
}

impl RunContext {
    pub fn from_config(query: String, config: &Config) -> Result<Self, SourceError> {
        let source: Arc<dyn ProcessSource> =
            Arc::from(open_source(config.source_kind(), &config.source_settings())?);
        let color = should_use_colors(config.no_color.unwrap_or(false));
        debug!("Using {} source, colors {}", source.name(), color);

        Ok(Self {
            query,
            source,
            options: AnalysisOptions {
                init_pid: config.init_pid.unwrap_or(DEFAULT_INIT_PID),
                top_n: config.top_n.unwrap_or(DEFAULT_TOP_N),
            },
            renderer: Renderer::new(color, config.name_width.unwrap_or(DEFAULT_NAME_WIDTH)),
        })
    }
}

/// Enumerates processes and analyzes them.
pub fn run_once(
    source: &dyn ProcessSource,
    query: &str,
    options: &AnalysisOptions,
) -> Result<AnalysisOutcome, SourceError> {
    let records = source.snapshot()?;
    debug!("{} returned {} processes", source.name(), records.len());
    Ok(analyze(records, query, options))
}

async fn pass(ctx: &RunContext) -> Result<AnalysisOutcome> {
    let source = Arc::clone(&ctx.source);
    let query = ctx.query.clone();
    let options = ctx.options;

    let outcome = tokio::task::spawn_blocking(move || run_once(source.as_ref(), &query, &options))
        .await
        .context("Analysis task failed")??;
    Ok(outcome)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write to stdout")
}

fn interrupted(renderer: &Renderer) -> Result<ExitCode> {
    write_stdout(&format!("{}\n", renderer.interrupted()))?;
    Ok(ExitCode::FAILURE)
}

/// Runs one pass. Exit status is success iff a tree was analyzed.
pub async fn run_single(ctx: RunContext) -> Result<ExitCode> {
    tokio::select! {
        result = pass(&ctx) => {
            let outcome = result?;
            write_stdout(&ctx.renderer.render(&ctx.query, &outcome))?;
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        _ = signal::ctrl_c() => interrupted(&ctx.renderer),
    }
}

/// Re-runs the pass every `interval` until interrupted.
pub async fn run_watch(ctx: RunContext, interval: Duration) -> Result<ExitCode> {
    let term = Term::stdout();
    let clear = term.is_term();
    let secs = interval.as_secs();
    info!("Watch mode every {}s for '{}'", secs, ctx.query);

    write_stdout(&format!("{}\n", ctx.renderer.watch_banner(secs)))?;

    let mut iteration: u64 = 0;
    loop {
        iteration += 1;
        tokio::select! {
            result = pass(&ctx) => {
                let outcome = result?;
                let mut text = ctx.renderer.watch_header(Local::now(), secs);
                text.push_str(&ctx.renderer.render(&ctx.query, &outcome));
                if clear {
                    term.clear_screen().context("Failed to clear screen")?;
                }
                write_stdout(&text)?;
                debug!("Watch iteration {} done", iteration);
            }
            _ = signal::ctrl_c() => return interrupted(&ctx.renderer),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = signal::ctrl_c() => return interrupted(&ctx.renderer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memon::process::ProcessRecord;

    struct FixedSource(Vec<ProcessRecord>);

    impl ProcessSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn snapshot(&self) -> Result<Vec<ProcessRecord>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl ProcessSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn snapshot(&self) -> Result<Vec<ProcessRecord>, SourceError> {
            Err(SourceError::MissingSnapshotFile)
        }
    }

    // -------------------------------------------------------------------------
    // Tests for run_once
    // -------------------------------------------------------------------------

    #[test]
    fn test_run_once_analyzes_source() {
        let source = FixedSource(vec![
            ProcessRecord::new(1, 0, "init", 1024, 0),
            ProcessRecord::new(5, 1, "redis-server", 4096, 0),
        ]);
        let outcome = run_once(&source, "redis", &AnalysisOptions::default()).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_run_once_propagates_source_error() {
        assert!(run_once(&FailingSource, "x", &AnalysisOptions::default()).is_err());
    }

    // -------------------------------------------------------------------------
    // Tests for pass
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_pass_runs_on_blocking_pool() {
        let ctx = RunContext {
            query: "init".to_string(),
            source: Arc::new(FixedSource(vec![ProcessRecord::new(1, 0, "init", 1024, 0)])),
            options: AnalysisOptions::default(),
            renderer: Renderer::new(false, 40),
        };
        let outcome = pass(&ctx).await.unwrap();
        assert!(outcome.is_success());
    }
}
