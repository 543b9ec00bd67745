// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanlift — batch legibility enhancement for scanned PDFs
//
// Entry point. Initialises logging, resolves settings, collects input files,
// and runs the batch with progress printed to stdout. Ctrl-C stops the batch
// at the next page boundary without leaving partial output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scanlift_core::human_errors::{Severity, humanize_error};
use scanlift_core::{BatchConfig, BatchSummary, CancellationToken, FileFailure};
use scanlift_document::{CallbackObserver, NullObserver, collect_candidates, process_batch};

#[derive(Debug, Parser)]
#[command(name = "scanlift")]
#[command(version, about = "Enhance scanned images embedded in PDF files", long_about = None)]
struct Cli {
    /// PDF files or directories containing PDF files
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Contrast factor applied to content regions
    #[arg(long, value_name = "FLOAT")]
    contrast: Option<f32>,

    /// Unsharp mask radius
    #[arg(long, value_name = "FLOAT")]
    radius: Option<f32>,

    /// Unsharp mask strength in percent
    #[arg(long, value_name = "INT")]
    percent: Option<i32>,

    /// Minimum difference before a pixel is sharpened
    #[arg(long, value_name = "INT")]
    threshold: Option<i32>,

    /// Suffix appended to output file names
    #[arg(long, value_name = "TEXT")]
    suffix: Option<String>,

    /// JSON settings file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Settings from `--config` (or defaults) with flag overrides applied.
    fn batch_config(&self) -> scanlift_core::error::Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::load(path)?,
            None => BatchConfig::default(),
        };
        if let Some(contrast) = self.contrast {
            config.params.contrast = contrast;
        }
        if let Some(radius) = self.radius {
            config.params.radius = radius;
        }
        if let Some(percent) = self.percent {
            config.params.percent = percent;
        }
        if let Some(threshold) = self.threshold {
            config.params.threshold = threshold;
        }
        if let Some(suffix) = &self.suffix {
            config.suffix = suffix.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_level())),
        )
        .init();

    tracing::info!("Scanlift starting");

    let config = match cli.batch_config() {
        Ok(config) => config,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("{} {}", human.message, human.suggestion);
            return ExitCode::FAILURE;
        }
    };

    let files = collect_candidates(&cli.inputs);
    if files.is_empty() {
        eprintln!("No PDF files found");
        return ExitCode::FAILURE;
    }

    let cancel = CancellationToken::new();
    if let Err(err) = ctrlc::set_handler(interrupt_handler(cancel.clone())) {
        tracing::warn!(error = %err, "Ctrl-C handler not installed; the batch cannot be interrupted cleanly");
    }

    let result = if cli.quiet {
        process_batch(&files, &config, &mut NullObserver, &cancel)
    } else {
        let mut observer = CallbackObserver::new(
            |message: &str| println!("{message}"),
            |current, total| println!("Total progress: {current}/{total}"),
        );
        process_batch(&files, &config, &mut observer, &cancel)
    };

    match result {
        Ok(summary) => report(&summary),
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("{} {}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

/// Print the summary line and one line per failed file.
fn report(summary: &BatchSummary) -> ExitCode {
    println!(
        "Successfully processed {}/{}",
        summary.succeeded, summary.total
    );
    for failure in &summary.failures {
        eprintln!("{}", failure_line(failure));
    }
    if summary.cancelled {
        eprintln!("Cancelled before all files were processed");
    }

    if summary.failures.is_empty() && !summary.cancelled {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Ctrl-C handler: asks the running batch to stop at its next checkpoint.
fn interrupt_handler(cancel: CancellationToken) -> impl FnMut() + Send + 'static {
    move || {
        eprintln!("Stopping after the current page...");
        cancel.cancel();
    }
}

/// One indented line per failed file, saying whether a rerun could help.
fn failure_line(failure: &FileFailure) -> String {
    let hint = match failure.severity {
        Severity::Transient => "may succeed if run again",
        Severity::ActionRequired => "fix the problem, then run again",
        Severity::Permanent => "file cannot be processed",
    };
    format!("  {}: {} ({})", failure.path.display(), failure.error, hint)
}
