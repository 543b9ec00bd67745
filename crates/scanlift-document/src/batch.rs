// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch coordinator — candidate discovery and the sequential per-file loop.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use scanlift_core::error::ScanliftError;
use scanlift_core::human_errors::humanize_error;
use scanlift_core::{
    BatchConfig, BatchSummary, CancellationToken, FileFailure, ProcessingOutcome, ProgressEvent,
};
use tracing::{debug, error, info, instrument, warn};

use crate::pdf::{LopdfDocument, PdfBackend};
use crate::progress::{FileReporter, ProgressObserver};
use crate::scan::enhance::ScanEnhancer;
use crate::walker::{has_pdf_extension, process_document};

/// Expand input paths into the ordered list of PDF files to process.
///
/// A directory contributes its direct children with a `.pdf` extension (any
/// case), sorted by file name; a PDF file contributes itself. Paths that are
/// neither are ignored. A file reached twice (by any spelling) is kept once,
/// at its first position.
#[instrument(skip_all, fields(inputs = paths.len()))]
pub fn collect_candidates<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    let mut push = |path: PathBuf| {
        let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            files.push(path);
        }
    };

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let entries = match fs::read_dir(path) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Cannot list directory");
                    continue;
                }
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|child| child.is_file() && has_pdf_extension(child))
                .collect();
            children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            for child in children {
                push(child);
            }
        } else if path.is_file() && has_pdf_extension(path) {
            push(path.to_path_buf());
        } else {
            debug!(path = %path.display(), "Ignoring input that is not a PDF file or directory");
        }
    }

    files
}

/// Process `files` in order with the lopdf backend.
///
/// See [`process_batch_with`].
pub fn process_batch<P: AsRef<Path>>(
    files: &[P],
    config: &BatchConfig,
    observer: &mut dyn ProgressObserver,
    cancel: &CancellationToken,
) -> Result<BatchSummary, ScanliftError> {
    process_batch_with::<LopdfDocument, P>(files, config, observer, cancel)
}

/// Process `files` in order, one document at a time.
///
/// Emits `TotalProgress(index + 1, total)` before each file. A file that
/// fails is logged, reported as a status event, recorded in the summary, and
/// the batch moves on. Cancellation is honoured between files (and between
/// pages inside the walker). Only invalid settings fail the whole call.
#[instrument(skip_all, fields(files = files.len()))]
pub fn process_batch_with<B: PdfBackend, P: AsRef<Path>>(
    files: &[P],
    config: &BatchConfig,
    observer: &mut dyn ProgressObserver,
    cancel: &CancellationToken,
) -> Result<BatchSummary, ScanliftError> {
    config.validate()?;
    let enhancer = ScanEnhancer::new(config.params)?;

    let total = files.len();
    let mut summary = BatchSummary {
        total,
        ..BatchSummary::default()
    };
    info!(total, suffix = %config.suffix, "Batch started");

    for (index, path) in files.iter().enumerate() {
        let path = path.as_ref();
        if cancel.is_cancelled() {
            warn!(remaining = total - index, "Batch cancelled");
            summary.cancelled = true;
            break;
        }

        observer.on_event(&ProgressEvent::TotalProgress {
            current: index + 1,
            total,
        });
        let mut reporter = FileReporter::new(&mut *observer, index);

        match process_document::<B>(path, &enhancer, &config.suffix, &mut reporter, cancel) {
            Ok(ProcessingOutcome::Enhanced(report)) => {
                debug!(output = %report.output.display(), "File enhanced");
                summary.succeeded += 1;
            }
            Ok(ProcessingOutcome::Skipped(reason)) => {
                debug!(path = %path.display(), %reason, "File skipped");
            }
            Err(ScanliftError::Cancelled) => {
                reporter.status(format!("Cancelled while processing {}", path.display()));
                summary.cancelled = true;
                break;
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "File failed");
                reporter.status(format!("Failed to process {}: {}", path.display(), err));
                summary.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                    severity: humanize_error(&err).severity,
                });
            }
        }
    }

    info!(
        succeeded = summary.succeeded,
        total = summary.total,
        failed = summary.failures.len(),
        cancelled = summary.cancelled,
        "Batch finished"
    );
    Ok(summary)
}
