// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Scanlift.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::human_errors::Severity;

/// Resolution assumed for embedded images that carry no density information.
pub const DEFAULT_DPI: u32 = 96;

/// Horizontal and vertical resolution of a raster image, in dots per inch.
///
/// Only used as re-encoding metadata; pixel processing ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub x: u32,
    pub y: u32,
}

impl Resolution {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(DEFAULT_DPI, DEFAULT_DPI)
    }
}

/// Identifier of an indirect PDF object (object number + generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub number: u32,
    pub generation: u16,
}

/// Opaque handle to an embedded image resource.
///
/// Valid only for the lifetime of the document it was obtained from.
pub type ImageRef = ObjectRef;

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Handle to a page of an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    /// 1-based page number.
    pub number: u32,
    /// The page dictionary.
    pub object: ObjectRef,
}

/// Why a file produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The file does not have a `.pdf` extension.
    NotPdf,
    /// The file stem already ends with the output suffix.
    AlreadyProcessed,
    /// The document has no pages.
    NoPages,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPdf => f.write_str("not a PDF file"),
            Self::AlreadyProcessed => f.write_str("already processed"),
            Self::NoPages => f.write_str("document has no pages"),
        }
    }
}

/// Counters for one successfully written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub output: PathBuf,
    pub pages: usize,
    pub images_enhanced: usize,
    pub images_skipped: usize,
}

/// Result of running the document walker on one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingOutcome {
    Enhanced(DocumentReport),
    Skipped(SkipReason),
}

impl ProcessingOutcome {
    /// Output path if the file was enhanced.
    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Self::Enhanced(report) => Some(&report.output),
            Self::Skipped(_) => None,
        }
    }
}

/// A file whose processing failed with a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
    /// Whether a retry, a user change, or neither can fix it.
    pub severity: Severity,
}

/// Final tally of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub total: usize,
    pub failures: Vec<FileFailure>,
    /// True if the batch stopped early because of a cancellation request.
    pub cancelled: bool,
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// Human-readable description of the current action.
    Status {
        /// 0-based index of the file in the batch.
        file_index: usize,
        /// 0-based page index, when the message concerns a page.
        page_index: Option<usize>,
        message: String,
    },
    /// A new file is about to be processed (`current` is 1-based).
    TotalProgress { current: usize, total: usize },
}

/// Cooperative cancellation flag shared between a batch and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running work stops at the next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
