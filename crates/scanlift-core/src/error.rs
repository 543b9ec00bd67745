// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanlift.

use thiserror::Error;

/// Top-level error type for all Scanlift operations.
#[derive(Debug, Error)]
pub enum ScanliftError {
    // -- Configuration --
    #[error("invalid enhancement parameters: {0}")]
    InvalidParams(String),

    // -- Document errors --
    #[error("cannot open document: {0}")]
    DocumentOpen(String),

    #[error("cannot extract embedded image: {0}")]
    Extract(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("cannot save document: {0}")]
    Save(String),

    // -- Control flow --
    #[error("processing cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanliftError>;
