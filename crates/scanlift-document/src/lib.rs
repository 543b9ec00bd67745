// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanlift-document — Enhancement of scanned images embedded in PDFs.
//
// Provides the raster enhancement pipeline (content mask, masked contrast
// stretch, unsharp sharpening), a lopdf-backed document layer that extracts
// and replaces image XObjects, and the batch driver with progress reporting.

pub mod batch;
pub mod pdf;
pub mod progress;
pub mod raster;
pub mod scan;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary entry points so callers can use `scanlift_document::process_batch` etc.
pub use batch::{collect_candidates, process_batch, process_batch_with};
pub use pdf::{ExtractedImage, LopdfDocument, PdfBackend};
pub use progress::{
    CallbackObserver, ChannelObserver, FileReporter, NullObserver, ProgressObserver,
    RecordingObserver,
};
pub use raster::RasterImage;
pub use scan::{ScanEnhancer, enhance};
pub use walker::{output_path_for, process_document};
