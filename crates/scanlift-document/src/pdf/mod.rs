// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the document backend interface the walker drives, and its
// `lopdf` implementation.

use std::path::Path;

use scanlift_core::error::ScanliftError;
use scanlift_core::{ImageRef, PageRef, Resolution};

pub mod document;
mod samples;
mod xobject;

pub use document::LopdfDocument;

/// Encoded bytes of an embedded image plus the resolution to re-encode it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// A self-describing encoding (JPEG or PNG) that the image codec decodes.
    pub data: Vec<u8>,
    pub resolution: Resolution,
}

/// Operations the document walker needs from a PDF library.
///
/// Image references stay valid until the document is dropped; replacing an
/// image keeps its reference so every content-stream use of it picks up the
/// new pixels.
pub trait PdfBackend: Sized {
    /// Open a document (`ScanliftError::DocumentOpen` on failure).
    fn open(path: &Path) -> Result<Self, ScanliftError>;

    fn page_count(&self) -> usize;

    /// Pages in document order.
    fn pages(&self) -> Vec<PageRef>;

    /// Raster images drawn by `page`, in resource order, without duplicates.
    fn embedded_images(&self, page: PageRef) -> Result<Vec<ImageRef>, ScanliftError>;

    /// Raw bytes and resolution of one image (`ScanliftError::Extract` when
    /// the stream cannot be turned into a decodable encoding).
    fn extract_image(&self, image: ImageRef) -> Result<ExtractedImage, ScanliftError>;

    /// Swap the pixels of `image` for the PNG-encoded `png`, reusing the reference.
    fn replace_image(
        &mut self,
        page: PageRef,
        image: ImageRef,
        png: &[u8],
    ) -> Result<(), ScanliftError>;

    /// Re-serialise the page content and drop resource entries it no longer draws.
    fn clean_content_stream(&mut self, page: PageRef) -> Result<(), ScanliftError>;

    /// Write the document with compaction (`ScanliftError::Save` on failure).
    fn save(&mut self, path: &Path) -> Result<(), ScanliftError>;
}
