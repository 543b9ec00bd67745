// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document walker — enhances every embedded image of one PDF and writes the
// result next to the input under the suffixed name.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use scanlift_core::error::ScanliftError;
use scanlift_core::{
    CancellationToken, DocumentReport, ImageRef, PageRef, ProcessingOutcome, SkipReason,
};
use tracing::{debug, info, instrument, warn};

use crate::pdf::PdfBackend;
use crate::progress::FileReporter;
use crate::raster::buffer::RasterImage;
use crate::scan::enhance::ScanEnhancer;

/// True if `path` has a `.pdf` extension, in any letter case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Output path for `path`: `<stem><suffix><ext>` in the same directory.
///
/// `None` when the file is not a PDF or its stem already ends with `suffix`.
pub fn output_path_for(path: &Path, suffix: &str) -> Option<PathBuf> {
    if !has_pdf_extension(path) {
        return None;
    }
    let stem = path.file_stem()?;
    let ext = path.extension()?;
    if stem.as_encoded_bytes().ends_with(suffix.as_bytes()) {
        return None;
    }
    let mut name = OsString::from(stem);
    name.push(suffix);
    name.push(".");
    name.push(ext);
    Some(path.with_file_name(name))
}

/// Enhance every embedded image of the document at `path`.
///
/// Skips (without error) non-PDF names, already-suffixed names, and documents
/// without pages. An image that fails to extract, decode, encode or replace is
/// logged and left untouched. Open and save failures, and cancellation, abort
/// the file; no partial output is left behind.
#[instrument(skip_all, fields(path = %path.display(), suffix))]
pub fn process_document<B: PdfBackend>(
    path: &Path,
    enhancer: &ScanEnhancer,
    suffix: &str,
    reporter: &mut FileReporter<'_>,
    cancel: &CancellationToken,
) -> Result<ProcessingOutcome, ScanliftError> {
    let name = display_name(path);

    if !has_pdf_extension(path) {
        reporter.status(format!("Skipping {}: not a PDF file", name));
        return Ok(ProcessingOutcome::Skipped(SkipReason::NotPdf));
    }
    let Some(output) = output_path_for(path, suffix) else {
        reporter.status(format!("Skipping {}: already processed", name));
        return Ok(ProcessingOutcome::Skipped(SkipReason::AlreadyProcessed));
    };

    reporter.status(format!("Processing {}", name));
    let mut document = B::open(path)?;

    let pages = document.pages();
    if pages.is_empty() {
        reporter.status(format!("Skipping {}: document has no pages", name));
        return Ok(ProcessingOutcome::Skipped(SkipReason::NoPages));
    }

    let total_pages = pages.len();
    let mut done: HashSet<ImageRef> = HashSet::new();
    let mut images_enhanced = 0;
    let mut images_skipped = 0;

    for (index, page) in pages.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(page = page.number, "Cancelled mid-document");
            return Err(ScanliftError::Cancelled);
        }
        reporter.page_status(
            index,
            format!("Processing page {}/{} of {}", index + 1, total_pages, name),
        );

        let images = document.embedded_images(*page)?;
        if images.is_empty() {
            continue;
        }

        for image in images {
            if !done.insert(image) {
                debug!(page = page.number, image = %image, "Image already enhanced");
                continue;
            }
            match enhance_image(&mut document, *page, image, enhancer) {
                Ok(()) => images_enhanced += 1,
                Err(err) => {
                    warn!(page = page.number, image = %image, error = %err, "Skipping embedded image");
                    images_skipped += 1;
                }
            }
        }

        if let Err(err) = document.clean_content_stream(*page) {
            warn!(page = page.number, error = %err, "Page content left as is");
        }
    }

    if cancel.is_cancelled() {
        return Err(ScanliftError::Cancelled);
    }

    save_atomically(&mut document, &output)?;
    info!(
        output = %output.display(),
        pages = total_pages,
        images_enhanced,
        images_skipped,
        "Document enhanced"
    );

    Ok(ProcessingOutcome::Enhanced(DocumentReport {
        output,
        pages: total_pages,
        images_enhanced,
        images_skipped,
    }))
}

/// Extract, decode, enhance, re-encode and replace one image.
fn enhance_image<B: PdfBackend>(
    document: &mut B,
    page: PageRef,
    image: ImageRef,
    enhancer: &ScanEnhancer,
) -> Result<(), ScanliftError> {
    let extracted = document.extract_image(image)?;
    let raster = RasterImage::from_bytes(&extracted.data, extracted.resolution)?;
    let enhanced = enhancer.enhance(&raster);
    let png = enhanced.to_png_bytes()?;
    document.replace_image(page, image, &png)
}

/// Save to a temporary file beside `output`, then rename it into place.
fn save_atomically<B: PdfBackend>(document: &mut B, output: &Path) -> Result<(), ScanliftError> {
    let dir = output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let temp = tempfile::Builder::new()
        .prefix(".scanlift-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|err| {
            ScanliftError::Save(format!(
                "cannot create a temporary file in {}: {}",
                dir.display(),
                err
            ))
        })?
        .into_temp_path();

    document.save(&temp)?;

    temp.persist(output).map_err(|err| {
        ScanliftError::Save(format!(
            "cannot move output into place at {}: {}",
            output.display(),
            err.error
        ))
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
