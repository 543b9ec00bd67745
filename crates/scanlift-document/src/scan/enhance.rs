// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — mask, contrast composite, unsharp mask.

use scanlift_core::EnhanceParams;
use scanlift_core::error::ScanliftError;
use tracing::{debug, instrument};

use crate::raster::buffer::RasterImage;
use crate::scan::contrast::composite;
use crate::scan::mask::{MaskConfig, build_mask_with};
use crate::scan::sharpen::sharpen;

/// Enhances scanned page images for legibility.
///
/// Holds validated parameters so a batch can share one enhancer across every
/// image it touches. The transform itself is pure: the same input always
/// produces the same output, and the resolution is carried through.
#[derive(Debug, Clone)]
pub struct ScanEnhancer {
    params: EnhanceParams,
    mask: MaskConfig,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Create an enhancer, rejecting out-of-range parameters.
    pub fn new(params: EnhanceParams) -> Result<Self, ScanliftError> {
        params.validate()?;
        Ok(Self {
            params,
            mask: MaskConfig::default(),
        })
    }

    /// Override the mask builder constants.
    pub fn with_mask_config(mut self, mask: MaskConfig) -> Self {
        self.mask = mask;
        self
    }

    // -- Enhancement pipeline -------------------------------------------------

    /// Run the full pipeline:
    ///
    /// 1. Build the background/content mask
    /// 2. Auto-stretch, boost contrast, composite through the mask
    /// 3. Unsharp-mask sharpening
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), channels = image.channels()))]
    pub fn enhance(&self, image: &RasterImage) -> RasterImage {
        let mask = build_mask_with(image, &self.mask);
        debug!(
            content = mask.values().iter().filter(|&&v| v == 255).count(),
            "Mask built"
        );

        let composited = composite(image, &mask, self.params.contrast);
        sharpen(
            &composited,
            self.params.radius,
            self.params.percent,
            self.params.threshold,
        )
    }
}

/// Enhance a single image with `params`.
pub fn enhance(image: &RasterImage, params: &EnhanceParams) -> Result<RasterImage, ScanliftError> {
    Ok(ScanEnhancer::new(*params)?.enhance(image))
}
