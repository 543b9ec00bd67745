// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster image buffer — an 8-bit grayscale or RGB pixel grid plus the
// resolution it was extracted with. Decoding goes through the `image` crate;
// encoding goes through the pHYs-aware PNG codec.

use image::{DynamicImage, GrayImage, RgbImage};
use scanlift_core::Resolution;
use scanlift_core::error::ScanliftError;
use tracing::{debug, instrument};

use crate::raster::codec;

/// Pixel storage of a [`RasterImage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    Gray(GrayImage),
    Rgb(RgbImage),
}

/// A decoded embedded image, always single-channel or 3-channel 8-bit.
///
/// Other layouts (alpha, 16-bit, palette) are normalised when the image is
/// constructed so that every enhancement stage only has to handle two cases.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: Pixels,
    resolution: Resolution,
}

impl RasterImage {
    // -- Construction ---------------------------------------------------------

    /// Decode encoded bytes (JPEG, PNG, TIFF, ...) and attach `resolution`.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], resolution: Resolution) -> Result<Self, ScanliftError> {
        let decoded = image::load_from_memory(data).map_err(|err| {
            ScanliftError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = decoded.width(),
            height = decoded.height(),
            color = ?decoded.color(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(decoded, resolution))
    }

    /// Wrap an already-decoded `DynamicImage`, normalising its layout.
    pub fn from_dynamic(image: DynamicImage, resolution: Resolution) -> Self {
        let pixels = match image {
            DynamicImage::ImageLuma8(gray) => Pixels::Gray(gray),
            DynamicImage::ImageRgb8(rgb) => Pixels::Rgb(rgb),
            other if other.color().has_color() => Pixels::Rgb(other.to_rgb8()),
            other => Pixels::Gray(other.to_luma8()),
        };
        Self { pixels, resolution }
    }

    pub fn gray(image: GrayImage, resolution: Resolution) -> Self {
        Self {
            pixels: Pixels::Gray(image),
            resolution,
        }
    }

    pub fn rgb(image: RgbImage, resolution: Resolution) -> Self {
        Self {
            pixels: Pixels::Rgb(image),
            resolution,
        }
    }

    /// Build an image from interleaved samples (`channels` must be 1 or 3).
    pub fn from_samples(
        width: u32,
        height: u32,
        channels: usize,
        samples: Vec<u8>,
        resolution: Resolution,
    ) -> Result<Self, ScanliftError> {
        let pixels = match channels {
            1 => GrayImage::from_raw(width, height, samples).map(Pixels::Gray),
            3 => RgbImage::from_raw(width, height, samples).map(Pixels::Rgb),
            _ => {
                return Err(ScanliftError::ImageError(format!(
                    "unsupported channel count {}",
                    channels
                )));
            }
        };
        let pixels = pixels.ok_or_else(|| {
            ScanliftError::ImageError(format!(
                "sample buffer too small for {}x{}x{}",
                width, height, channels
            ))
        })?;
        Ok(Self { pixels, resolution })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        match &self.pixels {
            Pixels::Gray(img) => img.width(),
            Pixels::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match &self.pixels {
            Pixels::Gray(img) => img.height(),
            Pixels::Rgb(img) => img.height(),
        }
    }

    /// 1 for grayscale, 3 for RGB.
    pub fn channels(&self) -> usize {
        match &self.pixels {
            Pixels::Gray(_) => 1,
            Pixels::Rgb(_) => 3,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u8] {
        match &self.pixels {
            Pixels::Gray(img) => img.as_raw(),
            Pixels::Rgb(img) => img.as_raw(),
        }
    }

    /// A new image with the same shape and resolution but different samples.
    ///
    /// Panics if `samples` does not have exactly `width * height * channels`
    /// entries; callers derive it from [`RasterImage::samples`].
    pub(crate) fn with_samples(&self, samples: Vec<u8>) -> Self {
        assert_eq!(
            samples.len(),
            self.samples().len(),
            "replacement samples must keep the image shape"
        );
        let (width, height) = (self.width(), self.height());
        let pixels = match &self.pixels {
            Pixels::Gray(_) => GrayImage::from_raw(width, height, samples).map(Pixels::Gray),
            Pixels::Rgb(_) => RgbImage::from_raw(width, height, samples).map(Pixels::Rgb),
        };
        Self {
            pixels: pixels.expect("buffer length checked above"),
            resolution: self.resolution,
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as a lossless PNG carrying the resolution in its pHYs chunk.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanliftError> {
        codec::encode_png(self)
    }
}
