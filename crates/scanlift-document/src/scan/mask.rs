// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background/content mask — a neighbourhood brightness density thresholded
// into 0 (uniform paper background) and 255 (content or edge).

use image::{GrayImage, Luma};

use crate::raster::buffer::{Pixels, RasterImage};

/// Eight unit weights around a zero centre: sums the neighbours of a pixel.
pub const RING_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 0, 1], [1, 1, 1]];

/// Tuning constants of the mask builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskConfig {
    /// Every gray value is divided by this before the convolution.
    pub divisor: u32,
    /// 3x3 convolution weights, applied without normalisation.
    pub kernel: [[u32; 3]; 3],
    /// Densities below this are background candidates.
    pub cutoff: u8,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            divisor: 8,
            kernel: RING_KERNEL,
            cutoff: 240,
        }
    }
}

/// Binary mask: 255 where the neighbourhood holds content, 0 on background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pixels: GrayImage,
}

impl Mask {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels.get_pixel(x, y).0[0]
    }

    /// Row-major mask values.
    pub fn values(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

/// Build the mask with the default tuning.
pub fn build_mask(image: &RasterImage) -> Mask {
    build_mask_with(image, &MaskConfig::default())
}

/// Build the mask of `image`.
///
/// The divided gray values are convolved with `config.kernel` (reflect-101
/// border), truncated to u8 with modulo-256 wraparound, then relabelled.
pub fn build_mask_with(image: &RasterImage, config: &MaskConfig) -> Mask {
    let gray = luma(image);
    let mut density = neighbourhood_density(&gray, config);
    relabel(&mut density, config.cutoff);
    Mask { pixels: density }
}

/// Grayscale view using the fixed-point BT.601 weights
/// `(R*4899 + G*9617 + B*1868 + 2^13) >> 14`.
fn luma(image: &RasterImage) -> GrayImage {
    match image.pixels() {
        Pixels::Gray(gray) => gray.clone(),
        Pixels::Rgb(rgb) => GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
            Luma([y as u8])
        }),
    }
}

/// Convolve `value / divisor` with the kernel.
///
/// The quotient is taken on the weighted sum: with integer weights,
/// `trunc(sum(w * v / d))` equals `sum(w * v) / d` exactly.
fn neighbourhood_density(gray: &GrayImage, config: &MaskConfig) -> GrayImage {
    let (width, height) = gray.dimensions();
    let divisor = config.divisor.max(1);
    GrayImage::from_fn(width, height, |x, y| {
        let mut sum: u32 = 0;
        for (ky, row) in config.kernel.iter().enumerate() {
            let sy = reflect101(y as i64 + ky as i64 - 1, height);
            for (kx, &weight) in row.iter().enumerate() {
                if weight == 0 {
                    continue;
                }
                let sx = reflect101(x as i64 + kx as i64 - 1, width);
                sum += weight * gray.get_pixel(sx, sy).0[0] as u32;
            }
        }
        // Wraps modulo 256 like an unsigned 8-bit cast.
        Luma([(sum / divisor) as u8])
    })
}

/// Border index mapping `gfedcb|abcdefgh|gfedcba`.
fn reflect101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let mut i = index;
    while i < 0 || i >= len {
        i = if i < 0 { -i } else { 2 * len - 2 - i };
    }
    i as u32
}

/// The four-step relabelling. Each step sees the output of the previous one.
fn relabel(values: &mut [u8], cutoff: u8) {
    for v in values.iter_mut() {
        if *v < cutoff {
            *v = 0;
        }
    }
    for v in values.iter_mut() {
        if *v != 0 {
            *v = 255;
        }
    }
    for v in values.iter_mut() {
        if *v == 0 {
            *v = 25;
        }
    }
    for v in values.iter_mut() {
        if *v == 255 {
            *v = 0;
        }
    }
    for v in values.iter_mut() {
        if *v == 25 {
            *v = 255;
        }
    }
}
