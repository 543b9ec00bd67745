// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast compositor — percentile auto-stretch, a contrast blend against the
// mean luminance, and the mask composite that whitens uniform background.

use image::{ImageBuffer, Pixel};
use imageproc::stats::histogram;

use crate::raster::buffer::{Pixels, RasterImage};
use crate::scan::mask::Mask;

/// Percentage of samples clipped at each tail by the auto-stretch.
pub const AUTOCONTRAST_CUTOFF: u32 = 1;

/// Stretch the contrast of `original`, then merge it through `mask`.
///
/// Per channel: `(!mask).wrapping_add(contrasted & mask)`. Background
/// (mask 0) becomes 255; content (mask 255) takes the contrasted value.
///
/// # Panics
///
/// Panics if the mask and the image do not have the same dimensions.
pub fn composite(original: &RasterImage, mask: &Mask, contrast: f32) -> RasterImage {
    assert_eq!(
        (original.width(), original.height()),
        (mask.width(), mask.height()),
        "mask dimensions must match the image"
    );

    let contrasted = adjust_contrast(&autocontrast(original, AUTOCONTRAST_CUTOFF), contrast);
    let channels = contrasted.channels();
    let samples = contrasted
        .samples()
        .chunks_exact(channels)
        .zip(mask.values())
        .flat_map(|(pixel, &m)| pixel.iter().map(move |&c| (!m).wrapping_add(c & m)))
        .collect();

    contrasted.with_samples(samples)
}

// -- Auto-stretch -------------------------------------------------------------

/// Stretch every channel so that, after dropping `cutoff_percent` of the
/// samples at each end of its histogram, the remaining range maps onto 0..=255.
pub fn autocontrast(image: &RasterImage, cutoff_percent: u32) -> RasterImage {
    match image.pixels() {
        Pixels::Gray(gray) => RasterImage::gray(stretch(gray, cutoff_percent), image.resolution()),
        Pixels::Rgb(rgb) => RasterImage::rgb(stretch(rgb, cutoff_percent), image.resolution()),
    }
}

fn stretch<P>(image: &ImageBuffer<P, Vec<u8>>, cutoff_percent: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let luts: Vec<[u8; 256]> = histogram(image)
        .channels
        .iter()
        .map(|counts| stretch_lut(counts, cutoff_percent))
        .collect();

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for (value, lut) in pixel.channels_mut().iter_mut().zip(&luts) {
            *value = lut[*value as usize];
        }
    }
    out
}

/// Lookup table for one channel histogram.
fn stretch_lut(counts: &[u32; 256], cutoff_percent: u32) -> [u8; 256] {
    let mut h: [u64; 256] = counts.map(u64::from);
    let total: u64 = h.iter().sum();
    let cut = total * cutoff_percent as u64 / 100;

    trim_tail(h.iter_mut(), cut);
    trim_tail(h.iter_mut().rev(), cut);

    let lo = h.iter().position(|&c| c != 0).unwrap_or(255);
    let hi = h.iter().rposition(|&c| c != 0).unwrap_or(0);

    let mut lut = [0u8; 256];
    if hi <= lo {
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = i as u8;
        }
        return lut;
    }

    let scale = 255.0 / (hi - lo) as f64;
    let offset = -(lo as f64) * scale;
    for (i, entry) in lut.iter_mut().enumerate() {
        let v = (i as f64 * scale + offset) as i64;
        *entry = v.clamp(0, 255) as u8;
    }
    lut
}

/// Remove `cut` samples from the bins in iteration order.
fn trim_tail<'a>(bins: impl Iterator<Item = &'a mut u64>, mut cut: u64) {
    for bin in bins {
        if cut > *bin {
            cut -= *bin;
            *bin = 0;
        } else {
            *bin -= cut;
            break;
        }
    }
}

// -- Contrast blend -----------------------------------------------------------

/// Blend every sample against the rounded mean luminance:
/// `mean + factor * (v - mean)`, truncated and clamped to 0..=255.
///
/// A factor of 1.0 is the identity, 0.0 a flat gray image.
pub fn adjust_contrast(image: &RasterImage, factor: f32) -> RasterImage {
    let mean = mean_luminance(image);
    let samples = image
        .samples()
        .iter()
        .map(|&v| {
            let temp = mean as f32 + factor * (v as i32 - mean as i32) as f32;
            if temp <= 0.0 {
                0
            } else if temp >= 255.0 {
                255
            } else {
                temp as u8
            }
        })
        .collect();
    image.with_samples(samples)
}

/// Mean of the luminance plane, rounded half up.
///
/// RGB luminance uses `(R*19595 + G*38470 + B*7471 + 0x8000) >> 16`.
fn mean_luminance(image: &RasterImage) -> u8 {
    let (sum, count) = match image.pixels() {
        Pixels::Gray(gray) => (gray.as_raw().iter().map(|&v| v as u64).sum::<u64>(), gray.len()),
        Pixels::Rgb(rgb) => {
            let sum = rgb
                .pixels()
                .map(|p| {
                    let [r, g, b] = p.0;
                    (r as u64 * 19595 + g as u64 * 38470 + b as u64 * 7471 + 0x8000) >> 16
                })
                .sum::<u64>();
            (sum, rgb.len() / 3)
        }
    };
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64 + 0.5) as u8
}
