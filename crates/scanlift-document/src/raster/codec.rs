// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolution-aware encoding: PNG output with a pHYs chunk via the `png`
// crate, and density lookup for PNG (pHYs) and JPEG (JFIF APP0) inputs.

use std::io::Cursor;

use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};
use scanlift_core::Resolution;
use scanlift_core::error::ScanliftError;

use crate::raster::buffer::RasterImage;

const METERS_PER_INCH: f64 = 0.0254;
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Encode `image` as an 8-bit PNG whose pHYs chunk records its resolution.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, ScanliftError> {
    let color = match image.channels() {
        1 => ColorType::Grayscale,
        _ => ColorType::Rgb,
    };
    let resolution = image.resolution();

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(color);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_pixel_dims(Some(PixelDimensions {
        xppu: dpi_to_ppm(resolution.x),
        yppu: dpi_to_ppm(resolution.y),
        unit: Unit::Meter,
    }));

    let mut writer = encoder.write_header().map_err(|err| {
        ScanliftError::ImageError(format!("PNG header encoding failed: {}", err))
    })?;
    writer.write_image_data(image.samples()).map_err(|err| {
        ScanliftError::ImageError(format!("PNG encoding failed: {}", err))
    })?;
    writer.finish().map_err(|err| {
        ScanliftError::ImageError(format!("PNG encoding failed: {}", err))
    })?;

    Ok(buffer)
}

/// Resolution recorded in encoded image bytes, if any.
///
/// Understands PNG pHYs chunks (metre units only) and JFIF density fields.
pub fn read_resolution(data: &[u8]) -> Option<Resolution> {
    if data.starts_with(PNG_SIGNATURE) {
        png_resolution(data)
    } else if data.starts_with(&[0xFF, 0xD8]) {
        jfif_resolution(data)
    } else {
        None
    }
}

fn png_resolution(data: &[u8]) -> Option<Resolution> {
    let reader = png::Decoder::new(Cursor::new(data)).read_info().ok()?;
    let dims = reader.info().pixel_dims?;
    match dims.unit {
        Unit::Meter => Some(Resolution::new(ppm_to_dpi(dims.xppu), ppm_to_dpi(dims.yppu))),
        Unit::Unspecified => None,
    }
}

/// Density from the JFIF APP0 segment of a JPEG stream.
///
/// Units 1 are dots per inch, units 2 dots per centimetre; units 0 only
/// define an aspect ratio and yield `None`.
pub fn jfif_resolution(data: &[u8]) -> Option<Resolution> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Start of scan: header segments are over.
        if marker == 0xDA {
            return None;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let body = data.get(pos + 4..pos + 2 + length)?;
        if marker == 0xE0 && body.len() >= 12 && body.starts_with(b"JFIF\0") {
            let units = body[7];
            let x = u16::from_be_bytes([body[8], body[9]]) as u32;
            let y = u16::from_be_bytes([body[10], body[11]]) as u32;
            if x == 0 || y == 0 {
                return None;
            }
            return match units {
                1 => Some(Resolution::new(x, y)),
                2 => Some(Resolution::new(dpcm_to_dpi(x), dpcm_to_dpi(y))),
                _ => None,
            };
        }
        pos += 2 + length;
    }
    None
}

fn dpi_to_ppm(dpi: u32) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}

fn ppm_to_dpi(ppm: u32) -> u32 {
    (ppm as f64 * METERS_PER_INCH).round() as u32
}

fn dpcm_to_dpi(dpcm: u32) -> u32 {
    (dpcm as f64 * 2.54).round() as u32
}
