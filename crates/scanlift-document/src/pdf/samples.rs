// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sample unpacking — packed PDF image rows to 8-bit gray or RGB pixels,
// including palette expansion and CMYK conversion.

use scanlift_core::error::ScanliftError;

/// Device colour families an image's samples are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorFamily {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorFamily {
    pub(crate) fn components(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }

    /// Channels of the extracted pixels. CMYK comes out as RGB.
    pub(crate) fn output_channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Cmyk => 3,
        }
    }
}

/// Colour space of an image XObject, as far as extraction understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ColorSpace {
    Device(ColorFamily),
    /// Palette image: each sample indexes `lookup`, which holds `hival + 1`
    /// entries in the `base` family.
    Indexed {
        base: ColorFamily,
        hival: u8,
        lookup: Vec<u8>,
    },
}

impl ColorSpace {
    /// Components per sample in the stream.
    pub(crate) fn components(&self) -> usize {
        match self {
            Self::Device(family) => family.components(),
            Self::Indexed { .. } => 1,
        }
    }

    pub(crate) fn output_channels(&self) -> usize {
        match self {
            Self::Device(family) | Self::Indexed { base: family, .. } => family.output_channels(),
        }
    }

    pub(crate) fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }

    /// Upper end of the default `/Decode` range for `bits`-deep samples.
    pub(crate) fn decode_max(&self, bits: u8) -> f32 {
        match self {
            Self::Device(_) => 1.0,
            Self::Indexed { .. } => ((1u32 << bits) - 1) as f32,
        }
    }
}

/// Geometry of a packed sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SampleLayout {
    pub width: usize,
    pub height: usize,
    /// Bits per component: 1, 2, 4, 8 or 16.
    pub bits: u8,
}

impl SampleLayout {
    /// Bytes per row; every row starts on a byte boundary.
    pub(crate) fn stride(&self, components: usize) -> usize {
        (self.width * components * self.bits as usize).div_ceil(8)
    }

    /// Bytes the stream must hold for `components` per pixel.
    pub(crate) fn byte_len(&self, components: usize) -> usize {
        self.stride(components) * self.height
    }
}

/// Turn a decoded sample stream into interleaved 8-bit gray or RGB pixels.
///
/// `inverted` holds one flag per stream component, set where `/Decode`
/// swaps the range ends.
pub(crate) fn to_pixels(
    space: &ColorSpace,
    data: &[u8],
    layout: SampleLayout,
    inverted: &[bool],
) -> Result<Vec<u8>, ScanliftError> {
    let components = space.components();
    let mut samples = unpack(data, layout, components, !space.is_indexed())?;

    if inverted.iter().any(|&flag| flag) {
        let top = match space {
            ColorSpace::Device(_) => u8::MAX,
            ColorSpace::Indexed { .. } => ((1u16 << layout.bits) - 1) as u8,
        };
        for (i, sample) in samples.iter_mut().enumerate() {
            if inverted.get(i % components).copied().unwrap_or(false) {
                *sample = top - *sample;
            }
        }
    }

    let pixels = match space {
        ColorSpace::Device(ColorFamily::Cmyk) => cmyk_to_rgb(&samples),
        ColorSpace::Device(_) => samples,
        ColorSpace::Indexed {
            base,
            hival,
            lookup,
        } => {
            let expanded = expand_palette(&samples, *base, *hival, lookup)?;
            if *base == ColorFamily::Cmyk {
                cmyk_to_rgb(&expanded)
            } else {
                expanded
            }
        }
    };
    Ok(pixels)
}

/// Unpack rows of `components`-sample pixels to one byte per sample.
///
/// With `scale`, sub-byte values are stretched to `0..=255`; without it they
/// stay raw (palette indices). 16-bit samples keep their high byte.
pub(crate) fn unpack(
    data: &[u8],
    layout: SampleLayout,
    components: usize,
    scale: bool,
) -> Result<Vec<u8>, ScanliftError> {
    let stride = layout.stride(components);
    let needed = layout.byte_len(components);
    if stride == 0 || data.len() < needed {
        return Err(ScanliftError::Extract(format!(
            "{} sample bytes, expected {}",
            data.len(),
            needed
        )));
    }

    let per_row = layout.width * components;
    let mut out = Vec::with_capacity(per_row * layout.height);
    for row in data.chunks_exact(stride).take(layout.height) {
        match layout.bits {
            8 => out.extend_from_slice(&row[..per_row]),
            16 => out.extend(row.chunks_exact(2).take(per_row).map(|pair| pair[0])),
            bits @ (1 | 2 | 4) => {
                let max = (1u16 << bits) - 1;
                let per_byte = 8 / bits as usize;
                for i in 0..per_row {
                    let shift = 8 - bits as usize * (i % per_byte + 1);
                    let value = u16::from(row[i / per_byte] >> shift) & max;
                    out.push(if scale {
                        (value * 255 / max) as u8
                    } else {
                        value as u8
                    });
                }
            }
            other => {
                return Err(ScanliftError::Extract(format!(
                    "unsupported bits per component {}",
                    other
                )));
            }
        }
    }
    Ok(out)
}

/// Replace each index with its palette entry. Indices above `hival` use the
/// last entry.
pub(crate) fn expand_palette(
    indices: &[u8],
    base: ColorFamily,
    hival: u8,
    lookup: &[u8],
) -> Result<Vec<u8>, ScanliftError> {
    let width = base.components();
    let entries = hival as usize + 1;
    if lookup.len() < entries * width {
        return Err(ScanliftError::Extract(format!(
            "palette holds {} bytes, expected {}",
            lookup.len(),
            entries * width
        )));
    }

    let mut out = Vec::with_capacity(indices.len() * width);
    for &index in indices {
        let start = index.min(hival) as usize * width;
        out.extend_from_slice(&lookup[start..start + width]);
    }
    Ok(out)
}

/// CMYK to RGB with the ink-times-key rounding Pillow uses.
pub(crate) fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() / 4 * 3);
    for pixel in samples.chunks_exact(4) {
        let nk = 255 - u32::from(pixel[3]);
        for &ink in &pixel[..3] {
            out.push((nk - muldiv255(u32::from(ink), nk)) as u8);
        }
    }
    out
}

/// `a * b / 255`, rounded.
fn muldiv255(a: u32, b: u32) -> u32 {
    let tmp = a * b + 128;
    ((tmp >> 8) + tmp) >> 8
}
