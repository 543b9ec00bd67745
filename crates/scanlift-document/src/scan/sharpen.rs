// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unsharp-mask sharpening. The Gaussian is approximated by three passes of an
// extended box blur with a fractional radius, first along rows, then along
// columns; all blur arithmetic is 8.24 fixed point.

use crate::raster::buffer::RasterImage;

/// Box-blur passes per axis used to approximate a Gaussian.
const PASSES: u32 = 3;

/// Sharpen `image` with an unsharp mask.
///
/// Where `|original - blurred| > threshold` the sample becomes
/// `clamp(original + diff * percent / 100)` (integer division truncating
/// toward zero); elsewhere it is left unchanged. A radius of 0 is a no-op.
pub fn sharpen(image: &RasterImage, radius: f32, percent: i32, threshold: i32) -> RasterImage {
    let blurred = gaussian_blur(image, radius);
    let samples = image
        .samples()
        .iter()
        .zip(blurred.samples())
        .map(|(&orig, &blur)| {
            let diff = orig as i32 - blur as i32;
            if diff.abs() > threshold {
                (orig as i32 + diff * percent / 100).clamp(0, 255) as u8
            } else {
                orig
            }
        })
        .collect();
    image.with_samples(samples)
}

/// Approximate a Gaussian blur of standard radius `radius`.
pub fn gaussian_blur(image: &RasterImage, radius: f32) -> RasterImage {
    let box_radius = gaussian_box_radius(radius, PASSES);
    if box_radius == 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let width = image.width() as usize;
    let height = image.height() as usize;
    let channels = image.channels();
    let mut samples = image.samples().to_vec();

    for axis in [Axis::Rows, Axis::Columns] {
        for _ in 0..PASSES {
            blur_axis(&mut samples, width, height, channels, box_radius, axis);
        }
    }

    image.with_samples(samples)
}

/// Fractional box radius whose `passes`-fold convolution matches the
/// variance of a Gaussian with the given radius.
pub fn gaussian_box_radius(radius: f32, passes: u32) -> f32 {
    let sigma2 = radius * radius / passes as f32;
    let big_l = (12.0 * sigma2 as f64 + 1.0).sqrt() as f32;
    let l = ((big_l - 1.0) / 2.0).floor();
    let mut a = (2.0 * l + 1.0) * (l * (l + 1.0) - 3.0 * sigma2);
    a /= 6.0 * (sigma2 - (l + 1.0) * (l + 1.0));
    l + a
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Rows,
    Columns,
}

fn blur_axis(
    samples: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    box_radius: f32,
    axis: Axis,
) {
    // (number of lines, line length, sample step along a line, offset between lines)
    let (lines, len, step, line_offset) = match axis {
        Axis::Rows => (height, width, channels, width * channels),
        Axis::Columns => (width, height, width * channels, channels),
    };
    let kernel = BoxKernel::new(box_radius, len);
    let mut input = vec![0u8; len];
    let mut output = vec![0u8; len];

    for line in 0..lines {
        for channel in 0..channels {
            let base = line * line_offset + channel;
            for (i, value) in input.iter_mut().enumerate() {
                *value = samples[base + i * step];
            }
            kernel.apply(&input, &mut output);
            for (i, &value) in output.iter().enumerate() {
                samples[base + i * step] = value;
            }
        }
    }
}

/// One-dimensional extended box filter: `2r+1` full-weight taps plus a
/// fractional weight on the two taps just outside them. Edges replicate the
/// first and last samples.
#[derive(Debug, Clone, Copy)]
struct BoxKernel {
    radius: usize,
    /// Weight of each full tap, 8.24 fixed point.
    ww: u32,
    /// Weight of each fractional tap.
    fw: u32,
    edge_a: usize,
    edge_b: usize,
}

impl BoxKernel {
    fn new(box_radius: f32, len: usize) -> Self {
        let radius = box_radius as usize;
        let ww = ((1u32 << 24) as f32 / (box_radius * 2.0 + 1.0)) as u32;
        let fw = ((1u32 << 24) - (radius as u32 * 2 + 1) * ww) / 2;
        Self {
            radius,
            ww,
            fw,
            edge_a: (radius + 1).min(len),
            edge_b: len.saturating_sub(radius + 1),
        }
    }

    fn apply(&self, input: &[u8], output: &mut [u8]) {
        let Self {
            radius,
            ww,
            fw,
            edge_a,
            edge_b,
        } = *self;
        let last = input.len() - 1;
        let at = |i: usize| input[i] as i64;

        // Window sum for the virtual pixel just left of the line.
        let mut acc = at(0) * (radius as i64 + 1);
        for x in 0..edge_a.saturating_sub(1) {
            acc += at(x);
        }
        acc += at(last) * (radius as i64 + 1 - edge_a as i64);

        let mut emit = |x: usize, acc: i64, left: usize, right: usize| {
            let bulk = acc as u64 * ww as u64 + (at(left) + at(right)) as u64 * fw as u64;
            output[x] = ((bulk + (1 << 23)) >> 24) as u8;
        };

        if edge_a <= edge_b {
            for x in 0..edge_a {
                acc += at(x + radius) - at(0);
                emit(x, acc, 0, x + radius + 1);
            }
            for x in edge_a..edge_b {
                acc += at(x + radius) - at(x - radius - 1);
                emit(x, acc, x - radius - 1, x + radius + 1);
            }
            for x in edge_b..=last {
                acc += at(last) - at(x - radius - 1);
                emit(x, acc, x - radius - 1, last);
            }
        } else {
            for x in 0..edge_b {
                acc += at(x + radius) - at(0);
                emit(x, acc, 0, x + radius + 1);
            }
            for x in edge_b..edge_a {
                acc += at(last) - at(0);
                emit(x, acc, 0, last);
            }
            for x in edge_a..=last {
                acc += at(last) - at(x - radius - 1);
                emit(x, acc, x - radius - 1, last);
            }
        }
    }
}
