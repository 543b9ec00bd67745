// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scanlift-document crate. Covers the full
// enhancement pipeline and the blur that dominates it, on synthetic scans.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma, Rgb, RgbImage};

use scanlift_core::{EnhanceParams, Resolution};
use scanlift_document::scan::gaussian_blur;
use scanlift_document::{RasterImage, ScanEnhancer};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Off-white paper with horizontal dark "text" bands every 16 rows.
fn synthetic_gray(side: u32) -> RasterImage {
    let img = GrayImage::from_fn(side, side, |x, y| {
        if y % 16 < 4 && x % 64 < 48 {
            Luma([35u8])
        } else {
            Luma([221u8])
        }
    });
    RasterImage::gray(img, Resolution::new(300, 300))
}

fn synthetic_rgb(side: u32) -> RasterImage {
    let img = RgbImage::from_fn(side, side, |x, y| {
        if y % 16 < 4 && x % 64 < 48 {
            Rgb([30u8, 40, 90])
        } else {
            Rgb([232u8, 226, 210])
        }
    });
    RasterImage::rgb(img, Resolution::new(300, 300))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full mask + contrast + sharpen pipeline at default parameters.
fn bench_enhance(c: &mut Criterion) {
    let enhancer = match ScanEnhancer::new(EnhanceParams::default()) {
        Ok(enhancer) => enhancer,
        Err(err) => panic!("default parameters rejected: {err}"),
    };
    let gray = synthetic_gray(256);
    let rgb = synthetic_rgb(256);

    c.bench_function("enhance gray (256x256)", |b| {
        b.iter(|| black_box(enhancer.enhance(black_box(&gray))));
    });
    c.bench_function("enhance rgb (256x256)", |b| {
        b.iter(|| black_box(enhancer.enhance(black_box(&rgb))));
    });
}

fn bench_blur(c: &mut Criterion) {
    let rgb = synthetic_rgb(256);
    c.bench_function("gaussian_blur r=1.4 rgb (256x256)", |b| {
        b.iter(|| black_box(gaussian_blur(black_box(&rgb), 1.4)));
    });
}

criterion_group!(benches, bench_enhance, bench_blur);
criterion_main!(benches);
