// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement — background mask, contrast composite, unsharp sharpening,
// and the pipeline that chains them.

pub mod contrast;
pub mod enhance;
pub mod mask;
pub mod sharpen;

pub use contrast::{adjust_contrast, autocontrast, composite};
pub use enhance::{ScanEnhancer, enhance};
pub use mask::{Mask, MaskConfig, build_mask, build_mask_with};
pub use sharpen::{gaussian_blur, sharpen};
