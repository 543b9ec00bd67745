// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster images — decoded pixel buffers and resolution-aware encoding.

pub mod buffer;
pub mod codec;

pub use buffer::{Pixels, RasterImage};
