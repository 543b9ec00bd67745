// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement and batch configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanliftError};

/// Suffix appended to the file stem of every enhanced document.
pub const DEFAULT_SUFFIX: &str = "_enhanced";

/// Parameters of the contrast + unsharp-mask pipeline.
///
/// Built once per batch run and shared read-only across every image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// Contrast factor applied after the percentile stretch (1.0 is a no-op).
    pub contrast: f32,
    /// Gaussian radius of the unsharp mask, in pixels.
    pub radius: f32,
    /// Sharpening strength as a percentage of the detail layer.
    pub percent: i32,
    /// Minimum per-channel difference before sharpening is applied.
    pub threshold: i32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            contrast: 2.0,
            radius: 1.4,
            percent: 100,
            threshold: 0,
        }
    }
}

impl EnhanceParams {
    /// Check the ranges: contrast > 0, radius >= 0, percent >= 0, threshold >= 0.
    pub fn validate(&self) -> Result<()> {
        if !self.contrast.is_finite() || self.contrast <= 0.0 {
            return Err(ScanliftError::InvalidParams(format!(
                "contrast must be a positive number, got {}",
                self.contrast
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(ScanliftError::InvalidParams(format!(
                "radius must be zero or positive, got {}",
                self.radius
            )));
        }
        if self.percent < 0 {
            return Err(ScanliftError::InvalidParams(format!(
                "percent must be zero or positive, got {}",
                self.percent
            )));
        }
        if self.threshold < 0 {
            return Err(ScanliftError::InvalidParams(format!(
                "threshold must be zero or positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Enhancement parameters applied to every embedded image.
    pub params: EnhanceParams,
    /// Output file suffix; files whose stem already ends with it are skipped.
    pub suffix: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            params: EnhanceParams::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl BatchConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the parameters and the suffix.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if self.suffix.is_empty() {
            return Err(ScanliftError::InvalidParams(
                "output suffix must not be empty".to_string(),
            ));
        }
        if self.suffix.contains(['/', '\\']) {
            return Err(ScanliftError::InvalidParams(format!(
                "output suffix must not contain path separators: {:?}",
                self.suffix
            )));
        }
        Ok(())
    }
}
