//! Inverse camera response (G): raw intensity level to irradiance.

use std::path::Path;

use tracing::debug;
use crate::image_pipeline::common::error::{Result, UndistortError};

/// Fewest entries a response calibration may have (8-bit sensors).
pub const MIN_RESPONSE_ENTRIES: usize = 256;

/// Irradiance produced for the brightest level.
pub const IRRADIANCE_MAX: f32 = 255.0;

/// Monotone lookup table normalized to `[0, IRRADIANCE_MAX]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseResponse {
    g: Vec<f32>,
}

impl InverseResponse {
    /// Validates and normalizes raw calibration values.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.len() < MIN_RESPONSE_ENTRIES {
            return Err(UndistortError::InvalidResponse(format!(
                "got {} entries, expected at least {}",
                values.len(),
                MIN_RESPONSE_ENTRIES
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(UndistortError::InvalidResponse(format!(
                "entry {i} is not finite"
            )));
        }
        if let Some(i) = values.windows(2).position(|w| w[1] < w[0]) {
            return Err(UndistortError::InvalidResponse(format!(
                "not monotonically non-decreasing at entry {}",
                i + 1
            )));
        }

        let min = values[0];
        let max = values[values.len() - 1];
        if max <= min {
            return Err(UndistortError::InvalidResponse(
                "response is flat".to_string(),
            ));
        }

        let g = values
            .iter()
            .map(|&v| (IRRADIANCE_MAX as f64 * (v - min) / (max - min)) as f32)
            .collect();
        Ok(Self { g })
    }

    /// Reads the first line of a gamma calibration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            UndistortError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let line = contents.lines().next().unwrap_or_default();
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|e| {
                    UndistortError::MalformedCalibration(format!(
                        "{}: bad response value '{}': {}",
                        path.display(),
                        token,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(path = %path.display(), entries = values.len(), "Read response calibration");
        Self::from_values(&values)
    }

    /// Linear response with `depth` entries.
    pub fn identity(depth: usize) -> Self {
        let depth = depth.max(2);
        let last = (depth - 1) as f32;
        Self {
            g: (0..depth).map(|i| IRRADIANCE_MAX * i as f32 / last).collect(),
        }
    }

    /// Number of table entries (GDepth).
    pub fn depth(&self) -> usize {
        self.g.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.g
    }

    #[inline]
    pub fn at(&self, index: usize) -> f32 {
        self.g[index.min(self.g.len() - 1)]
    }

    /// Linear interpolation at a fractional table position.
    #[inline]
    pub fn interpolate(&self, position: f32) -> f32 {
        let last = self.g.len() - 1;
        if position <= 0.0 {
            return self.g[0];
        }
        let i = (position as usize).min(last - 1);
        let a = (position - i as f32).min(1.0);
        self.g[i] * (1.0 - a) + self.g[i + 1] * a
    }

    /// Fractional table position whose value is `value`.
    ///
    /// Plateaus resolve to their last index.
    pub fn invert(&self, value: f32) -> f32 {
        let last = self.g.len() - 1;
        if value <= self.g[0] {
            return 0.0;
        }
        if value >= self.g[last] {
            return last as f32;
        }
        let hi = self.g.partition_point(|&g| g <= value);
        let lo = hi - 1;
        let span = self.g[hi] - self.g[lo];
        lo as f32 + (value - self.g[lo]) / span
    }
}
