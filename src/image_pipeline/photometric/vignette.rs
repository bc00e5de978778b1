//! Multiplicative vignette field at raw resolution.

use std::path::Path;

use tracing::debug;
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::tiff::read_gray_tiff;

/// Forward and inverse vignette factors, normalized to 1.0 at the image
/// centre.
#[derive(Debug, Clone, PartialEq)]
pub struct VignetteField {
    width: usize,
    height: usize,
    map: Vec<f32>,
    map_inv: Vec<f32>,
}

impl VignetteField {
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || values.len() != width * height {
            return Err(UndistortError::InvalidVignette(format!(
                "{} values for a {}x{} image",
                values.len(),
                width,
                height
            )));
        }
        if let Some(i) = values.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(UndistortError::InvalidVignette(format!(
                "entry {} at ({}, {}) is not strictly positive",
                i,
                i % width,
                i / width
            )));
        }

        let centre = values[(height / 2) * width + width / 2];
        let map: Vec<f32> = values.into_iter().map(|v| v / centre).collect();
        let map_inv = map.iter().map(|v| 1.0 / v).collect();

        Ok(Self {
            width,
            height,
            map,
            map_inv,
        })
    }

    /// Loads a single-channel TIFF and checks it against the raw geometry.
    pub fn from_tiff<P: AsRef<Path>>(path: P, width: usize, height: usize) -> Result<Self> {
        let path = path.as_ref();
        let image = read_gray_tiff(path)?;
        if image.width != width || image.height != height {
            return Err(UndistortError::DimensionMismatch {
                expected: (width, height),
                found: (image.width, image.height),
            });
        }
        debug!(path = %path.display(), width, height, "Read vignette calibration");
        Self::from_values(width, height, image.data)
    }

    /// No falloff.
    pub fn flat(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            map: vec![1.0; width * height],
            map_inv: vec![1.0; width * height],
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn factors(&self) -> &[f32] {
        &self.map
    }

    pub fn inverse_factors(&self) -> &[f32] {
        &self.map_inv
    }
}
