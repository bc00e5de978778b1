//! Rectified camera matrix selection.

use nalgebra::Matrix3;
use tracing::{debug, warn};
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::distortion::{DistortionModel, LensModel};

const SWEEP_SAMPLES: usize = 100_000;
const SWEEP_EXTENT: f64 = 5.0;
const SWEEP_MARGIN: f64 = 1.01;
const SHRINK_FACTOR: f64 = 0.995;
const MAX_SHRINK_ITERATIONS: usize = 500;

/// Normalized rectangle `[min_x, max_x] x [min_y, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Bounds {
    fn to_camera_matrix(self, width: usize, height: usize) -> Matrix3<f64> {
        let fx = (width - 1) as f64 / (self.max_x - self.min_x);
        let fy = (height - 1) as f64 / (self.max_y - self.min_y);
        Matrix3::new(
            fx, 0.0, -self.min_x * fx,
            0.0, fy, -self.min_y * fy,
            0.0, 0.0, 1.0,
        )
    }

    fn lerp_x(&self, t: f64) -> f64 {
        self.min_x + (self.max_x - self.min_x) * t
    }

    fn lerp_y(&self, t: f64) -> f64 {
        self.min_y + (self.max_y - self.min_y) * t
    }
}

fn in_raw_image(model: &LensModel, x: f64, y: f64, raw: (usize, usize)) -> bool {
    let (u, v) = model.distort_point(x, y);
    u > 0.0 && v > 0.0 && u < (raw.0 - 1) as f64 && v < (raw.1 - 1) as f64
}

/// First and last in-bounds sample of a sweep along one normalized axis.
fn sweep_axis(model: &LensModel, raw: (usize, usize), horizontal: bool) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for i in 0..SWEEP_SAMPLES {
        let t = (i as f64 / SWEEP_SAMPLES as f64 - 0.5) * 2.0 * SWEEP_EXTENT;
        let (x, y) = if horizontal { (t, 0.0) } else { (0.0, t) };
        if in_raw_image(model, x, y, raw) {
            range = Some(match range {
                None => (t, t),
                Some((min, _)) => (min, t),
            });
        }
    }
    range
}

/// Largest axis-aligned rectangle whose every output pixel lands strictly
/// inside the raw image.
///
/// The rectangle starts from the in-bounds extent of the two image axes,
/// inflated by one percent, and its violating edges are shrunk by half a
/// percent per iteration until every border sample is in bounds.
pub(super) fn crop(model: &LensModel, raw: (usize, usize), output: (usize, usize)) -> Result<Matrix3<f64>> {
    let (width, height) = output;

    let (min_x, max_x) = sweep_axis(model, raw, true)
        .ok_or_else(|| UndistortError::OptimalK("horizontal axis never maps inside the raw image".to_string()))?;
    let (min_y, max_y) = sweep_axis(model, raw, false)
        .ok_or_else(|| UndistortError::OptimalK("vertical axis never maps inside the raw image".to_string()))?;

    let mut bounds = Bounds {
        min_x: min_x * SWEEP_MARGIN,
        max_x: max_x * SWEEP_MARGIN,
        min_y: min_y * SWEEP_MARGIN,
        max_y: max_y * SWEEP_MARGIN,
    };
    debug!(?bounds, "Initial crop rectangle");

    let mut iteration = 0;
    loop {
        let mut left_ok = true;
        let mut right_ok = true;
        for y in 0..height {
            let ny = bounds.lerp_y(y as f64 / (height - 1) as f64);
            left_ok &= in_raw_image(model, bounds.min_x, ny, raw);
            right_ok &= in_raw_image(model, bounds.max_x, ny, raw);
        }

        let mut top_ok = true;
        let mut bottom_ok = true;
        for x in 0..width {
            let nx = bounds.lerp_x(x as f64 / (width - 1) as f64);
            top_ok &= in_raw_image(model, nx, bounds.min_y, raw);
            bottom_ok &= in_raw_image(model, nx, bounds.max_y, raw);
        }

        let mut fix_x = !(left_ok && right_ok);
        let mut fix_y = !(top_ok && bottom_ok);
        if !fix_x && !fix_y {
            break;
        }

        // Shrink only the wider side when both axes violate.
        if fix_x && fix_y {
            let width_ratio = (bounds.max_x - bounds.min_x) / width as f64;
            let height_ratio = (bounds.max_y - bounds.min_y) / height as f64;
            if width_ratio < height_ratio {
                fix_x = false;
            } else {
                fix_y = false;
            }
        }

        if fix_x {
            if !left_ok {
                bounds.min_x *= SHRINK_FACTOR;
            }
            if !right_ok {
                bounds.max_x *= SHRINK_FACTOR;
            }
        }
        if fix_y {
            if !top_ok {
                bounds.min_y *= SHRINK_FACTOR;
            }
            if !bottom_ok {
                bounds.max_y *= SHRINK_FACTOR;
            }
        }

        iteration += 1;
        if iteration > MAX_SHRINK_ITERATIONS {
            return Err(UndistortError::OptimalK(format!(
                "crop rectangle did not converge after {MAX_SHRINK_ITERATIONS} iterations"
            )));
        }
    }
    debug!(?bounds, iterations = iteration, "Crop rectangle converged");

    Ok(bounds.to_camera_matrix(width, height))
}

/// Smallest axis-aligned rectangle containing the undistorted raw border.
///
/// Border pixels outside the model's invertible domain are skipped.
pub(super) fn full(model: &LensModel, raw: (usize, usize), output: (usize, usize)) -> Result<Matrix3<f64>> {
    let (raw_width, raw_height) = raw;
    let horizontal = (0..raw_width).flat_map(|x| [(x, 0), (x, raw_height - 1)]);
    let vertical = (0..raw_height).flat_map(|y| [(0, y), (raw_width - 1, y)]);

    let mut bounds: Option<Bounds> = None;
    let mut skipped = 0usize;
    for (u, v) in horizontal.chain(vertical) {
        let Some((x, y)) = model.undistort_pixel(u as f64, v as f64) else {
            skipped += 1;
            continue;
        };
        bounds = Some(match bounds {
            None => Bounds { min_x: x, max_x: x, min_y: y, max_y: y },
            Some(b) => Bounds {
                min_x: b.min_x.min(x),
                max_x: b.max_x.max(x),
                min_y: b.min_y.min(y),
                max_y: b.max_y.max(y),
            },
        });
    }

    if skipped > 0 {
        warn!("{} border pixels could not be undistorted and were skipped", skipped);
    }

    match bounds {
        Some(b) if b.max_x > b.min_x && b.max_y > b.min_y => {
            debug!(bounds = ?b, "Full rectangle");
            Ok(b.to_camera_matrix(output.0, output.1))
        }
        _ => Err(UndistortError::OptimalK(
            "no raw border pixel could be undistorted".to_string(),
        )),
    }
}
