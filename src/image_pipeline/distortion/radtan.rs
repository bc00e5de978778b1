//! Radial-tangential (Brown-Conrady) model with two radial and two
//! tangential coefficients.

use crate::image_pipeline::common::error::Result;
use super::{check_parameter_count, CameraIntrinsics, DistortionModel, ModelKind};

const MAX_ITERS: usize = 50;
const EPS: f64 = 1e-12;
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// `fx fy cx cy k1 k2 r1 r2`
#[derive(Debug, Clone, PartialEq)]
pub struct RadTan {
    intrinsics: CameraIntrinsics,
    k1: f64,
    k2: f64,
    r1: f64,
    r2: f64,
}

impl RadTan {
    pub fn from_parameters(params: &[f64]) -> Result<Self> {
        check_parameter_count(ModelKind::RadTan, params)?;
        Ok(Self {
            intrinsics: CameraIntrinsics::from_slice("RadTan", params)?,
            k1: params[4],
            k2: params[5],
            r1: params[6],
            r2: params[7],
        })
    }

    /// Distortion in normalized coordinates as `(radial factor, dx, dy)`.
    #[inline]
    fn distortion(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let mx2 = x * x;
        let my2 = y * y;
        let mxy = x * y;
        let rho2 = mx2 + my2;
        let radial = self.k1 * rho2 + self.k2 * rho2 * rho2;
        let dx = 2.0 * self.r1 * mxy + self.r2 * (rho2 + 2.0 * mx2);
        let dy = 2.0 * self.r2 * mxy + self.r1 * (rho2 + 2.0 * my2);
        (radial, dx, dy)
    }

    fn distort_normalized(&self, x: f64, y: f64) -> (f64, f64) {
        let (radial, dx, dy) = self.distortion(x, y);
        (x + x * radial + dx, y + y * radial + dy)
    }
}

impl DistortionModel for RadTan {
    fn name(&self) -> &'static str {
        "RadTan"
    }

    fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    fn parameters(&self) -> Vec<f64> {
        let mut params = self.intrinsics.to_vec();
        params.extend([self.k1, self.k2, self.r1, self.r2]);
        params
    }

    fn distort_point(&self, x: f64, y: f64) -> (f64, f64) {
        let (xd, yd) = self.distort_normalized(x, y);
        self.intrinsics.to_pixel(xd, yd)
    }

    fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)> {
        let (xd, yd) = self.intrinsics.to_normalized(u, v);
        let mut x = xd;
        let mut y = yd;
        for _ in 0..MAX_ITERS {
            let (radial, dx, dy) = self.distortion(x, y);
            let next_x = (xd - dx) / (1.0 + radial);
            let next_y = (yd - dy) / (1.0 + radial);
            if !next_x.is_finite() || !next_y.is_finite() {
                return None;
            }
            let step = (next_x - x).abs() + (next_y - y).abs();
            x = next_x;
            y = next_y;
            if step < EPS {
                break;
            }
        }

        // fixed point iteration can settle on a wrong branch for strong distortion
        let (check_x, check_y) = self.distort_normalized(x, y);
        if (check_x - xd).abs() + (check_y - yd).abs() > RESIDUAL_TOLERANCE {
            return None;
        }
        Some((x, y))
    }
}
