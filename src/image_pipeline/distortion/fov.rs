//! Single-parameter field-of-view model (Devernay & Faugeras).

use std::f64::consts::FRAC_PI_2;

use crate::image_pipeline::common::error::Result;
use super::{check_parameter_count, CameraIntrinsics, DistortionModel, ModelKind};

/// `fx fy cx cy omega`, where omega is the field of view of the ideal
/// fisheye lens in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct Fov {
    intrinsics: CameraIntrinsics,
    omega: f64,
    two_tan_half_omega: f64,
}

impl Fov {
    pub fn from_parameters(params: &[f64]) -> Result<Self> {
        check_parameter_count(ModelKind::Fov, params)?;
        let omega = params[4];
        Ok(Self {
            intrinsics: CameraIntrinsics::from_slice("FOV", params)?,
            omega,
            two_tan_half_omega: 2.0 * (omega / 2.0).tan(),
        })
    }
}

impl DistortionModel for Fov {
    fn name(&self) -> &'static str {
        "FOV"
    }

    fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    fn parameters(&self) -> Vec<f64> {
        let mut params = self.intrinsics.to_vec();
        params.push(self.omega);
        params
    }

    fn distort_point(&self, x: f64, y: f64) -> (f64, f64) {
        let r = (x * x + y * y).sqrt();
        let factor = if r == 0.0 || self.omega == 0.0 {
            1.0
        } else {
            (r * self.two_tan_half_omega).atan() / (self.omega * r)
        };
        self.intrinsics.to_pixel(x * factor, y * factor)
    }

    fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)> {
        let (xd, yd) = self.intrinsics.to_normalized(u, v);
        let rd = (xd * xd + yd * yd).sqrt();
        if rd == 0.0 || self.omega == 0.0 {
            return Some((xd, yd));
        }
        // rays at or beyond 90 degrees have no rectified image
        let angle = rd * self.omega;
        if angle >= FRAC_PI_2 {
            return None;
        }
        let scale = angle.tan() / self.two_tan_half_omega / rd;
        Some((xd * scale, yd * scale))
    }
}
