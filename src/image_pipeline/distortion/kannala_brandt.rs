//! Kannala-Brandt generic fisheye model.

use crate::image_pipeline::common::error::Result;
use super::equidistant::{distorted_angle, solve_angle};
use super::{check_parameter_count, CameraIntrinsics, DistortionModel, ModelKind};

/// Below this squared radius the projection is treated as linear.
const LINEAR_RADIUS_SQ: f64 = 1e-6;

/// `fx fy cx cy k0 k1 k2 k3`
#[derive(Debug, Clone, PartialEq)]
pub struct KannalaBrandt {
    intrinsics: CameraIntrinsics,
    k: [f64; 4],
}

impl KannalaBrandt {
    pub fn from_parameters(params: &[f64]) -> Result<Self> {
        check_parameter_count(ModelKind::KannalaBrandt, params)?;
        Ok(Self {
            intrinsics: CameraIntrinsics::from_slice("KannalaBrandt", params)?,
            k: [params[4], params[5], params[6], params[7]],
        })
    }
}

impl DistortionModel for KannalaBrandt {
    fn name(&self) -> &'static str {
        "KannalaBrandt"
    }

    fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    fn parameters(&self) -> Vec<f64> {
        let mut params = self.intrinsics.to_vec();
        params.extend(self.k);
        params
    }

    fn distort_point(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        if r2 < LINEAR_RADIUS_SQ {
            return self.intrinsics.to_pixel(x, y);
        }
        let r = r2.sqrt();
        let theta = r.atan2(1.0);
        let scale = distorted_angle(theta, &self.k) / r;
        self.intrinsics.to_pixel(x * scale, y * scale)
    }

    fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)> {
        let (xd, yd) = self.intrinsics.to_normalized(u, v);
        let rd2 = xd * xd + yd * yd;
        if rd2 < LINEAR_RADIUS_SQ {
            return Some((xd, yd));
        }
        let rd = rd2.sqrt();
        let theta = solve_angle(rd, &self.k)?;
        let scale = theta.tan() / rd;
        Some((xd * scale, yd * scale))
    }
}
