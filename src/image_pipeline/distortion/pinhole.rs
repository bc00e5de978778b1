use crate::image_pipeline::common::error::Result;
use super::{check_parameter_count, CameraIntrinsics, DistortionModel, ModelKind};

/// Undistorted pinhole camera, `fx fy cx cy 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pinhole {
    intrinsics: CameraIntrinsics,
}

impl Pinhole {
    pub fn from_parameters(params: &[f64]) -> Result<Self> {
        check_parameter_count(ModelKind::Pinhole, params)?;
        Ok(Self {
            intrinsics: CameraIntrinsics::from_slice("Pinhole", params)?,
        })
    }

    pub fn new(intrinsics: CameraIntrinsics) -> Self {
        Self { intrinsics }
    }
}

impl DistortionModel for Pinhole {
    fn name(&self) -> &'static str {
        "Pinhole"
    }

    fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    fn parameters(&self) -> Vec<f64> {
        let mut params = self.intrinsics.to_vec();
        params.push(0.0);
        params
    }

    fn distort_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.intrinsics.to_pixel(x, y)
    }

    fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)> {
        Some(self.intrinsics.to_normalized(u, v))
    }
}
