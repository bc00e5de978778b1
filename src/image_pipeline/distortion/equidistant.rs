//! Equidistant fisheye model with a four-term polynomial in the incidence
//! angle.

use std::f64::consts::FRAC_PI_2;

use crate::image_pipeline::common::error::Result;
use super::{check_parameter_count, CameraIntrinsics, DistortionModel, ModelKind};

/// `fx fy cx cy k1 k2 k3 k4`
#[derive(Debug, Clone, PartialEq)]
pub struct Equidistant {
    intrinsics: CameraIntrinsics,
    k: [f64; 4],
}

impl Equidistant {
    pub fn from_parameters(params: &[f64]) -> Result<Self> {
        check_parameter_count(ModelKind::Equidistant, params)?;
        Ok(Self {
            intrinsics: CameraIntrinsics::from_slice("EquiDistant", params)?,
            k: [params[4], params[5], params[6], params[7]],
        })
    }
}

/// `theta * (1 + k0 theta^2 + k1 theta^4 + k2 theta^6 + k3 theta^8)`
#[inline]
pub(super) fn distorted_angle(theta: f64, k: &[f64; 4]) -> f64 {
    let theta2 = theta * theta;
    let theta4 = theta2 * theta2;
    let theta6 = theta4 * theta2;
    let theta8 = theta4 * theta4;
    theta * (1.0 + k[0] * theta2 + k[1] * theta4 + k[2] * theta6 + k[3] * theta8)
}

/// Newton solve of `distorted_angle(theta) == theta_d` for `theta` in
/// `[0, pi/2)`.
pub(super) fn solve_angle(theta_d: f64, k: &[f64; 4]) -> Option<f64> {
    const EPS: f64 = 1e-12;

    let mut theta = theta_d.min(FRAC_PI_2 - 1e-6);
    let mut converged = false;
    for _ in 0..20 {
        let theta2 = theta * theta;
        let theta4 = theta2 * theta2;
        let theta6 = theta4 * theta2;
        let theta8 = theta4 * theta4;
        let derivative =
            1.0 + 3.0 * k[0] * theta2 + 5.0 * k[1] * theta4 + 7.0 * k[2] * theta6 + 9.0 * k[3] * theta8;
        if derivative.abs() < EPS {
            return None;
        }
        let fix = ((distorted_angle(theta, k) - theta_d) / derivative).clamp(-0.5, 0.5);
        theta -= fix;
        if fix.abs() < EPS {
            converged = true;
            break;
        }
    }

    if converged && (0.0..FRAC_PI_2).contains(&theta) {
        Some(theta)
    } else {
        None
    }
}

impl DistortionModel for Equidistant {
    fn name(&self) -> &'static str {
        "EquiDistant"
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
        let r = (x * x + y * y).sqrt();
        let theta = r.atan();
        let theta_d = distorted_angle(theta, &self.k);
        let scaling = if r > 1e-8 { theta_d / r } else { 1.0 };
        self.intrinsics.to_pixel(x * scaling, y * scaling)
    }

    fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)> {
        let (xd, yd) = self.intrinsics.to_normalized(u, v);
        let theta_d = (xd * xd + yd * yd).sqrt();
        if theta_d <= 1e-8 {
            return Some((xd, yd));
        }
        let theta = solve_angle(theta_d, &self.k)?;
        let scale = theta.tan() / theta_d;
        Some((xd * scale, yd * scale))
    }
}
