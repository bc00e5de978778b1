//! Lens distortion models
//!
//! Every model maps rectified normalized coordinates to raw (distorted) pixel
//! coordinates. The rectifier only ever talks to [`LensModel`], which is
//! selected once from the calibration file and dispatches to the concrete
//! projection family.

mod equidistant;
mod fov;
mod kannala_brandt;
mod pinhole;
mod radtan;

#[cfg(test)]
mod tests;

pub use equidistant::Equidistant;
pub use fov::Fov;
pub use kannala_brandt::KannalaBrandt;
pub use pinhole::Pinhole;
pub use radtan::RadTan;

use crate::image_pipeline::common::error::{Result, UndistortError};

/// Focal lengths and principal point of the raw camera, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    fn from_slice(model: &'static str, params: &[f64]) -> Result<Self> {
        let intrinsics = Self {
            fx: params[0],
            fy: params[1],
            cx: params[2],
            cy: params[3],
        };
        if params.iter().any(|p| !p.is_finite()) {
            return Err(UndistortError::MalformedCalibration(format!(
                "{model} has non-finite parameters"
            )));
        }
        if intrinsics.fx == 0.0 || intrinsics.fy == 0.0 {
            return Err(UndistortError::MalformedCalibration(format!(
                "{model} has a zero focal length"
            )));
        }
        Ok(intrinsics)
    }

    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (self.fx * x + self.cx, self.fy * y + self.cy)
    }

    #[inline]
    pub fn to_normalized(&self, u: f64, v: f64) -> (f64, f64) {
        ((u - self.cx) / self.fx, (v - self.cy) / self.fy)
    }

    fn to_vec(self) -> Vec<f64> {
        vec![self.fx, self.fy, self.cx, self.cy]
    }
}

/// Common contract of all projection families.
pub trait DistortionModel {
    fn name(&self) -> &'static str;

    fn intrinsics(&self) -> &CameraIntrinsics;

    /// The coefficient vector the model was built from.
    fn parameters(&self) -> Vec<f64>;

    /// Rectified normalized coordinates to raw pixel coordinates.
    ///
    /// No clamping is performed; callers decide what is in bounds.
    fn distort_point(&self, x: f64, y: f64) -> (f64, f64);

    /// Raw pixel coordinates back to rectified normalized coordinates.
    ///
    /// Returns `None` outside the model's valid domain.
    fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)>;

    /// Batch form of [`distort_point`](Self::distort_point), in place.
    fn distort_coordinates(&self, xs: &mut [f64], ys: &mut [f64]) {
        debug_assert_eq!(xs.len(), ys.len());
        for (x, y) in xs.iter_mut().zip(ys.iter_mut()) {
            (*x, *y) = self.distort_point(*x, *y);
        }
    }
}

/// Projection family named in a calibration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Fov,
    RadTan,
    Equidistant,
    Pinhole,
    KannalaBrandt,
}

impl ModelKind {
    pub fn identifier(self) -> &'static str {
        match self {
            ModelKind::Fov => "FOV",
            ModelKind::RadTan => "RadTan",
            ModelKind::Equidistant => "EquiDistant",
            ModelKind::Pinhole => "Pinhole",
            ModelKind::KannalaBrandt => "KannalaBrandt",
        }
    }

    pub fn parameter_count(self) -> usize {
        match self {
            ModelKind::Fov | ModelKind::Pinhole => 5,
            ModelKind::RadTan | ModelKind::Equidistant | ModelKind::KannalaBrandt => 8,
        }
    }

    pub fn from_identifier(name: &str) -> Result<Self> {
        match name {
            "FOV" => Ok(ModelKind::Fov),
            "RadTan" => Ok(ModelKind::RadTan),
            "EquiDistant" => Ok(ModelKind::Equidistant),
            "Pinhole" => Ok(ModelKind::Pinhole),
            "KannalaBrandt" => Ok(ModelKind::KannalaBrandt),
            other => Err(UndistortError::UnknownModel(other.to_string())),
        }
    }

    /// Model for a prefix-less parameter line.
    ///
    /// Eight values are radial-tangential, five are pinhole when the last
    /// value is zero and FOV otherwise.
    pub fn from_legacy_parameters(params: &[f64]) -> Result<Self> {
        match params.len() {
            8 => Ok(ModelKind::RadTan),
            5 if params[4] == 0.0 => Ok(ModelKind::Pinhole),
            5 => Ok(ModelKind::Fov),
            n => Err(UndistortError::MalformedCalibration(format!(
                "cannot infer camera model from {n} parameters"
            ))),
        }
    }
}

fn check_parameter_count(kind: ModelKind, params: &[f64]) -> Result<()> {
    let expected = kind.parameter_count();
    if params.len() != expected {
        return Err(UndistortError::ParameterCount {
            model: kind.identifier(),
            expected,
            found: params.len(),
        });
    }
    Ok(())
}

macro_rules! impl_models {
    ($($name:ident => $class:ty,)*) => {
        /// One of the supported projection families.
        #[derive(Debug, Clone, PartialEq)]
        pub enum LensModel {
            $($name($class),)*
        }

        impl LensModel {
            /// Builds the variant for `kind`, validating the parameter count.
            pub fn from_parameters(kind: ModelKind, params: &[f64]) -> Result<Self> {
                match kind {
                    $(ModelKind::$name => Ok(LensModel::$name(<$class>::from_parameters(params)?)),)*
                }
            }

            pub fn kind(&self) -> ModelKind {
                match self { $(LensModel::$name(_) => ModelKind::$name,)* }
            }
        }

        impl DistortionModel for LensModel {
            fn name(&self)                        -> &'static str      { match self { $(LensModel::$name(m) => m.name(),)* } }
            fn intrinsics(&self)                  -> &CameraIntrinsics { match self { $(LensModel::$name(m) => m.intrinsics(),)* } }
            fn parameters(&self)                  -> Vec<f64>          { match self { $(LensModel::$name(m) => m.parameters(),)* } }
            fn distort_point(&self, x: f64, y: f64) -> (f64, f64)      { match self { $(LensModel::$name(m) => m.distort_point(x, y),)* } }
            fn undistort_pixel(&self, u: f64, v: f64) -> Option<(f64, f64)> {
                match self { $(LensModel::$name(m) => m.undistort_pixel(u, v),)* }
            }
            // Dispatch once per batch so the inner loop is monomorphic.
            fn distort_coordinates(&self, xs: &mut [f64], ys: &mut [f64]) {
                match self { $(LensModel::$name(m) => m.distort_coordinates(xs, ys),)* }
            }
        }
    };
}

impl_models! {
    Fov => Fov,
    RadTan => RadTan,
    Equidistant => Equidistant,
    Pinhole => Pinhole,
    KannalaBrandt => KannalaBrandt,
}
