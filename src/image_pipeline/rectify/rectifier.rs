use std::path::Path;

use nalgebra::Matrix3;
use rand_distr::{Distribution, Normal};
use tracing::{info, instrument, warn};
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::common::frame::{ColourImageAndExposure, ImageAndExposure};
use crate::image_pipeline::common::settings::RectifySettings;
use crate::image_pipeline::distortion::{CameraIntrinsics, DistortionModel, LensModel, Pinhole};
use crate::image_pipeline::rectify::calibration::{GeometricCalibration, OutputPolicy};
use crate::image_pipeline::rectify::optimal_k;
use crate::image_pipeline::rectify::remap::RemapTable;

#[derive(Debug, Clone, PartialEq)]
enum Geometry {
    /// Output is a copy of the input frame
    Passthrough,
    Remap(RemapTable),
}

/// Resamples raw frames into an ideal pinhole camera with matrix `K`.
///
/// All geometry is fixed at construction; per-frame work is one table lookup
/// and a bilinear sample per output pixel.
#[derive(Debug, Clone)]
pub struct Rectifier {
    model: LensModel,
    raw_width: usize,
    raw_height: usize,
    width: usize,
    height: usize,
    k: Matrix3<f64>,
    geometry: Geometry,
    noise: Option<Normal<f32>>,
}

impl Rectifier {
    pub fn from_file<P: AsRef<Path>>(path: P, settings: &RectifySettings) -> Result<Self> {
        let calibration = GeometricCalibration::from_file(path)?;
        Self::new(&calibration, settings)
    }

    #[instrument(skip_all, fields(model = calibration.model.identifier()))]
    pub fn new(calibration: &GeometricCalibration, settings: &RectifySettings) -> Result<Self> {
        let model = LensModel::from_parameters(calibration.model, &calibration.parameters)?;
        let (raw_width, raw_height) = calibration.raw_size();
        let (mut width, mut height) = calibration.output_size();
        let mut policy = calibration.policy;

        if let Some((w, h)) = settings.output_size_override {
            info!("Output resolution overridden to {}x{}", w, h);
            width = w;
            height = h;
            if policy == OutputPolicy::None {
                info!("Output override given, switching from no rectification to crop");
                policy = OutputPolicy::Crop;
            }
        }

        if settings.upsample_factor > 1 {
            if policy == OutputPolicy::None {
                warn!("Upsampling is ignored without rectification");
            } else {
                width *= settings.upsample_factor;
                height *= settings.upsample_factor;
            }
        }

        for (w, h) in [(raw_width, raw_height), (width, height)] {
            if w < 2 || h < 2 {
                return Err(UndistortError::InvalidDimensions(w, h));
            }
        }

        let raw = (raw_width, raw_height);
        let output = (width, height);
        let mut passthrough = false;
        let mut k = match policy {
            OutputPolicy::Crop => optimal_k::crop(&model, raw, output)?,
            OutputPolicy::Full => optimal_k::full(&model, raw, output)?,
            OutputPolicy::None => {
                if output != raw {
                    return Err(UndistortError::DimensionMismatch {
                        expected: raw,
                        found: output,
                    });
                }
                passthrough = true;
                intrinsics_matrix(model.intrinsics())
            }
            OutputPolicy::Explicit { fx, fy, cx, cy } => Matrix3::new(
                fx * width as f64, 0.0, cx * width as f64 - 0.5,
                0.0, fy * height as f64, cy * height as f64 - 0.5,
                0.0, 0.0, 1.0,
            ),
        };

        if let Some(min_focal) = settings.fxfy_factor {
            k[(0, 0)] = k[(0, 0)].max(min_focal);
            k[(1, 1)] = k[(1, 1)].max(min_focal);
            passthrough = false;
        }

        let geometry = if passthrough {
            Geometry::Passthrough
        } else {
            let table = RemapTable::build(&model, &k, output, raw);
            info!(
                "Remap table {}x{} from {}x{}: {} of {} pixels valid",
                width,
                height,
                raw_width,
                raw_height,
                table.valid_count(),
                width * height
            );
            Geometry::Remap(table)
        };

        let noise = settings.noise_variance.and_then(noise_distribution);

        info!(
            "Rectified camera: fx={:.3} fy={:.3} cx={:.3} cy={:.3}",
            k[(0, 0)],
            k[(1, 1)],
            k[(0, 2)],
            k[(1, 2)]
        );

        Ok(Self {
            model,
            raw_width,
            raw_height,
            width,
            height,
            k,
            geometry,
            noise,
        })
    }

    /// Identity geometry for an uncalibrated `width` x `height` camera.
    pub fn passthrough(width: usize, height: usize) -> Self {
        let intrinsics = CameraIntrinsics { fx: 1.0, fy: 1.0, cx: 0.0, cy: 0.0 };
        Self {
            model: LensModel::Pinhole(Pinhole::new(intrinsics)),
            raw_width: width,
            raw_height: height,
            width,
            height,
            k: Matrix3::identity(),
            geometry: Geometry::Passthrough,
            noise: None,
        }
    }

    /// Rectified camera matrix.
    pub fn k(&self) -> &Matrix3<f64> {
        &self.k
    }

    /// Rectified output resolution.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Raw input resolution.
    pub fn original_size(&self) -> (usize, usize) {
        (self.raw_width, self.raw_height)
    }

    pub fn original_parameters(&self) -> Vec<f64> {
        self.model.parameters()
    }

    pub fn model(&self) -> &LensModel {
        &self.model
    }

    pub fn is_passthrough(&self) -> bool {
        self.geometry == Geometry::Passthrough
    }

    pub fn remap_table(&self) -> Option<&RemapTable> {
        match &self.geometry {
            Geometry::Passthrough => None,
            Geometry::Remap(table) => Some(table),
        }
    }

    fn check_input(&self, width: usize, height: usize) -> Result<()> {
        if (width, height) != self.original_size() {
            return Err(UndistortError::DimensionMismatch {
                expected: self.original_size(),
                found: (width, height),
            });
        }
        Ok(())
    }

    fn resample(&self, plane: &[f32]) -> Vec<f32> {
        let mut output = match &self.geometry {
            Geometry::Passthrough => plane.to_vec(),
            Geometry::Remap(table) => {
                let mut output = vec![0.0; self.width * self.height];
                table.remap(plane, &mut output);
                output
            }
        };
        if let Some(noise) = &self.noise {
            self.apply_noise(noise, &mut output);
        }
        output
    }

    /// Adds one Gaussian sample to every pixel that maps into the raw frame.
    /// Pixels outside the raw frame stay 0.
    fn apply_noise(&self, noise: &Normal<f32>, image: &mut [f32]) {
        let mut rng = rand::rng();
        let table = self.remap_table();
        for (idx, value) in image.iter_mut().enumerate() {
            if table.is_none_or(|t| t.is_valid(idx)) {
                *value += noise.sample(&mut rng);
            }
        }
    }

    /// Rectifies one corrected frame, keeping its exposure and timestamp.
    pub fn undistort(&self, frame: &ImageAndExposure) -> Result<ImageAndExposure> {
        self.check_input(frame.width, frame.height)?;

        let mut output = ImageAndExposure {
            width: self.width,
            height: self.height,
            image: self.resample(&frame.image),
            exposure_time: 1.0,
            timestamp: 0.0,
        };
        frame.copy_meta_to(&mut output);
        Ok(output)
    }

    /// Rectifies three channel planes with the same table.
    ///
    /// Exposure and timestamp are taken from the red plane.
    pub fn undistort_colour(
        &self,
        r: &ImageAndExposure,
        g: &ImageAndExposure,
        b: &ImageAndExposure,
    ) -> Result<ColourImageAndExposure> {
        for plane in [r, g, b] {
            self.check_input(plane.width, plane.height)?;
        }

        Ok(ColourImageAndExposure {
            width: self.width,
            height: self.height,
            r: self.resample(&r.image),
            g: self.resample(&g.image),
            b: self.resample(&b.image),
            exposure_time: r.exposure_time,
            timestamp: r.timestamp,
        })
    }
}

fn noise_distribution(variance: f32) -> Option<Normal<f32>> {
    if !(variance.is_finite() && variance > 0.0) {
        warn!("Ignoring noise variance {}", variance);
        return None;
    }
    match Normal::new(0.0, variance.sqrt()) {
        Ok(normal) => {
            info!("Adding Gaussian noise with variance {}", variance);
            Some(normal)
        }
        Err(e) => {
            warn!("Ignoring noise variance {}: {}", variance, e);
            None
        }
    }
}

fn intrinsics_matrix(intrinsics: &CameraIntrinsics) -> Matrix3<f64> {
    Matrix3::new(
        intrinsics.fx, 0.0, intrinsics.cx,
        0.0, intrinsics.fy, intrinsics.cy,
        0.0, 0.0, 1.0,
    )
}
