use std::path::Path;

use tracing::{info, instrument};
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::common::frame::{ColourImageAndExposure, ImageAndExposure};
use crate::image_pipeline::common::settings::RectifySettings;
use crate::image_pipeline::photometric::PhotometricCorrector;
use crate::image_pipeline::raw::types::{RawImageData, RawSample};
use crate::image_pipeline::rectify::rectifier::Rectifier;

/// Photometric correction followed by geometric rectification.
#[derive(Debug, Clone)]
pub struct Undistorter {
    rectifier: Rectifier,
    photometric: PhotometricCorrector,
}

impl Undistorter {
    pub fn new(rectifier: Rectifier, photometric: PhotometricCorrector) -> Result<Self> {
        if photometric.size() != rectifier.original_size() {
            return Err(UndistortError::DimensionMismatch {
                expected: rectifier.original_size(),
                found: photometric.size(),
            });
        }
        Ok(Self { rectifier, photometric })
    }

    /// Loads the geometric calibration and the optional photometric files.
    ///
    /// Missing or invalid photometric files only disable that stage; a bad
    /// geometric calibration is an error.
    #[instrument(skip_all, fields(calibration = %calibration.display()))]
    pub fn from_files(
        calibration: &Path,
        gamma: Option<&Path>,
        vignette: Option<&Path>,
        settings: &RectifySettings,
    ) -> Result<Self> {
        let rectifier = Rectifier::from_file(calibration, settings)?;
        let (width, height) = rectifier.original_size();
        let photometric = PhotometricCorrector::new(gamma, vignette, width, height, settings);
        info!(
            photometric = photometric.is_valid(),
            passthrough = rectifier.is_passthrough(),
            "Undistorter ready"
        );
        Self::new(rectifier, photometric)
    }

    /// No geometric or photometric calibration: frames are only converted.
    pub fn passthrough(width: usize, height: usize, settings: &RectifySettings) -> Self {
        Self {
            rectifier: Rectifier::passthrough(width, height),
            photometric: PhotometricCorrector::passthrough(width, height, settings),
        }
    }

    pub fn rectifier(&self) -> &Rectifier {
        &self.rectifier
    }

    pub fn photometric(&self) -> &PhotometricCorrector {
        &self.photometric
    }

    pub fn undistort<T: RawSample>(
        &self,
        raw: &RawImageData<T>,
        exposure_time: f32,
        timestamp: f64,
        factor: f32,
    ) -> Result<ImageAndExposure> {
        let mut corrected = self.photometric.process_frame(raw, exposure_time, factor)?;
        corrected.timestamp = timestamp;
        self.rectifier.undistort(&corrected)
    }

    /// Colour variant; each plane is photometrically corrected on its own.
    pub fn undistort_colour<T: RawSample>(
        &self,
        planes: [&RawImageData<T>; 3],
        exposure_time: f32,
        timestamp: f64,
        factor: f32,
    ) -> Result<ColourImageAndExposure> {
        let [r, g, b] = planes;
        let mut r = self.photometric.process_frame(r, exposure_time, factor)?;
        let g = self.photometric.process_frame(g, exposure_time, factor)?;
        let b = self.photometric.process_frame(b, exposure_time, factor)?;
        r.timestamp = timestamp;
        self.rectifier.undistort_colour(&r, &g, &b)
    }
}
