use std::path::Path;

use tracing::{info, instrument, warn};
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::common::frame::ImageAndExposure;
use crate::image_pipeline::common::settings::{PhotometricMode, RectifySettings};
use crate::image_pipeline::photometric::response::InverseResponse;
use crate::image_pipeline::photometric::vignette::VignetteField;
use crate::image_pipeline::raw::types::{max_level_for_bits, RawImageData, RawSample};

/// Converts raw intensities to irradiance by inverting the response curve
/// and the vignette.
///
/// Construction never fails: missing or inconsistent calibration leaves the
/// corrector invalid, in which case frames are copied and scaled by the
/// caller factor only.
#[derive(Debug, Clone)]
pub struct PhotometricCorrector {
    width: usize,
    height: usize,
    response: Option<InverseResponse>,
    vignette: Option<VignetteField>,
    mode: PhotometricMode,
    use_exposure: bool,
    valid: bool,
}

impl PhotometricCorrector {
    /// Loads the gamma file and vignette image for a `width` x `height` sensor.
    #[instrument(skip(settings), fields(mode = ?settings.photometric_mode))]
    pub fn new(
        gamma_path: Option<&Path>,
        vignette_path: Option<&Path>,
        width: usize,
        height: usize,
        settings: &RectifySettings,
    ) -> Self {
        let response = match gamma_path {
            Some(path) => InverseResponse::from_file(path),
            None => Err(UndistortError::InputReadError(
                "no response calibration given".to_string(),
            )),
        };
        let vignette = match vignette_path {
            Some(path) => VignetteField::from_tiff(path, width, height).map(Some),
            None => Ok(None),
        };
        Self::build(response, vignette, width, height, settings)
    }

    /// Builds a corrector from tables that are already in memory.
    pub fn from_parts(
        response: InverseResponse,
        vignette: Option<VignetteField>,
        width: usize,
        height: usize,
        settings: &RectifySettings,
    ) -> Self {
        Self::build(Ok(response), Ok(vignette), width, height, settings)
    }

    /// Uncalibrated corrector: every frame is copied.
    pub fn passthrough(width: usize, height: usize, settings: &RectifySettings) -> Self {
        Self {
            width,
            height,
            response: None,
            vignette: None,
            mode: settings.photometric_mode,
            use_exposure: settings.use_exposure,
            valid: false,
        }
    }

    fn build(
        response: Result<InverseResponse>,
        vignette: Result<Option<VignetteField>>,
        width: usize,
        height: usize,
        settings: &RectifySettings,
    ) -> Self {
        let mut corrector = Self::passthrough(width, height, settings);

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("No usable response calibration, photometric correction disabled: {}", e);
                return corrector;
            }
        };

        let vignette = match vignette {
            Ok(Some(vignette)) if vignette.size() != (width, height) => {
                let (w, h) = vignette.size();
                warn!("Vignette is {}x{}, expected {}x{}", w, h, width, height);
                None
            }
            Ok(vignette) => vignette,
            Err(e) => {
                warn!("Invalid vignette calibration: {}", e);
                None
            }
        };

        if settings.photometric_mode == PhotometricMode::Full && vignette.is_none() {
            warn!("Full photometric correction needs a vignette, photometric correction disabled");
            return corrector;
        }

        info!(
            entries = response.depth(),
            vignette = vignette.is_some(),
            "Photometric calibration loaded"
        );
        corrector.response = Some(response);
        corrector.vignette = vignette;
        corrector.valid = true;
        corrector
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The inverse response table, or `None` when the corrector is invalid.
    pub fn get_g(&self) -> Option<&[f32]> {
        if !self.valid {
            return None;
        }
        self.response.as_ref().map(InverseResponse::as_slice)
    }

    pub fn vignette(&self) -> Option<&VignetteField> {
        self.vignette.as_ref().filter(|_| self.valid)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn calibrated_response(&self) -> Option<&InverseResponse> {
        match self.mode {
            PhotometricMode::Disabled => None,
            _ if !self.valid => None,
            _ => self.response.as_ref(),
        }
    }

    fn active_vignette(&self) -> Option<&VignetteField> {
        match self.mode {
            PhotometricMode::Full => self.vignette(),
            _ => None,
        }
    }

    /// Converts one raw frame to irradiance, scaled by `factor`.
    ///
    /// The returned frame carries the exposure time (1.0 when exposures are
    /// not used) and a zero timestamp.
    pub fn process_frame<T: RawSample>(
        &self,
        image: &RawImageData<T>,
        exposure_time: f32,
        factor: f32,
    ) -> Result<ImageAndExposure> {
        if image.width != self.width || image.height != self.height {
            return Err(UndistortError::DimensionMismatch {
                expected: (self.width, self.height),
                found: (image.width, image.height),
            });
        }
        if image.data.len() != self.width * self.height {
            return Err(UndistortError::InvalidDimensions(image.width, image.height));
        }

        let mut output = ImageAndExposure::new(self.width, self.height, 0.0);

        match self.calibrated_response().filter(|_| exposure_time > 0.0) {
            None => {
                for (out, &raw) in output.image.iter_mut().zip(&image.data) {
                    *out = factor * raw.level() as f32;
                }
            }
            Some(g) => {
                let max_level = image.max_level();
                let last = g.depth() - 1;
                if max_level as usize == last {
                    for (out, &raw) in output.image.iter_mut().zip(&image.data) {
                        *out = factor * g.at(raw.level() as usize);
                    }
                } else {
                    let scale = last as f32 / max_level as f32;
                    for (out, &raw) in output.image.iter_mut().zip(&image.data) {
                        *out = factor * g.interpolate(raw.level().min(max_level) as f32 * scale);
                    }
                }

                if let Some(vignette) = self.active_vignette() {
                    for (out, &inv) in output.image.iter_mut().zip(vignette.inverse_factors()) {
                        *out *= inv;
                    }
                }
            }
        }

        output.exposure_time = if self.use_exposure { exposure_time } else { 1.0 };
        Ok(output)
    }

    /// Maps irradiance back to raw-like intensity levels of a
    /// `bits_per_sample` sensor. Used for visualization only.
    pub fn unmap_float_image(&self, image: &mut [f32], factor: f32, bits_per_sample: u32) -> Result<()> {
        if image.len() != self.width * self.height {
            return Err(UndistortError::BufferLength {
                expected: self.width * self.height,
                found: image.len(),
            });
        }
        let factor = if factor == 0.0 { 1.0 } else { factor };

        match self.calibrated_response() {
            None => image.iter_mut().for_each(|v| *v /= factor),
            Some(g) => {
                let max_level = max_level_for_bits(bits_per_sample) as f32;
                let last = (g.depth() - 1) as f32;
                let vignette = self.active_vignette().map(VignetteField::factors);
                for (i, v) in image.iter_mut().enumerate() {
                    let mut value = *v / factor;
                    if let Some(map) = vignette {
                        value *= map[i];
                    }
                    *v = g.invert(value) * max_level / last;
                }
            }
        }
        Ok(())
    }
}
