//! Read-only knobs injected into the corrector and rectifier at construction.

/// Which parts of the photometric calibration are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotometricMode {
    /// Copy raw values, scaled by the caller factor only
    Disabled,
    /// Invert the response curve, ignore the vignette
    ResponseOnly,
    /// Invert the response curve and the vignette (default)
    #[default]
    Full,
}

/// Global settings shared by one undistortion setup.
#[derive(Debug, Clone, PartialEq)]
pub struct RectifySettings {
    /// Photometric correction stages to apply
    pub photometric_mode: PhotometricMode,
    /// Report the caller's exposure time; when false every frame reports 1.0
    pub use_exposure: bool,
    /// Integer factor applied to the rectified output resolution
    pub upsample_factor: usize,
    /// Forces the rectified output resolution, overriding the calibration file
    pub output_size_override: Option<(usize, usize)>,
    /// Lower bound for the rectified focal lengths
    pub fxfy_factor: Option<f64>,
    /// Variance of the zero-mean Gaussian noise added to every rectified
    /// pixel. `None` leaves the output untouched.
    pub noise_variance: Option<f32>,
}

impl Default for RectifySettings {
    fn default() -> Self {
        Self {
            photometric_mode: PhotometricMode::Full,
            use_exposure: true,
            upsample_factor: 1,
            output_size_override: None,
            fxfy_factor: None,
            noise_variance: None,
        }
    }
}

impl RectifySettings {
    pub fn builder() -> RectifySettingsBuilder {
        RectifySettingsBuilder::default()
    }
}

/// Builder for RectifySettings
#[derive(Default)]
pub struct RectifySettingsBuilder {
    photometric_mode: Option<PhotometricMode>,
    use_exposure: Option<bool>,
    upsample_factor: Option<usize>,
    output_size_override: Option<Option<(usize, usize)>>,
    fxfy_factor: Option<Option<f64>>,
    noise_variance: Option<Option<f32>>,
}

impl RectifySettingsBuilder {
    pub fn photometric_mode(mut self, mode: PhotometricMode) -> Self {
        self.photometric_mode = Some(mode);
        self
    }

    pub fn use_exposure(mut self, enable: bool) -> Self {
        self.use_exposure = Some(enable);
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn upsample_factor(mut self, factor: usize) -> Self {
        self.upsample_factor = Some(factor.max(1));
        self
    }

    pub fn output_size_override(mut self, size: Option<(usize, usize)>) -> Self {
        self.output_size_override = Some(size);
        self
    }

    pub fn fxfy_factor(mut self, factor: Option<f64>) -> Self {
        self.fxfy_factor = Some(factor);
        self
    }

    pub fn noise_variance(mut self, variance: Option<f32>) -> Self {
        self.noise_variance = Some(variance);
        self
    }

    pub fn build(self) -> RectifySettings {
        let default = RectifySettings::default();
        RectifySettings {
            photometric_mode: self.photometric_mode.unwrap_or(default.photometric_mode),
            use_exposure: self.use_exposure.unwrap_or(default.use_exposure),
            upsample_factor: self.upsample_factor.unwrap_or(default.upsample_factor),
            output_size_override: self
                .output_size_override
                .unwrap_or(default.output_size_override),
            fxfy_factor: self.fxfy_factor.unwrap_or(default.fxfy_factor),
            noise_variance: self.noise_variance.unwrap_or(default.noise_variance),
        }
    }
}
