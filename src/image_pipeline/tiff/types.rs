//! TIFF output configuration types

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced (default)
    DeflateBalanced,
}

/// Sample format of the written rectified frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSampleFormat {
    /// 16-bit integer, irradiance multiplied by `gray16_scale` and clamped
    Gray16,
    /// 32-bit float, irradiance written as is
    Float32,
}

/// Single-channel image decoded from a TIFF file
#[derive(Debug, Clone)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

/// Configuration for the RAW to rectified TIFF pipeline
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Whether to validate decoded frame dimensions before processing
    pub validate_dimensions: bool,
    /// Debayer the frame and rectify each colour channel (true) or treat the
    /// frame as monochrome (false)
    pub debayer: bool,
    /// Sample format of the output TIFF
    pub sample_format: OutputSampleFormat,
    /// Multiplier from irradiance to 16-bit output values
    pub gray16_scale: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
            debayer: false,
            sample_format: OutputSampleFormat::Gray16,
            gray16_scale: 256.0,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    debayer: Option<bool>,
    sample_format: Option<OutputSampleFormat>,
    gray16_scale: Option<f32>,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn debayer(mut self, enable: bool) -> Self {
        self.debayer = Some(enable);
        self
    }

    pub fn sample_format(mut self, format: OutputSampleFormat) -> Self {
        self.sample_format = Some(format);
        self
    }

    pub fn gray16_scale(mut self, scale: f32) -> Self {
        self.gray16_scale = Some(scale);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            debayer: self.debayer.unwrap_or(default.debayer),
            sample_format: self.sample_format.unwrap_or(default.sample_format),
            gray16_scale: self.gray16_scale.unwrap_or(default.gray16_scale),
        }
    }
}
