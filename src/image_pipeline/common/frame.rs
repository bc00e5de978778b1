//! Corrected frame containers handed to downstream consumers.

/// Single-channel float image tagged with exposure and capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAndExposure {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Row-major irradiance values
    pub image: Vec<f32>,
    /// Exposure time in milliseconds (1.0 when exposure is not used)
    pub exposure_time: f32,
    /// Capture timestamp in seconds
    pub timestamp: f64,
}

impl ImageAndExposure {
    pub fn new(width: usize, height: usize, timestamp: f64) -> Self {
        Self {
            width,
            height,
            image: vec![0.0; width * height],
            exposure_time: 1.0,
            timestamp,
        }
    }

    pub fn copy_meta_to(&self, other: &mut ImageAndExposure) {
        other.exposure_time = self.exposure_time;
        other.timestamp = self.timestamp;
    }
}

/// Three aligned channel planes sharing one exposure and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourImageAndExposure {
    pub width: usize,
    pub height: usize,
    pub r: Vec<f32>,
    pub g: Vec<f32>,
    pub b: Vec<f32>,
    pub exposure_time: f32,
    pub timestamp: f64,
}

impl ColourImageAndExposure {
    /// Interleaves the planes as `[R, G, B, R, G, B, ...]`.
    pub fn interleaved(&self) -> Vec<f32> {
        self.r
            .iter()
            .zip(&self.g)
            .zip(&self.b)
            .flat_map(|((&r, &g), &b)| [r, g, b])
            .collect()
    }
}
