//! RAW image data types

/// Integer sample types accepted by the photometric corrector.
pub trait RawSample: Copy + Send + Sync + 'static {
    /// Width of the storage type in bits
    const BITS: u32;

    /// Sample value as an intensity level
    fn level(self) -> u32;
}

impl RawSample for u8 {
    const BITS: u32 = 8;

    #[inline]
    fn level(self) -> u32 {
        self as u32
    }
}

impl RawSample for u16 {
    const BITS: u32 = 16;

    #[inline]
    fn level(self) -> u32 {
        self as u32
    }
}

/// Represents a single-channel raw sensor frame
#[derive(Debug, Clone, PartialEq)]
pub struct RawImageData<T: RawSample = u16> {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Row-major pixel data
    pub data: Vec<T>,
    /// Actual bits per sample from the sensor (e.g., 8, 12, 14 or 16)
    pub bits_per_sample: u32,
}

impl<T: RawSample> RawImageData<T> {
    /// Creates a frame using the full width of the sample type.
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Self {
        Self {
            width,
            height,
            data,
            bits_per_sample: T::BITS,
        }
    }

    /// Largest intensity level the sensor can produce.
    pub fn max_level(&self) -> u32 {
        max_level_for_bits(self.bits_per_sample.min(T::BITS))
    }
}

pub fn max_level_for_bits(bits: u32) -> u32 {
    match bits {
        0 => 1,
        b if b >= 32 => u32::MAX,
        b => (1u32 << b) - 1,
    }
}
