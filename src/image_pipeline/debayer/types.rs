//! Types for debayering operations

use crate::image_pipeline::raw::types::RawImageData;

/// RGB image data after debayering
#[derive(Debug, Clone)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u16>,
    /// Bits per sample of the source mosaic; channel values stay in its range
    pub bits_per_sample: u32,
}

impl RgbImageData {
    /// Splits the interleaved data into `[R, G, B]` planes that keep the
    /// sensor bit depth.
    pub fn split_channels(&self) -> [RawImageData<u16>; 3] {
        let plane = |offset: usize| {
            let data: Vec<u16> = self.data.iter().skip(offset).step_by(3).copied().collect();
            RawImageData {
                width: self.width,
                height: self.height,
                data,
                bits_per_sample: self.bits_per_sample,
            }
        };
        [plane(0), plane(1), plane(2)]
    }
}
