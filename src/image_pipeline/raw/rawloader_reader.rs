//! RAW frame reader implementation using the rawloader library.
//!
//! Decodes camera RAW files (ARW, RAF, DNG, ...) into a single-channel `u16`
//! frame whose `bits_per_sample` reflects the sensor white level, so the
//! photometric corrector can pick the right response table resolution.

use std::io::Cursor;

use tracing::debug;
use rawloader::RawImageData as RawloaderImageData;
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::raw::types::RawImageData;
use crate::image_pipeline::raw::reader::RawImageReader;

/// RAW frame reader backed by rawloader.
pub struct RawLoaderReader;

/// Bit depth used when the file carries no usable white level.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

const U16_BITS: u32 = 16;

impl RawImageReader for RawLoaderReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData<u16>> {
        debug!("Decoding RAW frame, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| UndistortError::DecodeError(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;
        if decoded.cpp != 1 {
            return Err(UndistortError::UnsupportedFormat(format!(
                "{} components per pixel, expected a single-channel sensor frame",
                decoded.cpp
            )));
        }

        // Float data is normalized to 0.0-1.0
        let data: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => values
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u16)
                .collect(),
        };

        let max_white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let bits_per_sample = if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - max_white_level.leading_zeros()
        };

        debug!(
            width,
            height,
            bits_per_sample,
            max_white_level,
            "Decoded RAW frame"
        );

        Ok(RawImageData {
            width,
            height,
            data,
            bits_per_sample,
        })
    }
}
