use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::tiff::types::GrayImage;

/// Reads an 8-bit, 16-bit or float single-channel TIFF as `f32` samples.
pub fn read_gray_tiff<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        UndistortError::InputReadError(format!("{}: {}", path.display(), e))
    })?;
    let decode_err = |e: tiff::TiffError| UndistortError::DecodeError(format!("{}: {}", path.display(), e));

    let mut decoder = Decoder::new(BufReader::new(file)).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    match decoder.colortype().map_err(decode_err)? {
        ColorType::Gray(_) => {}
        other => {
            return Err(UndistortError::UnsupportedFormat(format!(
                "{}: expected a single-channel image, got {:?}",
                path.display(),
                other
            )));
        }
    }

    let data: Vec<f32> = match decoder.read_image().map_err(decode_err)? {
        DecodingResult::U8(values) => values.into_iter().map(f32::from).collect(),
        DecodingResult::U16(values) => values.into_iter().map(f32::from).collect(),
        DecodingResult::F32(values) => values,
        _ => {
            return Err(UndistortError::UnsupportedFormat(format!(
                "{}: unsupported sample type",
                path.display()
            )));
        }
    };

    Ok(GrayImage {
        width: width as usize,
        height: height as usize,
        data,
    })
}
