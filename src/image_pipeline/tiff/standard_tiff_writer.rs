use std::io::{Cursor, Write};
use tiff::encoder::{colortype, compression::DeflateLevel, Compression, TiffEncoder};
use tracing::debug;
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::common::frame::{ColourImageAndExposure, ImageAndExposure};
use crate::image_pipeline::tiff::types::{ConversionConfig, OutputSampleFormat, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

fn build_encoder<'a>(buffer: &'a mut Vec<u8>, config: &ConversionConfig) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
    let compression = match config.compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    };

    let mut encoder = TiffEncoder::new(Cursor::new(buffer))
        .map_err(|e| UndistortError::EncodeError(e.to_string()))?
        .with_compression(compression);

    if let Some(predictor_val) = config.predictor {
        let predictor = match predictor_val {
            2 => tiff::tags::Predictor::Horizontal,
            _ => tiff::tags::Predictor::None,
        };
        encoder = encoder.with_predictor(predictor);
    }
    Ok(encoder)
}

fn to_gray16(values: &[f32], scale: f32) -> Vec<u16> {
    values
        .iter()
        .map(|&v| (v * scale).round().clamp(0.0, u16::MAX as f32) as u16)
        .collect()
}

impl TiffWriter for StandardTiffWriter {
    fn write_tiff(&self, image: &ImageAndExposure, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!("Encoding rectified TIFF: {}x{} ({:?})", image.width, image.height, config.sample_format);

        let mut buffer = Vec::new();
        let (width, height) = (image.width as u32, image.height as u32);

        {
            let mut encoder = build_encoder(&mut buffer, config)?;
            match config.sample_format {
                OutputSampleFormat::Gray16 => encoder.write_image::<colortype::Gray16>(
                    width,
                    height,
                    &to_gray16(&image.image, config.gray16_scale),
                ),
                OutputSampleFormat::Float32 => {
                    encoder.write_image::<colortype::Gray32Float>(width, height, &image.image)
                }
            }
            .map_err(|e| UndistortError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }

    fn write_rgb_tiff(&self, image: &ColourImageAndExposure, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!("Encoding rectified RGB TIFF: {}x{} ({:?})", image.width, image.height, config.sample_format);

        let mut buffer = Vec::new();
        let (width, height) = (image.width as u32, image.height as u32);
        let interleaved = image.interleaved();

        {
            let mut encoder = build_encoder(&mut buffer, config)?;
            match config.sample_format {
                OutputSampleFormat::Gray16 => encoder.write_image::<colortype::RGB16>(
                    width,
                    height,
                    &to_gray16(&interleaved, config.gray16_scale),
                ),
                OutputSampleFormat::Float32 => {
                    encoder.write_image::<colortype::RGB32Float>(width, height, &interleaved)
                }
            }
            .map_err(|e| UndistortError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;

        debug!("RGB TIFF encoding complete");
        Ok(())
    }
}
