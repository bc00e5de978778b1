use anyhow::Result;
use tracing::debug;
use std::io::Cursor;
use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use crate::image_pipeline::{debayer::RgbImageData, raw::types::RawImageData};

/// Linear RGGB demosaicing on the CPU.
///
/// Channel values are left in sensor units; no black level, white balance or
/// colour matrix is applied because the photometric calibration expects raw
/// intensities.
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn process(&self, raw_image: &RawImageData<u16>) -> Result<RgbImageData> {
        let width = raw_image.width;
        let height = raw_image.height;
        if width < 2 || height < 2 || raw_image.data.len() != width * height {
            anyhow::bail!("cannot demosaic a {}x{} frame with {} samples", width, height, raw_image.data.len());
        }

        // bayer crate only supports 8 and 16 bit
        let (bayer_depth, raster_depth, bytes_per_pixel) = if raw_image.bits_per_sample <= 8 {
            (BayerDepth::Depth8, RasterDepth::Depth8, 1)
        } else {
            (BayerDepth::Depth16LE, RasterDepth::Depth16, 2)
        };

        let bayer_bytes: Vec<u8> = if bytes_per_pixel == 1 {
            raw_image.data.iter().map(|&val| val as u8).collect()
        } else {
            raw_image.data.iter().flat_map(|&val| val.to_le_bytes()).collect()
        };

        let output_buf_size = width * height * 3 * bytes_per_pixel;
        let mut output_buf = vec![0u8; output_buf_size];
        let mut cursor = Cursor::new(&bayer_bytes[..]);

        debug!("Running demosaic on {}x{} with depth={:?}, CFA=RGGB, algo=Linear", width, height, bayer_depth);

        let mut output_raster = RasterMut::new(width, height, raster_depth, &mut output_buf);
        bayer::run_demosaic(
            &mut cursor,
            bayer_depth,
            CFA::RGGB,
            Demosaic::Linear,
            &mut output_raster,
        )
        .map_err(|e| anyhow::anyhow!("Demosaic failed: {:?}", e))?;

        let data: Vec<u16> = if bytes_per_pixel == 1 {
            output_buf.iter().map(|&b| b as u16).collect()
        } else {
            output_buf
                .chunks_exact(2)
                .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
                .collect()
        };

        Ok(RgbImageData {
            width,
            height,
            data,
            bits_per_sample: raw_image.bits_per_sample,
        })
    }
}
