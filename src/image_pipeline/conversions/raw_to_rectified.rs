use tracing::{info, instrument};
use std::io::Write;
use std::path::Path;

use crate::image_pipeline::{
    common::error::{Result, UndistortError},
    conversions::timing::{PipelineTimings, Timer},
    debayer::CpuDebayer,
    raw::{RawImageData, RawImageReader, RawLoaderReader},
    rectify::Undistorter,
    tiff::{ConversionConfig, StandardTiffWriter, TiffWriter},
};

/// Scale applied to corrected intensities before encoding.
const OUTPUT_FACTOR: f32 = 1.0;

/// Decodes a RAW frame, undistorts it and writes the result as TIFF.
pub struct RawToRectifiedPipeline<R: RawImageReader, W: TiffWriter> {
    reader: R,
    writer: W,
    undistorter: Undistorter,
    config: ConversionConfig,
}

impl RawToRectifiedPipeline<RawLoaderReader, StandardTiffWriter> {
    pub fn new(undistorter: Undistorter, config: ConversionConfig) -> Self {
        Self {
            reader: RawLoaderReader,
            writer: StandardTiffWriter,
            undistorter,
            config,
        }
    }
}

impl<R: RawImageReader, W: TiffWriter> RawToRectifiedPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, undistorter: Undistorter, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            undistorter,
            config,
        }
    }

    fn validate_dimensions(&self, raw_image: &RawImageData) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        let (width, height) = (raw_image.width, raw_image.height);
        if width == 0 || height == 0 || raw_image.data.len() != width * height {
            return Err(UndistortError::InvalidDimensions(width, height));
        }

        let expected = self.undistorter.rectifier().original_size();
        if (width, height) != expected {
            return Err(UndistortError::DimensionMismatch {
                expected,
                found: (width, height),
            });
        }

        Ok(())
    }

    fn run(
        &self,
        input_data: &[u8],
        exposure_time: f32,
        timestamp: f64,
        output: &mut dyn Write,
        timings: &mut PipelineTimings,
    ) -> Result<()> {
        let timer = Timer::start("decode_raw");
        let raw_image = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(input_data)?
        };
        timer.stop(timings);

        let timer = Timer::start("validate_dimensions");
        self.validate_dimensions(&raw_image)?;
        timer.stop(timings);

        if self.config.debayer {
            let timer = Timer::start("debayer");
            let planes = {
                let _span = tracing::info_span!("debayer").entered();
                CpuDebayer
                    .process(&raw_image)
                    .map_err(|e| UndistortError::DebayerError(e.to_string()))?
                    .split_channels()
            };
            timer.stop(timings);

            let timer = Timer::start("undistort");
            let [r, g, b] = &planes;
            let rectified = {
                let _span = tracing::info_span!("undistort_colour").entered();
                self.undistorter
                    .undistort_colour([r, g, b], exposure_time, timestamp, OUTPUT_FACTOR)?
            };
            timer.stop(timings);

            let timer = Timer::start("encode_tiff");
            self.writer.write_rgb_tiff(&rectified, output, &self.config)?;
            timer.stop(timings);
        } else {
            let timer = Timer::start("undistort");
            let rectified = {
                let _span = tracing::info_span!("undistort").entered();
                self.undistorter
                    .undistort(&raw_image, exposure_time, timestamp, OUTPUT_FACTOR)?
            };
            timer.stop(timings);

            let timer = Timer::start("encode_tiff");
            self.writer.write_tiff(&rectified, output, &self.config)?;
            timer.stop(timings);
        }

        let (width, height) = self.undistorter.rectifier().size();
        info!(
            "Rectified {}x{} -> {}x{} in {:.3}ms",
            raw_image.width,
            raw_image.height,
            width,
            height,
            timings.total_duration().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(
        &self,
        input_data: &[u8],
        exposure_time: f32,
        timestamp: f64,
        output: &mut dyn Write,
    ) -> Result<()> {
        self.convert_with_timings(input_data, exposure_time, timestamp, output)
            .map(|_| ())
    }

    pub fn convert_with_timings(
        &self,
        input_data: &[u8],
        exposure_time: f32,
        timestamp: f64,
        output: &mut dyn Write,
    ) -> Result<PipelineTimings> {
        let mut timings = PipelineTimings::new();
        self.run(input_data, exposure_time, timestamp, output, &mut timings)?;
        Ok(timings)
    }

    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        exposure_time: f32,
    ) -> Result<PipelineTimings> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let mut timings = PipelineTimings::new();

        let timer = Timer::start("read_input_file");
        let input_data = std::fs::read(input_path).map_err(|e| {
            UndistortError::InputReadError(format!("{}: {}", input_path.display(), e))
        })?;
        timer.stop(&mut timings);

        let timer = Timer::start("create_output_file");
        let mut output_file = std::fs::File::create(output_path).map_err(|e| {
            UndistortError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;
        timer.stop(&mut timings);

        self.run(&input_data, exposure_time, 0.0, &mut output_file, &mut timings)?;

        Ok(timings)
    }

    pub fn undistorter(&self) -> &Undistorter {
        &self.undistorter
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }
}
