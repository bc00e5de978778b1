use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use tiff::decoder::{Decoder, DecodingResult};
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::common::frame::{ColourImageAndExposure, ImageAndExposure};
use crate::image_pipeline::common::settings::RectifySettings;
use crate::image_pipeline::raw::{RawImageData, RawImageReader};
use crate::image_pipeline::rectify::Undistorter;
use crate::image_pipeline::tiff::{ConversionConfig, OutputSampleFormat, StandardTiffWriter, TiffWriter};
use super::*;

const WIDTH: usize = 16;
const HEIGHT: usize = 12;

struct MockReader {
    should_fail: bool,
    mock_data: Option<RawImageData>,
}

impl RawImageReader for MockReader {
    fn read_raw(&self, _data: &[u8]) -> Result<RawImageData> {
        if self.should_fail {
            return Err(UndistortError::DecodeError("Mock decode error".to_string()));
        }
        Ok(self.mock_data.clone().unwrap_or(RawImageData {
            width: WIDTH,
            height: HEIGHT,
            data: (0..(WIDTH * HEIGHT) as u16).collect(),
            bits_per_sample: 12,
        }))
    }
}

#[derive(Default)]
struct Written {
    mono: Vec<ImageAndExposure>,
    colour: Vec<ColourImageAndExposure>,
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Written>>,
}

impl TiffWriter for MockWriter {
    fn write_tiff(&self, image: &ImageAndExposure, _output: &mut dyn Write, _config: &ConversionConfig) -> Result<()> {
        if self.should_fail {
            return Err(UndistortError::EncodeError("Mock encode error".to_string()));
        }
        self.written.lock().unwrap().mono.push(image.clone());
        Ok(())
    }

    fn write_rgb_tiff(&self, image: &ColourImageAndExposure, _output: &mut dyn Write, _config: &ConversionConfig) -> Result<()> {
        if self.should_fail {
            return Err(UndistortError::EncodeError("Mock encode error".to_string()));
        }
        self.written.lock().unwrap().colour.push(image.clone());
        Ok(())
    }
}

fn passthrough() -> Undistorter {
    Undistorter::passthrough(WIDTH, HEIGHT, &RectifySettings::default())
}

fn mock_pipeline(
    reader: MockReader,
    should_fail: bool,
    config: ConversionConfig,
) -> (RawToRectifiedPipeline<MockReader, MockWriter>, Arc<Mutex<Written>>) {
    let written = Arc::new(Mutex::new(Written::default()));
    let writer = MockWriter { should_fail, written: written.clone() };
    (RawToRectifiedPipeline::with_custom(reader, writer, passthrough(), config), written)
}

fn ok_reader() -> MockReader {
    MockReader { should_fail: false, mock_data: None }
}

#[test]
fn test_config_builder() {
    let config = ConversionConfig::builder()
        .predictor(Some(2))
        .validate_dimensions(false)
        .debayer(true)
        .sample_format(OutputSampleFormat::Float32)
        .build();

    assert_eq!(config.predictor, Some(2));
    assert!(!config.validate_dimensions);
    assert!(config.debayer);
    assert_eq!(config.sample_format, OutputSampleFormat::Float32);
    assert_eq!(config.gray16_scale, 256.0);
}

#[test]
fn test_successful_conversion() {
    let (pipeline, written) = mock_pipeline(ok_reader(), false, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", 8.0, 1.5, &mut output);

    assert!(result.is_ok());
    let written = written.lock().unwrap();
    assert_eq!(written.mono.len(), 1);
    let frame = &written.mono[0];
    assert_eq!((frame.width, frame.height), (WIDTH, HEIGHT));
    assert_eq!(frame.exposure_time, 8.0);
    assert_eq!(frame.timestamp, 1.5);
    assert_eq!(frame.image[17], 17.0);
}

#[test]
fn test_debayer_writes_colour() {
    let config = ConversionConfig::builder().debayer(true).build();
    let (pipeline, written) = mock_pipeline(ok_reader(), false, config);

    let mut output = Cursor::new(Vec::new());
    pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output).unwrap();

    let written = written.lock().unwrap();
    assert!(written.mono.is_empty());
    assert_eq!(written.colour.len(), 1);
    assert_eq!(written.colour[0].r.len(), WIDTH * HEIGHT);
}

#[test]
fn test_reader_failure() {
    let reader = MockReader { should_fail: true, mock_data: None };
    let (pipeline, _) = mock_pipeline(reader, false, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output);

    assert!(matches!(result.unwrap_err(), UndistortError::DecodeError(_)));
}

#[test]
fn test_writer_failure() {
    let (pipeline, _) = mock_pipeline(ok_reader(), true, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output);

    assert!(matches!(result.unwrap_err(), UndistortError::EncodeError(_)));
}

#[test]
fn test_dimension_validation_failure() {
    let reader = MockReader {
        should_fail: false,
        mock_data: Some(RawImageData::new(8, 8, vec![0u16; 64])),
    };
    let (pipeline, written) = mock_pipeline(reader, false, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output);

    assert!(matches!(
        result.unwrap_err(),
        UndistortError::DimensionMismatch { expected: (WIDTH, HEIGHT), found: (8, 8) }
    ));
    assert!(written.lock().unwrap().mono.is_empty());
}

#[test]
fn test_truncated_frame_rejected() {
    let reader = MockReader {
        should_fail: false,
        mock_data: Some(RawImageData::new(WIDTH, HEIGHT, vec![0u16; 10])),
    };
    let (pipeline, _) = mock_pipeline(reader, false, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output);

    assert!(matches!(result.unwrap_err(), UndistortError::InvalidDimensions(_, _)));
}

#[test]
fn test_dimension_validation_disabled_still_checks_undistorter() {
    let reader = MockReader {
        should_fail: false,
        mock_data: Some(RawImageData::new(8, 8, vec![0u16; 64])),
    };
    let config = ConversionConfig::builder().validate_dimensions(false).build();
    let (pipeline, _) = mock_pipeline(reader, false, config);

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output);

    assert!(matches!(result.unwrap_err(), UndistortError::DimensionMismatch { .. }));
}

#[test]
fn test_timings_cover_each_step() {
    let (pipeline, _) = mock_pipeline(ok_reader(), false, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let timings = pipeline
        .convert_with_timings(b"fake raw data", 1.0, 0.0, &mut output)
        .unwrap();

    let names: Vec<&str> = timings.steps().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["decode_raw", "validate_dimensions", "undistort", "encode_tiff"]);
    assert!(timings.get_step("undistort").is_some());
    assert!(timings.get_step("debayer").is_none());
}

fn decode(bytes: Vec<u8>) -> ((u32, u32), DecodingResult) {
    let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
    let dimensions = decoder.dimensions().unwrap();
    (dimensions, decoder.read_image().unwrap())
}

#[test]
fn test_gray16_output_is_scaled() {
    let pipeline = RawToRectifiedPipeline::with_custom(
        ok_reader(),
        StandardTiffWriter,
        passthrough(),
        ConversionConfig::default(),
    );

    let mut output = Vec::new();
    pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output).unwrap();

    let (dimensions, image) = decode(output);
    assert_eq!(dimensions, (WIDTH as u32, HEIGHT as u32));
    match image {
        DecodingResult::U16(values) => {
            assert_eq!(values[3], 3 * 256);
            assert_eq!(values[100], 100 * 256);
        }
        _ => panic!("expected 16-bit samples"),
    }
}

#[test]
fn test_float_output_keeps_irradiance() {
    let config = ConversionConfig::builder()
        .sample_format(OutputSampleFormat::Float32)
        .build();
    let pipeline = RawToRectifiedPipeline::with_custom(ok_reader(), StandardTiffWriter, passthrough(), config);

    let mut output = Vec::new();
    pipeline.convert(b"fake raw data", 1.0, 0.0, &mut output).unwrap();

    match decode(output).1 {
        DecodingResult::F32(values) => {
            assert_eq!(values.len(), WIDTH * HEIGHT);
            assert_eq!(values[191], 191.0);
        }
        _ => panic!("expected float samples"),
    }
}
