//! Image processing pipeline module
//!
//! Photometric and geometric undistortion of camera frames, with RAW reading,
//! TIFF writing and conversion orchestration around it.

pub mod common;
pub mod conversions;
pub mod debayer;
pub mod distortion;
pub mod photometric;
pub mod raw;
pub mod rectify;
pub mod tiff;

pub use common::{
    ColourImageAndExposure,
    ImageAndExposure,
    PhotometricMode,
    RectifySettings,
    Result,
    UndistortError,
};

pub use raw::{
    RawImageData,
    RawImageReader,
    RawLoaderReader,
};

pub use tiff::{
    TiffCompression,
    ConversionConfig,
    ConversionConfigBuilder,
    OutputSampleFormat,
    TiffWriter,
    StandardTiffWriter,
};

pub use distortion::{DistortionModel, LensModel, ModelKind};
pub use photometric::PhotometricCorrector;
pub use rectify::{GeometricCalibration, OutputPolicy, Rectifier, Undistorter};

pub use conversions::{
    PipelineTimings,
    RawToRectifiedPipeline,
};
