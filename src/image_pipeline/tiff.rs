//! TIFF module
//!
//! Writes rectified frames and reads single-channel calibration images
//! (vignette maps).

mod reader;
mod writer;
mod standard_tiff_writer;
pub mod types;

pub use reader::read_gray_tiff;
pub use writer::TiffWriter;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, GrayImage, OutputSampleFormat, TiffCompression};
