use std::io::Write;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::frame::{ColourImageAndExposure, ImageAndExposure};
use crate::image_pipeline::tiff::types::ConversionConfig;

pub trait TiffWriter {
    fn write_tiff(&self, image: &ImageAndExposure, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
    fn write_rgb_tiff(&self, image: &ColourImageAndExposure, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
