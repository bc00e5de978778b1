use std::path::PathBuf;

use anyhow::Context;
use frame_rectify_rs::image_pipeline::{
    ConversionConfig, RawToRectifiedPipeline, RectifySettings, TiffCompression, Undistorter,
};
use frame_rectify_rs::logger;

use tracing::{error, info};

/// Exposure reported for single files, which carry no timing metadata.
const DEFAULT_EXPOSURE_MS: f32 = 1.0;

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting frame_rectify...");

    let mut args = std::env::args().skip(1);
    let mut next_path = |default: &str| PathBuf::from(args.next().unwrap_or_else(|| default.to_string()));
    let calibration = next_path("camera.txt");
    let gamma = next_path("pcalib.txt");
    let vignette = next_path("vignette.tiff");
    let input = next_path("input.arw");
    let output = next_path("output.tiff");

    let settings = RectifySettings::default();
    let undistorter = Undistorter::from_files(
        &calibration,
        gamma.exists().then_some(gamma.as_path()),
        vignette.exists().then_some(vignette.as_path()),
        &settings,
    )
    .with_context(|| format!("loading calibration from {}", calibration.display()))?;

    let config = ConversionConfig::builder()
        .compression(TiffCompression::DeflateFast)
        .predictor(Some(2))
        .build();
    let pipeline = RawToRectifiedPipeline::new(undistorter, config);

    let (width, height) = pipeline.undistorter().rectifier().size();
    info!("Rectified output: {}x{}", width, height);
    info!("Compression: {:?}", pipeline.config().compression);
    info!(
        "Photometric correction: {}",
        if pipeline.undistorter().photometric().is_valid() {
            "enabled"
        } else {
            "disabled"
        }
    );

    match pipeline.convert_file(&input, &output, DEFAULT_EXPOSURE_MS) {
        Ok(timings) => {
            timings.log_summary();
            info!("Conversion successful!");
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
