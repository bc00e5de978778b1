use std::io::Write;

use crate::image_pipeline::common::error::UndistortError;
use crate::image_pipeline::common::settings::{PhotometricMode, RectifySettings};
use crate::image_pipeline::raw::types::RawImageData;
use super::*;

fn gamma_values(depth: usize) -> Vec<f64> {
    (0..depth).map(|i| 3.0 + (i as f64).powf(1.4)).collect()
}

fn radial_vignette(width: usize, height: usize) -> Vec<f32> {
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    let mut values = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let r2 = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)) / (width * width) as f32;
            values.push(800.0 * (1.0 - 0.5 * r2));
        }
    }
    values
}

fn corrector(width: usize, height: usize) -> PhotometricCorrector {
    let response = InverseResponse::from_values(&gamma_values(256)).unwrap();
    let vignette = VignetteField::from_values(width, height, radial_vignette(width, height)).unwrap();
    PhotometricCorrector::from_parts(response, Some(vignette), width, height, &RectifySettings::default())
}

fn write_gamma_file(values: &[f64]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    writeln!(file, "{}", line.join(" ")).unwrap();
    file
}

#[test]
fn test_uniform_frame_maps_to_g() {
    let response = InverseResponse::from_values(&gamma_values(256)).unwrap();
    let corrector = PhotometricCorrector::from_parts(
        response,
        Some(VignetteField::flat(8, 6)),
        8,
        6,
        &RectifySettings::default(),
    );
    assert!(corrector.is_valid());

    let frame = RawImageData::new(8, 6, vec![128u8; 48]);
    let output = corrector.process_frame(&frame, 1.0, 1.0).unwrap();

    let g128 = corrector.get_g().unwrap()[128];
    assert!(output.image.iter().all(|&v| v == g128));
    assert_eq!(output.exposure_time, 1.0);
}

#[test]
fn test_response_is_normalized_and_monotonic() {
    let response = InverseResponse::from_values(&gamma_values(1024)).unwrap();
    let g = response.as_slice();
    assert_eq!(g.len(), 1024);
    assert_eq!(g[0], 0.0);
    assert!((g[1023] - 255.0).abs() < 1e-4);
    assert!(g.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_non_monotonic_response_rejected() {
    let mut values = gamma_values(256);
    values[100] = values[99] - 1.0;

    assert!(matches!(
        InverseResponse::from_values(&values),
        Err(UndistortError::InvalidResponse(_))
    ));

    let file = write_gamma_file(&values);
    let corrector = PhotometricCorrector::new(Some(file.path()), None, 4, 4, &RectifySettings::default());
    assert!(!corrector.is_valid());
    assert!(corrector.get_g().is_none());
}

#[test]
fn test_short_or_flat_response_rejected() {
    assert!(InverseResponse::from_values(&gamma_values(100)).is_err());
    assert!(InverseResponse::from_values(&vec![5.0; 256]).is_err());
}

#[test]
fn test_response_plateau_is_accepted() {
    let mut values = gamma_values(256);
    values[10] = values[9];
    assert!(InverseResponse::from_values(&values).is_ok());
}

#[test]
fn test_gamma_file_is_read() {
    let file = write_gamma_file(&gamma_values(256));
    let response = InverseResponse::from_file(file.path()).unwrap();
    assert_eq!(response.depth(), 256);
}

#[test]
fn test_malformed_gamma_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0 1 2 three").unwrap();
    assert!(matches!(
        InverseResponse::from_file(file.path()),
        Err(UndistortError::MalformedCalibration(_))
    ));
}

#[test]
fn test_round_trip_8bit() {
    let (width, height) = (16, 8);
    let corrector = corrector(width, height);
    let data: Vec<u8> = (0..width * height).map(|i| ((i * 7) % 256) as u8).collect();
    let frame = RawImageData::new(width, height, data.clone());

    let mut output = corrector.process_frame(&frame, 4.0, 1.0).unwrap();
    corrector.unmap_float_image(&mut output.image, 1.0, 8).unwrap();

    for (restored, original) in output.image.iter().zip(&data) {
        assert!((restored - *original as f32).abs() < 0.05, "{restored} vs {original}");
    }
}

#[test]
fn test_round_trip_12bit_interpolated() {
    let (width, height) = (16, 8);
    let corrector = corrector(width, height);
    let data: Vec<u16> = (0..width * height).map(|i| ((i * 37) % 4096) as u16).collect();
    let frame = RawImageData {
        width,
        height,
        data: data.clone(),
        bits_per_sample: 12,
    };

    let mut output = corrector.process_frame(&frame, 2.0, 0.5).unwrap();
    corrector.unmap_float_image(&mut output.image, 0.5, 12).unwrap();

    for (restored, original) in output.image.iter().zip(&data) {
        assert!((restored - *original as f32).abs() < 0.5, "{restored} vs {original}");
    }
}

#[test]
fn test_unmap_rejects_wrong_buffer_length() {
    let corrector = corrector(16, 8);
    let mut image = vec![1.0f32; 100];

    let err = corrector.unmap_float_image(&mut image, 1.0, 8).unwrap_err();
    assert!(matches!(err, UndistortError::BufferLength { expected: 128, found: 100 }));
    assert!(err.to_string().contains("100"));
    assert_eq!(image, vec![1.0f32; 100]);
}

#[test]
fn test_vignette_is_divided_out() {
    let (width, height) = (8, 8);
    let response = InverseResponse::identity(256);
    let mut values = vec![1.0f32; width * height];
    values[0] = 0.5;
    let vignette = VignetteField::from_values(width, height, values).unwrap();
    let corrector =
        PhotometricCorrector::from_parts(response, Some(vignette), width, height, &RectifySettings::default());

    let frame = RawImageData::new(width, height, vec![100u8; width * height]);
    let output = corrector.process_frame(&frame, 1.0, 1.0).unwrap();

    assert!((output.image[0] - 200.0).abs() < 1e-3);
    assert!((output.image[1] - 100.0).abs() < 1e-3);
}

#[test]
fn test_vignette_normalized_at_centre() {
    let vignette = VignetteField::from_values(5, 3, (1..=15).map(|v| v as f32).collect()).unwrap();
    assert_eq!(vignette.factors()[5 + 2], 1.0);
    assert!(vignette.factors().iter().all(|&v| v > 0.0));
    assert_eq!(vignette.inverse_factors()[0], 8.0);
}

#[test]
fn test_non_positive_vignette_rejected() {
    let mut values = vec![1.0f32; 16];
    values[3] = 0.0;
    assert!(matches!(
        VignetteField::from_values(4, 4, values),
        Err(UndistortError::InvalidVignette(_))
    ));
}

#[test]
fn test_missing_calibration_degrades_to_copy() {
    let corrector = PhotometricCorrector::new(None, None, 4, 2, &RectifySettings::default());
    assert!(!corrector.is_valid());
    assert!(corrector.get_g().is_none());

    let frame = RawImageData::new(4, 2, vec![0u16, 1, 2, 3, 1000, 2000, 40000, 65535]);
    let output = corrector.process_frame(&frame, 10.0, 2.0).unwrap();
    assert_eq!(output.image, vec![0.0, 2.0, 4.0, 6.0, 2000.0, 4000.0, 80000.0, 131070.0]);
    assert_eq!(output.exposure_time, 10.0);
}

#[test]
fn test_vignette_size_mismatch_invalidates() {
    let response = InverseResponse::from_values(&gamma_values(256)).unwrap();
    let corrector = PhotometricCorrector::from_parts(
        response,
        Some(VignetteField::flat(2, 2)),
        4,
        4,
        &RectifySettings::default(),
    );
    assert!(!corrector.is_valid());
}

#[test]
fn test_response_only_mode_needs_no_vignette() {
    let settings = RectifySettings::builder()
        .photometric_mode(PhotometricMode::ResponseOnly)
        .build();
    let response = InverseResponse::from_values(&gamma_values(256)).unwrap();
    let corrector = PhotometricCorrector::from_parts(response, None, 2, 2, &settings);
    assert!(corrector.is_valid());

    let frame = RawImageData::new(2, 2, vec![255u8; 4]);
    let output = corrector.process_frame(&frame, 1.0, 1.0).unwrap();
    assert!(output.image.iter().all(|&v| (v - 255.0).abs() < 1e-3));
}

#[test]
fn test_disabled_mode_copies() {
    let settings = RectifySettings::builder()
        .photometric_mode(PhotometricMode::Disabled)
        .build();
    let response = InverseResponse::from_values(&gamma_values(256)).unwrap();
    let corrector = PhotometricCorrector::from_parts(response, None, 2, 1, &settings);

    let frame = RawImageData::new(2, 1, vec![3u8, 200]);
    let output = corrector.process_frame(&frame, 1.0, 1.0).unwrap();
    assert_eq!(output.image, vec![3.0, 200.0]);
}

#[test]
fn test_non_positive_exposure_copies() {
    let corrector = corrector(4, 4);
    let frame = RawImageData::new(4, 4, vec![17u8; 16]);
    let output = corrector.process_frame(&frame, 0.0, 1.0).unwrap();
    assert!(output.image.iter().all(|&v| v == 17.0));
}

#[test]
fn test_exposure_ignored_when_disabled() {
    let settings = RectifySettings::builder().use_exposure(false).build();
    let corrector = PhotometricCorrector::passthrough(2, 2, &settings);
    let frame = RawImageData::new(2, 2, vec![1u8; 4]);
    let output = corrector.process_frame(&frame, 12.5, 1.0).unwrap();
    assert_eq!(output.exposure_time, 1.0);
}

#[test]
fn test_frame_size_mismatch() {
    let corrector = corrector(4, 4);
    let frame = RawImageData::new(3, 4, vec![0u8; 12]);
    assert!(matches!(
        corrector.process_frame(&frame, 1.0, 1.0),
        Err(UndistortError::DimensionMismatch { expected: (4, 4), found: (3, 4) })
    ));
}

#[test]
fn test_vignette_tiff_is_loaded() {
    let (width, height) = (6, 4);
    let values: Vec<u16> = radial_vignette(width, height).iter().map(|&v| v as u16).collect();
    let file = tempfile::NamedTempFile::new().unwrap();
    {
        let mut encoder = tiff::encoder::TiffEncoder::new(std::fs::File::create(file.path()).unwrap()).unwrap();
        encoder
            .write_image::<tiff::encoder::colortype::Gray16>(width as u32, height as u32, &values)
            .unwrap();
    }
    let gamma = write_gamma_file(&gamma_values(256));

    let corrector = PhotometricCorrector::new(
        Some(gamma.path()),
        Some(file.path()),
        width,
        height,
        &RectifySettings::default(),
    );
    assert!(corrector.is_valid());
    let vignette = corrector.vignette().unwrap();
    assert_eq!(vignette.factors()[(height / 2) * width + width / 2], 1.0);

    let wrong_size = PhotometricCorrector::new(Some(gamma.path()), Some(file.path()), 4, 4, &RectifySettings::default());
    assert!(!wrong_size.is_valid());
}
