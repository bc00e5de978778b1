use crate::image_pipeline::common::error::UndistortError;
use super::*;

const INTRINSICS: [f64; 4] = [400.0, 410.0, 319.5, 239.5];

fn params(extra: &[f64]) -> Vec<f64> {
    let mut params = INTRINSICS.to_vec();
    params.extend_from_slice(extra);
    params
}

fn sample_points() -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for iy in -4..=4 {
        for ix in -4..=4 {
            points.push((ix as f64 * 0.15, iy as f64 * 0.12));
        }
    }
    points
}

fn assert_round_trip(model: &LensModel) {
    for (x, y) in sample_points() {
        let (u, v) = model.distort_point(x, y);
        let (bx, by) = model
            .undistort_pixel(u, v)
            .unwrap_or_else(|| panic!("{} failed to invert ({x}, {y})", model.name()));
        assert!(
            (bx - x).abs() < 1e-6 && (by - y).abs() < 1e-6,
            "{}: ({x}, {y}) -> ({u}, {v}) -> ({bx}, {by})",
            model.name()
        );
    }
}

#[test]
fn test_round_trip_all_models() {
    let models = [
        LensModel::from_parameters(ModelKind::Fov, &params(&[0.9])).unwrap(),
        LensModel::from_parameters(ModelKind::RadTan, &params(&[-0.2, 0.05, 0.001, -0.0005])).unwrap(),
        LensModel::from_parameters(ModelKind::Equidistant, &params(&[0.02, -0.01, 0.003, -0.001])).unwrap(),
        LensModel::from_parameters(ModelKind::Pinhole, &params(&[0.0])).unwrap(),
        LensModel::from_parameters(ModelKind::KannalaBrandt, &params(&[-0.01, 0.02, -0.005, 0.001])).unwrap(),
    ];
    for model in &models {
        assert_round_trip(model);
    }
}

#[test]
fn test_principal_point_maps_to_centre() {
    let model = LensModel::from_parameters(ModelKind::KannalaBrandt, &params(&[0.1, 0.0, 0.0, 0.0])).unwrap();
    let (u, v) = model.distort_point(0.0, 0.0);
    assert_eq!((u, v), (319.5, 239.5));
}

#[test]
fn test_radtan_zero_coefficients_is_pinhole() {
    let radtan = LensModel::from_parameters(ModelKind::RadTan, &params(&[0.0; 4])).unwrap();
    let pinhole = LensModel::from_parameters(ModelKind::Pinhole, &params(&[0.0])).unwrap();
    for (x, y) in sample_points() {
        assert_eq!(radtan.distort_point(x, y), pinhole.distort_point(x, y));
    }
}

#[test]
fn test_fov_zero_omega_is_pinhole() {
    let fov = Fov::from_parameters(&params(&[0.0])).unwrap();
    assert_eq!(fov.distort_point(0.3, -0.2), fov.intrinsics().to_pixel(0.3, -0.2));
}

#[test]
fn test_fov_outside_domain_has_no_inverse() {
    let fov = Fov::from_parameters(&params(&[1.5])).unwrap();
    // normalized distorted radius 2.0 means an incidence angle of 3 rad
    assert!(fov.undistort_pixel(319.5 + 800.0, 239.5).is_none());
}

#[test]
fn test_batch_matches_single_point() {
    let model = LensModel::from_parameters(ModelKind::Equidistant, &params(&[0.02, -0.01, 0.0, 0.0])).unwrap();
    let mut xs = vec![-0.4, 0.0, 0.25];
    let mut ys = vec![0.1, 0.0, -0.3];
    let expected: Vec<(f64, f64)> = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| model.distort_point(x, y))
        .collect();

    model.distort_coordinates(&mut xs, &mut ys);

    for ((&x, &y), (ex, ey)) in xs.iter().zip(&ys).zip(expected) {
        assert_eq!((x, y), (ex, ey));
    }
}

#[test]
fn test_parameter_count_mismatch() {
    let result = LensModel::from_parameters(ModelKind::RadTan, &params(&[0.1]));
    assert!(matches!(
        result,
        Err(UndistortError::ParameterCount { model: "RadTan", expected: 8, found: 5 })
    ));
}

#[test]
fn test_zero_focal_length_rejected() {
    let result = Pinhole::from_parameters(&[0.0, 400.0, 320.0, 240.0, 0.0]);
    assert!(matches!(result, Err(UndistortError::MalformedCalibration(_))));
}

#[test]
fn test_model_kind_identifiers() {
    for kind in [
        ModelKind::Fov,
        ModelKind::RadTan,
        ModelKind::Equidistant,
        ModelKind::Pinhole,
        ModelKind::KannalaBrandt,
    ] {
        assert_eq!(ModelKind::from_identifier(kind.identifier()).unwrap(), kind);
    }
    assert!(matches!(
        ModelKind::from_identifier("DoubleSphere"),
        Err(UndistortError::UnknownModel(_))
    ));
}

#[test]
fn test_legacy_parameter_inference() {
    assert_eq!(ModelKind::from_legacy_parameters(&params(&[0.0; 4])).unwrap(), ModelKind::RadTan);
    assert_eq!(ModelKind::from_legacy_parameters(&params(&[0.0])).unwrap(), ModelKind::Pinhole);
    assert_eq!(ModelKind::from_legacy_parameters(&params(&[0.8])).unwrap(), ModelKind::Fov);
    assert!(ModelKind::from_legacy_parameters(&params(&[0.0; 2])).is_err());
}

#[test]
fn test_parameters_round_trip_through_factory() {
    let original = params(&[-0.2, 0.05, 0.001, -0.0005]);
    let model = LensModel::from_parameters(ModelKind::RadTan, &original).unwrap();
    assert_eq!(model.kind(), ModelKind::RadTan);
    assert_eq!(model.parameters(), original);
}
