use std::fs;
use std::path::Path;

use tracing::{info, warn};
use crate::image_pipeline::common::error::{Result, UndistortError};
use crate::image_pipeline::distortion::ModelKind;

/// How the rectified camera matrix is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputPolicy {
    /// Largest rectangle whose every pixel maps inside the raw image
    Crop,
    /// Smallest rectangle containing every raw pixel
    Full,
    /// No rectification, output equals the raw frame
    None,
    /// Relative camera matrix given in the calibration file
    Explicit { fx: f64, fy: f64, cx: f64, cy: f64 },
}

/// Parsed contents of a geometric calibration file.
///
/// ```text
/// RadTan 458.6 457.3 367.2 248.4 -0.28 0.07 0.0002 0.00002
/// 752 480
/// crop
/// 640 480
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricCalibration {
    pub model: ModelKind,
    /// Full coefficient vector, intrinsics first, in pixels
    pub parameters: Vec<f64>,
    pub raw_width: usize,
    pub raw_height: usize,
    pub policy: OutputPolicy,
    pub output_width: usize,
    pub output_height: usize,
}

impl GeometricCalibration {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            UndistortError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        info!("Reading geometric calibration from {}", path.display());
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();

        let (model, mut parameters, inline_size) = parse_model_line(lines.next())?;
        let (raw_width, raw_height) = parse_size(lines.next(), "input resolution")?;

        if let Some(size) = inline_size {
            if size != (raw_width, raw_height) {
                return Err(UndistortError::MalformedCalibration(format!(
                    "model line gives {}x{} but input resolution is {}x{}",
                    size.0, size.1, raw_width, raw_height
                )));
            }
        }

        if parameters[2] < 1.0 && parameters[3] < 1.0 {
            info!("Relative calibration detected, scaling intrinsics by {}x{}", raw_width, raw_height);
            parameters[0] *= raw_width as f64;
            parameters[1] *= raw_height as f64;
            parameters[2] = parameters[2] * raw_width as f64 - 0.5;
            parameters[3] = parameters[3] * raw_height as f64 - 0.5;
        }

        let policy = parse_policy(lines.next())?;
        let (output_width, output_height) = parse_size(lines.next(), "output resolution")?;

        Ok(Self {
            model,
            parameters,
            raw_width,
            raw_height,
            policy,
            output_width,
            output_height,
        })
    }

    pub fn raw_size(&self) -> (usize, usize) {
        (self.raw_width, self.raw_height)
    }

    pub fn output_size(&self) -> (usize, usize) {
        (self.output_width, self.output_height)
    }
}

type ModelLine = (ModelKind, Vec<f64>, Option<(usize, usize)>);

fn parse_model_line(line: Option<&str>) -> Result<ModelLine> {
    let line = line
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| UndistortError::MalformedCalibration("missing camera model line".to_string()))?;

    let mut tokens = line.split_whitespace().peekable();
    let prefix = match tokens.peek() {
        Some(first) if first.parse::<f64>().is_err() => tokens.next(),
        _ => None,
    };
    let mut values = tokens
        .map(|t| {
            t.parse::<f64>().map_err(|_| {
                UndistortError::MalformedCalibration(format!("invalid camera parameter '{t}'"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    match prefix {
        Some(name) => {
            let kind = ModelKind::from_identifier(name)?;
            let inline_size = split_inline_size(&mut values, kind.parameter_count());
            if values.len() != kind.parameter_count() {
                return Err(UndistortError::ParameterCount {
                    model: kind.identifier(),
                    expected: kind.parameter_count(),
                    found: values.len(),
                });
            }
            Ok((kind, values, inline_size))
        }
        None => {
            let inline_size = match values.len() {
                7 => split_inline_size(&mut values, 5),
                10 => split_inline_size(&mut values, 8),
                _ => None,
            };
            let kind = ModelKind::from_legacy_parameters(&values)?;
            warn!("Calibration without model identifier, assuming {}", kind.identifier());
            Ok((kind, values, inline_size))
        }
    }
}

/// Strips a trailing `width height` pair from `values` if it is present.
fn split_inline_size(values: &mut Vec<f64>, count: usize) -> Option<(usize, usize)> {
    if values.len() != count + 2 {
        return None;
    }
    let height = values.pop()?;
    let width = values.pop()?;
    let as_size = |v: f64| (v >= 1.0 && v.fract() == 0.0).then_some(v as usize);
    match (as_size(width), as_size(height)) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => {
            values.push(width);
            values.push(height);
            None
        }
    }
}

fn parse_size(line: Option<&str>, what: &str) -> Result<(usize, usize)> {
    let line = line.ok_or_else(|| UndistortError::MalformedCalibration(format!("missing {what}")))?;
    let mut tokens = line.split_whitespace().map(str::parse::<usize>);
    match (tokens.next(), tokens.next()) {
        (Some(Ok(w)), Some(Ok(h))) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(UndistortError::MalformedCalibration(format!(
            "invalid {what}: '{}'",
            line.trim()
        ))),
    }
}

fn parse_policy(line: Option<&str>) -> Result<OutputPolicy> {
    let line = line
        .map(str::trim)
        .ok_or_else(|| UndistortError::MalformedCalibration("missing output policy".to_string()))?;

    match line {
        "crop" => return Ok(OutputPolicy::Crop),
        "full" => return Ok(OutputPolicy::Full),
        "none" => return Ok(OutputPolicy::None),
        _ => {}
    }

    let values: Vec<f64> = line
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| UndistortError::MalformedCalibration(format!("invalid output policy '{line}'")))?;

    match values.as_slice() {
        &[fx, fy, cx, cy, _] => {
            if cx > 1.0 || cy > 1.0 {
                warn!("Output camera matrix looks absolute, expected relative values (cx={cx}, cy={cy})");
            }
            Ok(OutputPolicy::Explicit { fx, fy, cx, cy })
        }
        _ => Err(UndistortError::MalformedCalibration(format!(
            "output camera matrix needs 5 values, got {}",
            values.len()
        ))),
    }
}
