use thiserror::Error;

#[derive(Error, Debug)]
pub enum UndistortError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Failed to debayer image: {0}")]
    DebayerError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Image size mismatch: got {}x{}, expected {}x{}", found.0, found.1, expected.0, expected.1)]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Buffer holds {found} samples, expected {expected}")]
    BufferLength { expected: usize, found: usize },

    #[error("Malformed calibration: {0}")]
    MalformedCalibration(String),

    #[error("Unknown camera model: {0}")]
    UnknownModel(String),

    #[error("{model} expects {expected} parameters, got {found}")]
    ParameterCount {
        model: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid response calibration: {0}")]
    InvalidResponse(String),

    #[error("Invalid vignette calibration: {0}")]
    InvalidVignette(String),

    #[error("Failed to compute rectified camera matrix: {0}")]
    OptimalK(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UndistortError>;
