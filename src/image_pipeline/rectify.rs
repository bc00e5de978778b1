//! Geometric rectification module
//!
//! Parses the geometric calibration, chooses the rectified camera matrix and
//! resamples frames through a precomputed remap table.

pub mod calibration;
mod optimal_k;
pub mod remap;
mod rectifier;
mod undistorter;


pub use calibration::{GeometricCalibration, OutputPolicy};
pub use rectifier::Rectifier;
pub use remap::{RemapTable, INVALID_COORDINATE};
pub use undistorter::Undistorter;
