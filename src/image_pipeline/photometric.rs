//! Photometric calibration module
//!
//! Inverts the sensor response curve and the lens vignette so frames carry
//! irradiance instead of raw intensity.

mod corrector;
pub mod response;
pub mod vignette;

#[cfg(test)]
mod tests;

pub use corrector::PhotometricCorrector;
pub use response::InverseResponse;
pub use vignette::VignetteField;
