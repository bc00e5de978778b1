//! Pipeline conversions module
//!
//! Orchestrates RAW decoding, undistortion and TIFF encoding for single frames.

mod raw_to_rectified;
pub mod timing;

#[cfg(test)]
mod tests;

pub use raw_to_rectified::RawToRectifiedPipeline;
pub use timing::{PipelineTimings, StepTiming, Timer};
