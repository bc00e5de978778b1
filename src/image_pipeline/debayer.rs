//! Debayering module for splitting Bayer mosaics into colour planes
//!
//! The colour undistortion path demosaics the raw frame first, then corrects
//! and rectifies each channel with the same tables as a mono frame.

pub mod cpu_debayer;
pub mod types;


pub use cpu_debayer::CpuDebayer;
pub use types::RgbImageData;
