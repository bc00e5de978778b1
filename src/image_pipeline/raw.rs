//! RAW frame reading module
//!
//! This module provides the minimal raw-image container and format-agnostic
//! RAW decoding.

mod reader;
mod rawloader_reader;
pub mod types;

pub use reader::RawImageReader;
pub use rawloader_reader::RawLoaderReader;
pub use types::{RawImageData, RawSample};
