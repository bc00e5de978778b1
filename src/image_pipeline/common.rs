//! Common utilities module
//!
//! Shared error type, runtime settings and frame containers used across the
//! image pipeline.

pub mod error;
pub mod frame;
pub mod settings;

pub use error::{UndistortError, Result};
pub use frame::{ColourImageAndExposure, ImageAndExposure};
pub use settings::{PhotometricMode, RectifySettings, RectifySettingsBuilder};
