//! Utility functions shared by the commands.
//!
//! ## Modules
//!
//! - [`app_data`] - User configuration file (platform config directory)
//! - [`progress`] - Build spinner, no-op without the `progress` feature

pub mod app_data;
pub mod progress;

pub use app_data::*;
pub use progress::spinner;
