pub mod config;
pub mod display;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod plate_detection;
pub mod registry;

pub use error::{PlateError, Result};
