//! Core utilities: configuration, errors, logging, pricing, branding

pub mod branding;
pub mod config;
pub mod error;
pub mod logging;
pub mod pricing;

pub use error::{AppError, AppResult};
pub use logging::init_logger;
