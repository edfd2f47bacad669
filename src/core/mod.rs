//! Core module containing fundamental types, configuration, and error handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApiKey, AppSettings};
pub use error::{Error, Result};
