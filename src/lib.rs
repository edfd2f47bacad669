//! vt-context-menu: scan files with VirusTotal from the Explorer context menu
//!
//! This crate registers a "VT Scan" verb for all files in the Windows shell
//! and, when the verb is used, looks the file up on VirusTotal. An existing
//! report is opened in the browser; unknown files are uploaded first.

pub mod core;
pub mod scan;
pub mod shell;
pub mod ui;
pub mod utils;
pub mod virustotal;

// Re-export commonly used types
pub use crate::core::config::{ApiKey, AppSettings};
pub use crate::core::error::{Error, Result};
pub use crate::core::types::*;
