//! User interface components.
//!
//! This module provides:
//! - CLI interface
//! - Console messages that wait for the user before the window closes

pub mod cli;
pub mod console;

pub use cli::{Cli, Invocation};
