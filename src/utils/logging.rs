//! Logging infrastructure for vt-context-menu.
//!
//! The console doubles as the user interface, so the default level only lets
//! warnings and errors through. `--verbose` turns on the step-by-step trace.

use crate::core::error::{Error, Result};
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level
    pub level: LevelFilter,
    /// Show timestamps
    pub timestamps: bool,
    /// Show module path
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Warn,
            timestamps: true,
            module_path: false,
        }
    }
}

impl LogConfig {
    /// Create a verbose log config for CLI.
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::Debug,
            timestamps: true,
            module_path: true,
        }
    }

    /// Create a log config from a level name, falling back to the default level.
    pub fn from_level_name(name: &str) -> Self {
        let level = match name.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" | "warning" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Warn,
        };

        Self {
            level,
            module_path: level >= LevelFilter::Debug,
            ..Self::default()
        }
    }
}

/// Initialize the logging system.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let mut builder = Builder::new();

    builder.filter_level(config.level);

    let format_config = config.clone();
    builder.format(move |buf, record| {
        let mut output = String::new();

        if format_config.timestamps {
            output.push_str(&format!("{} ", Local::now().format("%Y-%m-%d %H:%M:%S")));
        }

        let level_str = match record.level() {
            log::Level::Error => "\x1b[31mERROR\x1b[0m",
            log::Level::Warn => "\x1b[33mWARN\x1b[0m ",
            log::Level::Info => "\x1b[32mINFO\x1b[0m ",
            log::Level::Debug => "\x1b[34mDEBUG\x1b[0m",
            log::Level::Trace => "\x1b[35mTRACE\x1b[0m",
        };
        output.push_str(&format!("[{}] ", level_str));

        if format_config.module_path {
            if let Some(path) = record.module_path() {
                output.push_str(&format!("{}: ", path));
            }
        }

        output.push_str(&format!("{}", record.args()));

        writeln!(buf, "{}", output)
    });

    builder
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))?;

    log::debug!("Logging initialized with level: {:?}", config.level);
    Ok(())
}
