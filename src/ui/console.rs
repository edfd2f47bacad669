//! Console messages shown to the user.
//!
//! The program usually runs in a console window Explorer opened for it, which
//! closes as soon as the process exits. Every final message therefore waits
//! for the user before returning.

use crate::core::error::Error;
use crate::core::types::ScanOutcome;
use std::io::BufRead;

/// Prompt printed after a final message.
pub const CONTINUE_PROMPT: &str = "Press Enter to continue";

/// Exit status for a run that ended normally, including handled errors.
pub const EXIT_OK: u8 = 0;

/// Exit status for missing elevation and unexpected failures.
pub const EXIT_FAILURE: u8 = 1;

/// Print a message and wait for the user.
pub fn write_success(message: &str) {
    println!("{}", message);
    println!("{}", CONTINUE_PROMPT);
    wait_for_user();
}

/// Print an error to stderr and wait for the user.
pub fn write_error(message: &str) {
    eprintln!("{}", message);
    eprintln!("{}", CONTINUE_PROMPT);
    wait_for_user();
}

fn wait_for_user() {
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        log::debug!("Could not read from stdin: {}", e);
    }
}

/// Message and exit status for an error that ended a run.
///
/// Errors the user is expected to act on are shown as they are; anything else
/// is reported as an unknown error.
pub fn render_error(error: &Error) -> (String, u8) {
    if error.is_user_facing() {
        let status = match error {
            Error::ElevationRequired => EXIT_FAILURE,
            _ => EXIT_OK,
        };
        return (error.to_string(), status);
    }

    let mut message = format!("Unknown error happened: {}", error);
    if let Some(suggestion) = error.suggestion() {
        message.push('\n');
        message.push_str(suggestion);
    }
    (message, EXIT_FAILURE)
}

/// Log level for an error that ended a run.
///
/// Errors the user is shown as they are stay at debug level, so the console
/// only carries them once at the default level.
pub fn failure_level(error: &Error) -> log::Level {
    if error.is_user_facing() {
        log::Level::Debug
    } else {
        log::Level::Error
    }
}

/// Log an error that ended a run, tagged with its category.
pub fn log_failure(error: &Error) {
    log::log!(failure_level(error), "[{}] {}", error.category(), error);
}

/// Show the end of a scan run and return the exit status.
pub fn finish_scan(result: &Result<ScanOutcome, Error>) -> u8 {
    match result {
        Ok(outcome) => {
            if let Some(message) = outcome.message() {
                write_success(&message);
            }
            EXIT_OK
        }
        Err(error) => {
            log_failure(error);
            let (message, status) = render_error(error);
            write_error(&message);
            status
        }
    }
}
