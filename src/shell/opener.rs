//! Opening report links in the user's default browser.

use crate::core::error::{Error, Result};
use std::process::Command;
use std::sync::Mutex;

/// `CREATE_NO_WINDOW` process creation flag.
#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Something that can show a URL to the user.
pub trait UrlOpener {
    /// Open the URL with the default handler.
    fn open(&self, url: &str) -> Result<()>;
}

/// Escape a URL for use as an argument on a `cmd.exe` command line.
///
/// `&` separates commands in `cmd`, so it is escaped with `^`.
pub fn escape_for_cmd(url: &str) -> String {
    url.replace('&', "^&")
}

/// Program and arguments used to open a URL on this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Program to run
    pub program: &'static str,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

/// Build the launcher command for a URL.
#[cfg(target_os = "windows")]
pub fn launch_command(url: &str) -> LaunchCommand {
    LaunchCommand {
        program: "cmd",
        args: vec!["/c".to_string(), "start".to_string(), escape_for_cmd(url)],
    }
}

#[cfg(target_os = "macos")]
pub fn launch_command(url: &str) -> LaunchCommand {
    LaunchCommand {
        program: "open",
        args: vec![url.to_string()],
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn launch_command(url: &str) -> LaunchCommand {
    LaunchCommand {
        program: "xdg-open",
        args: vec![url.to_string()],
    }
}

/// Opens URLs by spawning the platform launcher without a console window.
#[derive(Debug, Default)]
pub struct SystemUrlOpener;

impl SystemUrlOpener {
    /// Create a new opener.
    pub fn new() -> Self {
        Self
    }
}

impl UrlOpener for SystemUrlOpener {
    fn open(&self, url: &str) -> Result<()> {
        let launch = launch_command(url);
        log::debug!("Launching {} {:?}", launch.program, launch.args);

        let mut command = Command::new(launch.program);
        command.args(&launch.args);

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        // The launcher exits on its own once the browser has the URL
        command.spawn().map_err(|e| Error::Launch {
            url: url.to_string(),
            source: e,
        })?;

        Ok(())
    }
}

/// Opener that records URLs instead of launching anything, for testing.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| Error::Internal("recording opener lock poisoned".to_string()))?
            .push(url.to_string());
        Ok(())
    }
}
