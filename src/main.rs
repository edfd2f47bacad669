//! vt-context-menu: VirusTotal scanning from the Explorer context menu.
//!
//! This is the main entry point for the CLI application.

use std::path::Path;
use std::process::ExitCode;
use vt_context_menu::core::config::AppSettings;
use vt_context_menu::scan::run_scan;
use vt_context_menu::shell::registration::{self, menu_command};
use vt_context_menu::shell::{
    is_process_elevated, ContextMenuEntry, RegistrationAction, ShellExtension, SystemUrlOpener,
    WindowsRegistry,
};
use vt_context_menu::ui::cli::{Cli, Invocation};
use vt_context_menu::ui::console::{self, EXIT_FAILURE};
use vt_context_menu::utils::logging::{init_logging, LogConfig};
use vt_context_menu::virustotal::VirusTotalClient;
use vt_context_menu::Error;

/// Environment variable that overrides the log level.
const LOG_ENV: &str = "VT_CONTEXT_MENU_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let log_config = match std::env::var(LOG_ENV) {
        Ok(level) => LogConfig::from_level_name(&level),
        Err(_) if cli.verbose => LogConfig::verbose(),
        Err(_) => LogConfig::default(),
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("Error: {}", e);
    }

    log::debug!("vt-context-menu v{}", env!("CARGO_PKG_VERSION"));

    let status = match cli.invocation() {
        Invocation::Scan(path) => scan_file(&path).await,
        Invocation::Toggle => run_registration(None),
        Invocation::Register => run_registration(Some(RegistrationAction::Register)),
        Invocation::Unregister => run_registration(Some(RegistrationAction::Unregister)),
    };

    ExitCode::from(status)
}

/// Scan a file selected in Explorer.
async fn scan_file(path: &Path) -> u8 {
    let opener = SystemUrlOpener::new();

    let result = match AppSettings::default_path() {
        Ok(settings_path) => {
            run_scan(&settings_path, path, VirusTotalClient::new, &opener).await
        }
        Err(e) => Err(e),
    };

    console::finish_scan(&result)
}

/// Register, unregister, or toggle the context-menu entry.
fn run_registration(requested: Option<RegistrationAction>) -> u8 {
    let registry = WindowsRegistry::new();
    let extension = ShellExtension::new(&registry, ContextMenuEntry::default());

    let result = requested
        .map(Ok)
        .unwrap_or_else(|| extension.state().map(RegistrationAction::toggle_from))
        .and_then(|action| {
            let executable = std::env::current_exe().map_err(|e| {
                Error::Internal(format!("Failed to locate the running executable: {}", e))
            })?;
            log::debug!("{:?} with command {}", action, menu_command(&executable));
            registration::apply(&extension, action, is_process_elevated(), &executable)
        });

    match result {
        Ok(message) => {
            console::write_success(&message);
            console::EXIT_OK
        }
        Err(e) => {
            console::log_failure(&e);
            // Registry failures are fatal and shown with their cause
            let (message, status) = if matches!(e, Error::ElevationRequired) {
                console::render_error(&e)
            } else {
                (format_chain(&e), EXIT_FAILURE)
            };
            console::write_error(&message);
            status
        }
    }
}

/// Format an error with its source chain.
fn format_chain(error: &Error) -> String {
    let mut message = format!("Error: {}", error);
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {}", cause));
        source = std::error::Error::source(cause);
    }
    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!("\n{}", suggestion));
    }
    message
}
