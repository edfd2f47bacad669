//! Windows shell integration.
//!
//! This module provides:
//! - Context-menu verb registration in the registry
//! - The elevation check guarding registry writes
//! - Opening report links in the default browser

pub mod elevation;
pub mod opener;
pub mod registration;
pub mod registry;

pub use elevation::is_process_elevated;
pub use opener::{RecordingOpener, SystemUrlOpener, UrlOpener};
pub use registration::menu_command;
pub use registry::{
    ContextMenuEntry, MemoryRegistry, ShellExtension, ShellRegistry, WindowsRegistry,
};

/// File type the verb is registered for.
pub const FILE_TYPE: &str = "*";

/// Registry key name of the context-menu verb.
pub const KEY_NAME: &str = "VirusTotalContextMenu";

/// Text shown in the context menu.
pub const MENU_TEXT: &str = "VT Scan";

/// Whether the context-menu verb is currently registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Registered,
    Unregistered,
}

/// A change to the context-menu registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    Register,
    Unregister,
}
