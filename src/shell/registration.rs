//! Registration policy: which action to take and whether it may run.

use super::registry::{ShellExtension, ShellRegistry};
use super::{RegistrationAction, RegistrationState};
use crate::core::error::{Error, Result};
use std::path::Path;

/// Placeholder Explorer replaces with the selected file's full path.
pub const SELECTED_FILE_PLACEHOLDER: &str = "%L";

/// Build the command line the context-menu verb runs.
pub fn menu_command(executable: &Path) -> String {
    format!(
        "\"{}\" \"{}\"",
        executable.display(),
        SELECTED_FILE_PLACEHOLDER
    )
}

impl RegistrationAction {
    /// Decide the toggle action for the current state.
    pub fn toggle_from(state: RegistrationState) -> Self {
        match state {
            RegistrationState::Registered => RegistrationAction::Unregister,
            RegistrationState::Unregistered => RegistrationAction::Register,
        }
    }

    /// Past-tense verb for messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            RegistrationAction::Register => "registered",
            RegistrationAction::Unregister => "unregistered",
        }
    }
}

/// Apply a registration action.
///
/// Refuses to touch the registry unless the process is elevated. Returns the
/// message to show the user on success.
pub fn apply<R: ShellRegistry + ?Sized>(
    extension: &ShellExtension<'_, R>,
    action: RegistrationAction,
    elevated: bool,
    executable: &Path,
) -> Result<String> {
    if !elevated {
        log::debug!("Refusing to change shell registration without elevation");
        return Err(Error::ElevationRequired);
    }

    match action {
        RegistrationAction::Register => extension.register(&menu_command(executable))?,
        RegistrationAction::Unregister => extension.unregister()?,
    }

    let message = format!(
        "The '{}' shell extension was {}.",
        extension.entry().key_name,
        action.past_tense()
    );
    log::info!("{}", message);
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::registry::{ContextMenuEntry, MemoryRegistry};

    fn exe() -> &'static Path {
        Path::new(r"C:\Tools\vt-context-menu.exe")
    }

    #[test]
    fn test_toggle_from_state() {
        assert_eq!(
            RegistrationAction::toggle_from(RegistrationState::Unregistered),
            RegistrationAction::Register
        );
        assert_eq!(
            RegistrationAction::toggle_from(RegistrationState::Registered),
            RegistrationAction::Unregister
        );
    }

    #[test]
    fn test_menu_command() {
        assert_eq!(
            menu_command(exe()),
            r#""C:\Tools\vt-context-menu.exe" "%L""#
        );
    }

    #[test]
    fn test_toggle_round_trip() {
        let registry = MemoryRegistry::new();
        let extension = ShellExtension::new(&registry, ContextMenuEntry::default());

        let first = RegistrationAction::toggle_from(extension.state().unwrap());
        let message = apply(&extension, first, true, exe()).unwrap();
        assert_eq!(
            message,
            "The 'VirusTotalContextMenu' shell extension was registered."
        );
        assert_eq!(extension.state().unwrap(), RegistrationState::Registered);

        let second = RegistrationAction::toggle_from(extension.state().unwrap());
        let message = apply(&extension, second, true, exe()).unwrap();
        assert_eq!(
            message,
            "The 'VirusTotalContextMenu' shell extension was unregistered."
        );
        assert_eq!(extension.state().unwrap(), RegistrationState::Unregistered);
    }

    #[test]
    fn test_forced_register_is_idempotent() {
        let registry = MemoryRegistry::new();
        let extension = ShellExtension::new(&registry, ContextMenuEntry::default());

        apply(&extension, RegistrationAction::Register, true, exe()).unwrap();
        apply(&extension, RegistrationAction::Register, true, exe()).unwrap();
        assert_eq!(extension.state().unwrap(), RegistrationState::Registered);
    }

    #[test]
    fn test_requires_elevation() {
        let registry = MemoryRegistry::new();
        let extension = ShellExtension::new(&registry, ContextMenuEntry::default());

        let result = apply(&extension, RegistrationAction::Register, false, exe());
        assert!(matches!(result, Err(Error::ElevationRequired)));
        assert_eq!(registry.key_count(), 0);
    }
}
