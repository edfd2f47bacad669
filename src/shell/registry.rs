//! Explorer context-menu registration in the Windows Registry.
//!
//! A verb registered under `HKEY_CLASSES_ROOT\<file type>\shell\<key name>`
//! shows up in the right-click menu of every matching file:
//!
//! ```text
//! HKEY_CLASSES_ROOT\*\shell\VirusTotalContextMenu      (Default) = "VT Scan"
//! HKEY_CLASSES_ROOT\*\shell\VirusTotalContextMenu\command  (Default) = "\"C:\...\vt-context-menu.exe\" \"%L\""
//! ```

use super::RegistrationState;
use crate::core::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Registry root the shell verbs are written under.
pub const CLASSES_ROOT: &str = "HKEY_CLASSES_ROOT";

/// Minimal registry surface needed to manage a shell verb.
///
/// Paths are relative to `HKEY_CLASSES_ROOT` and use `\` as separator.
pub trait ShellRegistry {
    /// Check whether a key exists.
    fn key_exists(&self, path: &str) -> Result<bool>;

    /// Create the key if needed and set its default (unnamed) value.
    fn set_default_value(&self, path: &str, value: &str) -> Result<()>;

    /// Delete a key and everything below it. Deleting a missing key is a no-op.
    fn delete_tree(&self, path: &str) -> Result<()>;
}

/// A context-menu verb for one file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuEntry {
    /// File type the verb applies to (`*` for all files)
    pub file_type: String,
    /// Registry key name of the verb
    pub key_name: String,
    /// Text displayed in the context menu
    pub menu_text: String,
}

impl Default for ContextMenuEntry {
    fn default() -> Self {
        Self {
            file_type: super::FILE_TYPE.to_string(),
            key_name: super::KEY_NAME.to_string(),
            menu_text: super::MENU_TEXT.to_string(),
        }
    }
}

impl ContextMenuEntry {
    /// Path of the verb key.
    pub fn key_path(&self) -> String {
        format!(r"{}\shell\{}", self.file_type, self.key_name)
    }

    /// Path of the key holding the command line.
    pub fn command_path(&self) -> String {
        format!(r"{}\command", self.key_path())
    }
}

/// Registers, unregisters and queries one context-menu verb.
pub struct ShellExtension<'a, R: ShellRegistry + ?Sized> {
    registry: &'a R,
    entry: ContextMenuEntry,
}

impl<'a, R: ShellRegistry + ?Sized> ShellExtension<'a, R> {
    /// Create a manager for the given verb.
    pub fn new(registry: &'a R, entry: ContextMenuEntry) -> Self {
        Self { registry, entry }
    }

    /// The verb managed by this instance.
    pub fn entry(&self) -> &ContextMenuEntry {
        &self.entry
    }

    /// Check whether the verb is registered.
    pub fn is_registered(&self) -> Result<bool> {
        self.registry.key_exists(&self.entry.key_path())
    }

    /// Query the registration state.
    pub fn state(&self) -> Result<RegistrationState> {
        Ok(if self.is_registered()? {
            RegistrationState::Registered
        } else {
            RegistrationState::Unregistered
        })
    }

    /// Create or overwrite the verb so that it runs `command_line`.
    pub fn register(&self, command_line: &str) -> Result<()> {
        let key_path = self.entry.key_path();
        log::debug!("Writing {}\\{}", CLASSES_ROOT, key_path);

        self.registry
            .set_default_value(&key_path, &self.entry.menu_text)?;
        self.registry
            .set_default_value(&self.entry.command_path(), command_line)
    }

    /// Remove the verb.
    pub fn unregister(&self) -> Result<()> {
        let key_path = self.entry.key_path();
        log::debug!("Deleting {}\\{}", CLASSES_ROOT, key_path);

        self.registry.delete_tree(&key_path)
    }
}

/// The real registry, under `HKEY_CLASSES_ROOT`.
#[derive(Debug, Default)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    /// Create a handle to the system registry.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "windows")]
impl ShellRegistry for WindowsRegistry {
    fn key_exists(&self, path: &str) -> Result<bool> {
        use winreg::enums::*;
        use winreg::RegKey;

        let hkcr = RegKey::predef(HKEY_CLASSES_ROOT);
        match hkcr.open_subkey_with_flags(path, KEY_READ) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::registry(format!("{}\\{}", CLASSES_ROOT, path), e)),
        }
    }

    fn set_default_value(&self, path: &str, value: &str) -> Result<()> {
        use winreg::enums::*;
        use winreg::RegKey;

        let full_path = format!("{}\\{}", CLASSES_ROOT, path);
        let hkcr = RegKey::predef(HKEY_CLASSES_ROOT);
        let (key, _) = hkcr
            .create_subkey(path)
            .map_err(|e| Error::registry(&full_path, e))?;

        key.set_value("", &value.to_string())
            .map_err(|e| Error::registry(&full_path, e))
    }

    fn delete_tree(&self, path: &str) -> Result<()> {
        use winreg::enums::*;
        use winreg::RegKey;

        let hkcr = RegKey::predef(HKEY_CLASSES_ROOT);
        match hkcr.delete_subkey_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::registry(format!("{}\\{}", CLASSES_ROOT, path), e)),
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl ShellRegistry for WindowsRegistry {
    fn key_exists(&self, _path: &str) -> Result<bool> {
        Err(Error::NotSupported(
            "shell registration requires the Windows Registry".to_string(),
        ))
    }

    fn set_default_value(&self, _path: &str, _value: &str) -> Result<()> {
        Err(Error::NotSupported(
            "shell registration requires the Windows Registry".to_string(),
        ))
    }

    fn delete_tree(&self, _path: &str) -> Result<()> {
        Err(Error::NotSupported(
            "shell registration requires the Windows Registry".to_string(),
        ))
    }
}

/// In-memory registry for testing.
///
/// Key paths are compared case-insensitively, like the real registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    keys: Mutex<BTreeMap<String, Option<String>>>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the default value of a key.
    pub fn default_value(&self, path: &str) -> Option<String> {
        self.lock()
            .ok()?
            .get(&normalize(path))
            .cloned()
            .flatten()
    }

    /// Number of keys currently stored.
    pub fn key_count(&self) -> usize {
        self.lock().map(|keys| keys.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Option<String>>>> {
        self.keys
            .lock()
            .map_err(|_| Error::Internal("memory registry lock poisoned".to_string()))
    }
}

impl ShellRegistry for MemoryRegistry {
    fn key_exists(&self, path: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(&normalize(path)))
    }

    fn set_default_value(&self, path: &str, value: &str) -> Result<()> {
        let path = normalize(path);
        let mut keys = self.lock()?;

        // Creating a key creates its missing parents
        let mut parent = String::new();
        for segment in path.split('\\') {
            if !parent.is_empty() {
                parent.push('\\');
            }
            parent.push_str(segment);
            keys.entry(parent.clone()).or_insert(None);
        }

        keys.insert(path, Some(value.to_string()));
        Ok(())
    }

    fn delete_tree(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let prefix = format!("{}\\", path);
        self.lock()?
            .retain(|key, _| key != &path && !key.starts_with(&prefix));
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('\\').to_lowercase()
}
