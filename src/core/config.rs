//! Settings management for vt-context-menu.
//!
//! Settings live in `appsettings.json` next to the executable, so the
//! context-menu command can find them regardless of the working directory
//! Explorer starts it in.

use crate::core::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Name of the settings file placed beside the executable.
pub const SETTINGS_FILE_NAME: &str = "appsettings.json";

/// Required length of a VirusTotal API key.
pub const API_KEY_LENGTH: usize = 64;

/// Contents of `appsettings.json`.
///
/// `apikey` is kept as raw JSON so a value of the wrong type is reported as an
/// invalid key rather than as an unreadable settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    /// VirusTotal API key
    #[serde(default)]
    pub apikey: Option<Value>,
}

impl AppSettings {
    /// Load settings from a JSON file without blocking the runtime.
    pub async fn load_async(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::ConfigLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse settings file: {}", e)))
    }

    /// Get the settings file path beside the running executable.
    pub fn default_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().map_err(|e| {
            Error::ConfigLoad(format!("Failed to locate the running executable: {}", e))
        })?;

        let dir = exe.parent().ok_or_else(|| {
            Error::ConfigLoad(format!("Executable path has no parent: {}", exe.display()))
        })?;

        Ok(dir.join(SETTINGS_FILE_NAME))
    }

    /// Validate and return the API key.
    pub fn api_key(&self) -> Result<ApiKey> {
        match &self.apikey {
            None | Some(Value::Null) => ApiKey::parse(None),
            Some(Value::String(key)) => ApiKey::parse(Some(key.as_str())),
            Some(_) => {
                log::debug!("apikey in settings is not a string");
                Err(Error::InvalidApiKey)
            }
        }
    }
}

/// A validated VirusTotal API key.
///
/// The key is held as a secret and never printed by `Debug`.
#[derive(Debug)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Validate a raw key: it must be present, not blank, and exactly 64
    /// characters long.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(key) if !key.trim().is_empty() && key.chars().count() == API_KEY_LENGTH => {
                Ok(Self(SecretString::from(key.to_string())))
            }
            _ => Err(Error::InvalidApiKey),
        }
    }

    /// Expose the key for building a request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    const VALID_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn settings_file(contents: &str) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_valid_key() {
        let key = ApiKey::parse(Some(VALID_KEY)).unwrap();
        assert_eq!(key.expose(), VALID_KEY);
        assert!(!format!("{:?}", key).contains(VALID_KEY));
    }

    #[test]
    fn test_invalid_keys() {
        let blank = " ".repeat(API_KEY_LENGTH);
        let long = format!("{}0", VALID_KEY);
        let placeholder = "YOUR-API-KEY-HERE";

        for raw in [None, Some(""), Some(blank.as_str()), Some(long.as_str()), Some(placeholder)] {
            assert!(matches!(ApiKey::parse(raw), Err(Error::InvalidApiKey)));
        }
    }

    #[tokio::test]
    async fn test_load_settings() {
        let (_dir, path) = settings_file(&format!(r#"{{ "apikey": "{}" }}"#, VALID_KEY));

        let settings = AppSettings::load_async(&path).await.unwrap();
        assert_eq!(settings.api_key().unwrap().expose(), VALID_KEY);
    }

    #[tokio::test]
    async fn test_missing_apikey_field() {
        for contents in ["{}", r#"{ "apikey": null }"#] {
            let (_dir, path) = settings_file(contents);

            let settings = AppSettings::load_async(&path).await.unwrap();
            assert!(matches!(settings.api_key(), Err(Error::InvalidApiKey)));
        }
    }

    #[tokio::test]
    async fn test_non_string_apikey_is_invalid_key() {
        for contents in [
            r#"{ "apikey": 12345 }"#,
            r#"{ "apikey": true }"#,
            r#"{ "apikey": ["a", "b"] }"#,
            r#"{ "apikey": { "value": "x" } }"#,
        ] {
            let (_dir, path) = settings_file(contents);

            let settings = AppSettings::load_async(&path).await.unwrap();
            assert!(matches!(settings.api_key(), Err(Error::InvalidApiKey)));
        }
    }

    #[tokio::test]
    async fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            AppSettings::load_async(&missing).await,
            Err(Error::ConfigLoad(_))
        ));

        let (_dir, broken) = settings_file("{ not json");
        assert!(matches!(
            AppSettings::load_async(&broken).await,
            Err(Error::ConfigLoad(_))
        ));
    }

    #[tokio::test]
    async fn test_short_key() {
        let (_dir, path) = settings_file(r#"{ "apikey": "short" }"#);

        let settings = AppSettings::load_async(&path).await.unwrap();
        assert_eq!(settings.apikey, Some(Value::String("short".to_string())));
        assert!(settings.api_key().is_err());
    }

    #[test]
    fn test_default_path_file_name() {
        let path = AppSettings::default_path().unwrap();
        assert!(path.ends_with(SETTINGS_FILE_NAME));
    }
}
