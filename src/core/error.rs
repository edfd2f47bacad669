//! Error types and result handling for vt-context-menu.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vt-context-menu operations.
#[derive(Error, Debug)]
pub enum Error {
    // ===== I/O Errors =====
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===== Configuration Errors =====
    #[error("Failed to load settings: {0}")]
    ConfigLoad(String),

    #[error("Invalid API key. Did you remember to change appsettings.json?")]
    InvalidApiKey,

    // ===== Shell Registration Errors =====
    #[error("Registry access error: {key}")]
    RegistryAccess {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("You have to run as admin to register or unregister the context menu.")]
    ElevationRequired,

    // ===== Remote Service Errors =====
    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} rejected the request ({status}): {message}")]
    ServiceRejected {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Unexpected response from {service}: {details}")]
    UnexpectedResponse { service: String, details: String },

    #[error("Rate limit exceeded for {service}")]
    RateLimited { service: String },

    #[error("File size {size} bytes exceeds the upload limit of {max} bytes")]
    SizeLimitExceeded { size: u64, max: u64 },

    // ===== Result Errors =====
    #[error("No permalink associated with the file. Cannot open URL.")]
    MissingPermalink,

    #[error("Failed to open URL: {url}")]
    Launch {
        url: String,
        #[source]
        source: std::io::Error,
    },

    // ===== Generic Errors =====
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a registry access error.
    pub fn registry(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::RegistryAccess {
            key: key.into(),
            source,
        }
    }

    /// Create a rate limit error for the named service.
    pub fn rate_limited(service: impl Into<String>) -> Self {
        Self::RateLimited {
            service: service.into(),
        }
    }

    /// Create an unexpected response error.
    pub fn unexpected_response(service: impl Into<String>, details: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            service: service.into(),
            details: details.into(),
        }
    }

    /// Check if this error is a quota condition reported by the remote service.
    ///
    /// These are expected during normal use and end the run without retrying.
    pub fn is_service_limit(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. } | Error::SizeLimitExceeded { .. }
        )
    }

    /// Check if this error is one the user is expected to act on, as opposed
    /// to an unexpected failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidApiKey | Error::ElevationRequired | Error::MissingPermalink
        ) || self.is_service_limit()
    }

    /// Get a user-friendly suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::InvalidApiKey => {
                Some("Put your 64 character VirusTotal API key in appsettings.json")
            }
            Error::ConfigLoad(_) => {
                Some("Check that appsettings.json exists next to the executable and is valid JSON")
            }
            Error::ElevationRequired => Some("Run the program again as administrator"),
            Error::RegistryAccess { .. } => {
                Some("Make sure the program runs elevated and the registry is not locked by policy")
            }
            Error::Network(_) => Some("Check your network connection and try again"),
            Error::ServiceRejected { status: 401 | 403, .. } => {
                Some("VirusTotal rejected the API key, check that it is still valid")
            }
            Error::RateLimited { .. } => Some("Wait a minute before scanning another file"),
            _ => None,
        }
    }

    /// Get the error category for logging.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::FileRead { .. } => ErrorCategory::Io,

            Error::ConfigLoad(_) | Error::InvalidApiKey => ErrorCategory::Configuration,

            Error::RegistryAccess { .. } | Error::ElevationRequired => ErrorCategory::Registry,

            Error::Network(_)
            | Error::ServiceRejected { .. }
            | Error::UnexpectedResponse { .. } => ErrorCategory::Network,

            Error::RateLimited { .. } | Error::SizeLimitExceeded { .. } => ErrorCategory::Quota,

            Error::MissingPermalink | Error::Launch { .. } => ErrorCategory::Report,

            Error::NotSupported(_) | Error::Internal(_) => ErrorCategory::Other,
        }
    }
}

/// Error category for classification in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Registry,
    Network,
    Quota,
    Report,
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O"),
            Self::Configuration => write!(f, "Configuration"),
            Self::Registry => write!(f, "Registry"),
            Self::Network => write!(f, "Network"),
            Self::Quota => write!(f, "Quota"),
            Self::Report => write!(f, "Report"),
            Self::Other => write!(f, "Other"),
        }
    }
}
