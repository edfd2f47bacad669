//! Core type definitions used throughout vt-context-menu.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum upload size accepted by the public VirusTotal API (32 MB).
pub const MAX_UPLOAD_SIZE: u64 = 32 * MEGABYTE;

const MEGABYTE: u64 = 1024 * 1024;

/// A file selected for scanning.
///
/// Only constructed for paths that point at an existing regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    path: PathBuf,
}

impl ScanTarget {
    /// Resolve a path into a scan target.
    ///
    /// Returns `None` when the path does not exist or is not a regular file.
    pub fn resolve(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => Some(Self {
                path: path.to_path_buf(),
            }),
            _ => None,
        }
    }

    /// Full path of the target.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in console messages.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Engine verdict counts from the last analysis of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetectionStats {
    /// Engines that flagged the file as malicious
    pub malicious: u32,
    /// Engines that flagged the file as suspicious
    pub suspicious: u32,
    /// Engines that consider the file harmless
    pub harmless: u32,
    /// Engines that found nothing
    pub undetected: u32,
}

impl DetectionStats {
    /// Number of engines that flagged the file.
    pub fn flagged(&self) -> u32 {
        self.malicious + self.suspicious
    }

    /// Number of engines that returned a verdict.
    pub fn total(&self) -> u32 {
        self.malicious + self.suspicious + self.harmless + self.undetected
    }
}

impl std::fmt::Display for DetectionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} engines flagged the file", self.flagged(), self.total())
    }
}

/// A report the remote service already holds for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// SHA256 of the file content the report is keyed by
    pub sha256: String,
    /// Link to the human-readable report, empty when the service sent none
    pub permalink: String,
    /// Last analysis statistics, if present in the report
    pub stats: Option<DetectionStats>,
}

impl FileReport {
    /// Create a report with no statistics.
    pub fn new(sha256: impl Into<String>, permalink: impl Into<String>) -> Self {
        Self {
            sha256: sha256.into(),
            permalink: permalink.into(),
            stats: None,
        }
    }

    /// Attach detection statistics.
    pub fn with_stats(mut self, stats: DetectionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Whether the report carries a usable permalink.
    pub fn has_permalink(&self) -> bool {
        !self.permalink.trim().is_empty()
    }
}

/// The accepted upload of a file that had no report yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSubmission {
    /// Service-side analysis identifier
    pub analysis_id: String,
    /// Link to the human-readable result
    pub permalink: String,
}

impl ScanSubmission {
    /// Create a new submission record.
    pub fn new(analysis_id: impl Into<String>, permalink: impl Into<String>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            permalink: permalink.into(),
        }
    }
}

/// Where an opened permalink came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    /// The service already had a report for the file
    ExistingReport,
    /// The file was uploaded during this run
    NewSubmission,
}

/// How a scan run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A permalink was opened in the default browser
    Opened {
        permalink: String,
        origin: ReportOrigin,
    },
    /// The selected path does not exist; nothing was done
    TargetMissing,
    /// The service refused the call because of its request quota
    RateLimited,
    /// The file is larger than the service accepts
    SizeLimited { max_bytes: u64 },
}

impl ScanOutcome {
    /// Message shown to the user for outcomes that need explaining.
    pub fn message(&self) -> Option<String> {
        match self {
            ScanOutcome::Opened { .. } | ScanOutcome::TargetMissing => None,
            ScanOutcome::RateLimited => Some(
                "Virus Total limits the number of calls you can make to 4 calls each 60 seconds."
                    .to_string(),
            ),
            ScanOutcome::SizeLimited { max_bytes } => Some(format!(
                "Virus Total limits the filesize to {}.",
                format_size(*max_bytes)
            )),
        }
    }
}

/// Whole megabytes when the size is at least one, rounded up; bytes otherwise.
fn format_size(bytes: u64) -> String {
    if bytes >= MEGABYTE {
        format!("{} MB", bytes.div_ceil(MEGABYTE))
    } else {
        format!("{} bytes", bytes)
    }
}
