//! File reputation service access.
//!
//! Provides:
//! - The [`ReputationService`] abstraction used by the scan workflow
//! - A VirusTotal API v3 client
//! - A mock service for testing

mod client;

pub use client::{VirusTotalClient, DEFAULT_API_URL, DEFAULT_GUI_URL};

use crate::core::error::{Error, Result};
use crate::core::types::{FileReport, ScanSubmission, ScanTarget, MAX_UPLOAD_SIZE};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A remote service that keeps reputation reports keyed by file content.
#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Name of the service, used in logs and errors.
    fn name(&self) -> &str;

    /// Look up the existing report for a file.
    ///
    /// Returns `Ok(None)` when the service has never seen the file.
    async fn file_report(&self, target: &ScanTarget) -> Result<Option<FileReport>>;

    /// Upload a file for scanning.
    ///
    /// Fails with [`Error::RateLimited`] or [`Error::SizeLimitExceeded`] when
    /// the service refuses the upload because of its quotas.
    async fn submit_file(&self, target: &ScanTarget) -> Result<ScanSubmission>;
}

/// Canned answer for a mock service call.
#[derive(Debug, Clone)]
pub enum MockResponse<T> {
    /// Succeed with the value
    Ok(T),
    /// Fail with a rate limit error
    RateLimited,
    /// Fail with a size limit error
    TooLarge,
    /// Fail with a network error carrying the message
    Network(String),
}

impl<T: Clone> MockResponse<T> {
    fn to_result(&self, service: &str) -> Result<T> {
        match self {
            MockResponse::Ok(value) => Ok(value.clone()),
            MockResponse::RateLimited => Err(Error::rate_limited(service)),
            MockResponse::TooLarge => Err(Error::SizeLimitExceeded {
                size: MAX_UPLOAD_SIZE + 1,
                max: MAX_UPLOAD_SIZE,
            }),
            MockResponse::Network(message) => Err(Error::Network(message.clone())),
        }
    }
}

/// Mock service for testing.
///
/// Answers every call with a canned response and counts the calls.
#[derive(Debug)]
pub struct MockService {
    report: MockResponse<Option<FileReport>>,
    submission: MockResponse<ScanSubmission>,
    report_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl MockService {
    /// A service that has no report and accepts uploads.
    pub fn new() -> Self {
        Self {
            report: MockResponse::Ok(None),
            submission: MockResponse::Ok(ScanSubmission::new(
                "mock-analysis",
                format!("{}/file/mock", DEFAULT_GUI_URL),
            )),
            report_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }

    /// Answer report lookups with this report.
    pub fn with_report(mut self, report: FileReport) -> Self {
        self.report = MockResponse::Ok(Some(report));
        self
    }

    /// Answer report lookups with this response.
    pub fn with_report_response(mut self, response: MockResponse<Option<FileReport>>) -> Self {
        self.report = response;
        self
    }

    /// Answer uploads with this response.
    pub fn with_submission(mut self, response: MockResponse<ScanSubmission>) -> Self {
        self.submission = response;
        self
    }

    /// Number of report lookups made.
    pub fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    /// Number of uploads made.
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReputationService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn file_report(&self, _target: &ScanTarget) -> Result<Option<FileReport>> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        self.report.to_result(self.name())
    }

    async fn submit_file(&self, _target: &ScanTarget) -> Result<ScanSubmission> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submission.to_result(self.name())
    }
}
