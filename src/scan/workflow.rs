//! The scan workflow run when a file is picked from the context menu.
//!
//! 1. Load and validate the API key
//! 2. Resolve the selected file, stopping silently if it is gone
//! 3. Open the existing report if the service has one
//! 4. Otherwise upload the file and open the new result
//!
//! Quota refusals become [`ScanOutcome`] values; every other failure is
//! returned to the caller to render.

use crate::core::config::{ApiKey, AppSettings};
use crate::core::error::{Error, Result};
use crate::core::types::{FileReport, ReportOrigin, ScanOutcome, ScanTarget};
use crate::shell::opener::UrlOpener;
use crate::virustotal::ReputationService;
use std::path::Path;

/// Runs steps 2-4 of the workflow against a service and an opener.
pub struct ScanOrchestrator<'a, S: ?Sized, O: ?Sized> {
    service: &'a S,
    opener: &'a O,
}

impl<'a, S, O> ScanOrchestrator<'a, S, O>
where
    S: ReputationService + ?Sized,
    O: UrlOpener + ?Sized,
{
    /// Create an orchestrator.
    pub fn new(service: &'a S, opener: &'a O) -> Self {
        Self { service, opener }
    }

    /// Scan the file at `path`.
    pub async fn scan(&self, path: &Path) -> Result<ScanOutcome> {
        let Some(target) = ScanTarget::resolve(path) else {
            log::debug!("{} is not an existing file, nothing to do", path.display());
            return Ok(ScanOutcome::TargetMissing);
        };

        let file_name = target.file_name();

        println!("Getting report for {}", file_name);
        let report = match self.service.file_report(&target).await {
            Ok(report) => report,
            Err(e) if e.is_service_limit() => return Ok(limit_outcome(e)),
            Err(e) => return Err(e),
        };

        if let Some(report) = report {
            return self.open_report(report);
        }

        println!("No report for {} - sending file to VT", file_name);
        let submission = match self.service.submit_file(&target).await {
            Ok(submission) => submission,
            Err(e) if e.is_service_limit() => return Ok(limit_outcome(e)),
            Err(e) => return Err(e),
        };

        log::debug!(
            "{} accepted upload as analysis {}",
            self.service.name(),
            submission.analysis_id
        );
        self.open(&submission.permalink, ReportOrigin::NewSubmission)
    }

    fn open_report(&self, report: FileReport) -> Result<ScanOutcome> {
        if let Some(stats) = report.stats {
            log::info!("Existing report for {}: {}", report.sha256, stats);
        }

        if !report.has_permalink() {
            return Err(Error::MissingPermalink);
        }

        self.open(&report.permalink, ReportOrigin::ExistingReport)
    }

    fn open(&self, permalink: &str, origin: ReportOrigin) -> Result<ScanOutcome> {
        if permalink.trim().is_empty() {
            return Err(Error::MissingPermalink);
        }

        println!("Opening {}", permalink);
        self.opener.open(permalink)?;

        Ok(ScanOutcome::Opened {
            permalink: permalink.to_string(),
            origin,
        })
    }
}

fn limit_outcome(error: Error) -> ScanOutcome {
    log::debug!("{}", error);
    match error {
        Error::SizeLimitExceeded { max, .. } => ScanOutcome::SizeLimited { max_bytes: max },
        _ => ScanOutcome::RateLimited,
    }
}

/// Run the whole workflow: load settings, connect, scan.
///
/// `connect` builds the service from the validated key and is not called when
/// the key is invalid.
pub async fn run_scan<S, F, O>(
    settings_path: &Path,
    target: &Path,
    connect: F,
    opener: &O,
) -> Result<ScanOutcome>
where
    S: ReputationService,
    F: FnOnce(ApiKey) -> Result<S>,
    O: UrlOpener + ?Sized,
{
    log::debug!("Reading settings from {}", settings_path.display());
    let settings = AppSettings::load_async(settings_path).await?;
    let api_key = settings.api_key()?;

    let service = connect(api_key)?;
    ScanOrchestrator::new(&service, opener).scan(target).await
}
