//! VirusTotal API v3 client.
//!
//! Uses two endpoints:
//! - `GET /files/{sha256}` to fetch an existing report
//! - `POST /files` to upload an unknown file
//!
//! Reports are keyed by the SHA256 of the file content, computed locally.

use super::ReputationService;
use crate::core::config::ApiKey;
use crate::core::error::{Error, Result};
use crate::core::types::{
    DetectionStats, FileReport, ScanSubmission, ScanTarget, MAX_UPLOAD_SIZE,
};
use crate::utils::hash::HashCalculator;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// Base URL of the VirusTotal REST API.
pub const DEFAULT_API_URL: &str = "https://www.virustotal.com/api/v3";

/// Base URL of the VirusTotal web interface, used for permalinks.
pub const DEFAULT_GUI_URL: &str = "https://www.virustotal.com/gui";

const SERVICE_NAME: &str = "virustotal";

/// Client for the public VirusTotal API.
pub struct VirusTotalClient {
    /// API key sent with every request
    api_key: ApiKey,
    /// REST API base URL
    base_url: String,
    /// Web interface base URL
    gui_url: String,
    /// Largest file accepted for upload
    max_upload_size: u64,
    /// HTTP client
    client: reqwest::Client,
}

impl VirusTotalClient {
    /// Create a client for the public API.
    pub fn new(api_key: ApiKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vt-context-menu/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
            gui_url: DEFAULT_GUI_URL.to_string(),
            max_upload_size: MAX_UPLOAD_SIZE,
            client,
        })
    }

    /// Point the client at another API endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the upload size limit.
    pub fn with_max_upload_size(mut self, size: u64) -> Self {
        self.max_upload_size = size;
        self
    }

    /// Build the report endpoint URL for a file hash.
    fn file_url(&self, sha256: &str) -> String {
        format!("{}/files/{}", self.base_url, sha256)
    }

    /// Build the upload endpoint URL.
    fn upload_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    /// Build the human-readable report link for a file hash.
    pub fn permalink_for(&self, sha256: &str) -> String {
        format!("{}/file/{}", self.gui_url, sha256)
    }

    async fn hash_target(&self, target: &ScanTarget) -> Result<String> {
        let path = target.path().to_path_buf();
        tokio::task::spawn_blocking(move || HashCalculator::sha256_file(&path))
            .await
            .map_err(|e| Error::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Parse a `GET /files/{id}` response body into a report.
    fn parse_report(&self, body: &Value, sha256: &str) -> FileReport {
        let data = body.get("data");

        let id = data
            .and_then(|d| d.get("id"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let permalink = if id.is_empty() {
            String::new()
        } else {
            self.permalink_for(id)
        };

        let attributes = data.and_then(|d| d.get("attributes"));

        let reported_sha256 = attributes
            .and_then(|a| a.get("sha256"))
            .and_then(|v| v.as_str())
            .unwrap_or(sha256);

        let mut report = FileReport::new(reported_sha256, permalink);

        if let Some(stats) = attributes
            .and_then(|a| a.get("last_analysis_stats"))
            .and_then(|s| serde_json::from_value::<DetectionStats>(s.clone()).ok())
        {
            report = report.with_stats(stats);
        }

        report
    }

    /// Parse a `POST /files` response body into a submission.
    fn parse_submission(&self, body: &Value, sha256: &str) -> Result<ScanSubmission> {
        let analysis_id = body
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::unexpected_response(SERVICE_NAME, "upload response has no analysis id")
            })?;

        Ok(ScanSubmission::new(analysis_id, self.permalink_for(sha256)))
    }

    /// Turn a non-success response into an error.
    async fn error_for_status(
        &self,
        response: reqwest::Response,
        upload_size: Option<u64>,
    ) -> Error {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Error::rate_limited(SERVICE_NAME);
        }

        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Error::SizeLimitExceeded {
                size: upload_size.unwrap_or(0),
                max: self.max_upload_size,
            };
        }

        let body = response.text().await.unwrap_or_default();
        Error::ServiceRejected {
            service: SERVICE_NAME.to_string(),
            status: status.as_u16(),
            message: error_message(&body).unwrap_or(body),
        }
    }
}

/// Extract `error.message` from a VirusTotal error body.
fn error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let error = parsed.get("error")?;
    let message = error.get("message").and_then(|v| v.as_str()).unwrap_or_default();
    let code = error.get("code").and_then(|v| v.as_str()).unwrap_or_default();

    match (code.is_empty(), message.is_empty()) {
        (true, true) => None,
        (false, true) => Some(code.to_string()),
        (true, false) => Some(message.to_string()),
        (false, false) => Some(format!("{}: {}", code, message)),
    }
}

fn network_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Network(format!("request to VirusTotal timed out: {}", e))
    } else if e.is_connect() {
        Error::Network(format!("cannot connect to VirusTotal: {}", e))
    } else {
        Error::Network(e.to_string())
    }
}

#[async_trait]
impl ReputationService for VirusTotalClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn file_report(&self, target: &ScanTarget) -> Result<Option<FileReport>> {
        let sha256 = self.hash_target(target).await?;
        log::debug!("Looking up report for {} ({})", target.path().display(), sha256);

        let response = self
            .client
            .get(self.file_url(&sha256))
            .header("x-apikey", self.api_key.expose())
            .send()
            .await
            .map_err(network_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("VirusTotal has no report for {}", sha256);
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(self.error_for_status(response, None).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            Error::unexpected_response(SERVICE_NAME, format!("invalid report JSON: {}", e))
        })?;

        Ok(Some(self.parse_report(&body, &sha256)))
    }

    async fn submit_file(&self, target: &ScanTarget) -> Result<ScanSubmission> {
        let size = tokio::fs::metadata(target.path())
            .await
            .map_err(|e| Error::file_read(target.path(), e))?
            .len();

        if size > self.max_upload_size {
            return Err(Error::SizeLimitExceeded {
                size,
                max: self.max_upload_size,
            });
        }

        let sha256 = self.hash_target(target).await?;
        let data = tokio::fs::read(target.path())
            .await
            .map_err(|e| Error::file_read(target.path(), e))?;

        log::debug!("Uploading {} ({} bytes)", target.path().display(), size);

        let part = reqwest::multipart::Part::bytes(data).file_name(target.file_name());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.upload_url())
            .header("x-apikey", self.api_key.expose())
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(self.error_for_status(response, Some(size)).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            Error::unexpected_response(SERVICE_NAME, format!("invalid upload JSON: {}", e))
        })?;

        self.parse_submission(&body, &sha256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn client() -> VirusTotalClient {
        VirusTotalClient::new(ApiKey::parse(Some(KEY)).unwrap()).unwrap()
    }

    fn sample_target(contents: &[u8]) -> (NamedTempFile, ScanTarget) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        let target = ScanTarget::resolve(file.path()).unwrap();
        (file, target)
    }

    /// Serve one canned HTTP response.
    ///
    /// Returns the base URL and a handle yielding the raw request, body included.
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 8192];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{}", addr), handle)
    }

    /// Whether a buffered request has its headers and the whole body.
    fn request_complete(request: &[u8]) -> bool {
        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let body = &request[header_end + 4..];

        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());

        match content_length {
            Some(length) => body.len() >= length,
            None if headers.contains("transfer-encoding: chunked") => body.ends_with(b"0\r\n\r\n"),
            None => true,
        }
    }

    #[test]
    fn test_urls() {
        let client = client().with_base_url("https://vt.example/api/v3/");
        assert_eq!(client.file_url("abc"), "https://vt.example/api/v3/files/abc");
        assert_eq!(client.upload_url(), "https://vt.example/api/v3/files");
        assert_eq!(
            client.permalink_for("abc"),
            "https://www.virustotal.com/gui/file/abc"
        );
    }

    #[test]
    fn test_parse_report() {
        let body = json!({
            "data": {
                "id": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
                "type": "file",
                "attributes": {
                    "sha256": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
                    "last_analysis_stats": {
                        "malicious": 2,
                        "suspicious": 0,
                        "harmless": 0,
                        "undetected": 60,
                        "timeout": 1
                    }
                }
            }
        });

        let report = client().parse_report(&body, "ignored");
        assert_eq!(
            report.permalink,
            "https://www.virustotal.com/gui/file/e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(report.sha256.starts_with("e3b0c442"));
        let stats = report.stats.unwrap();
        assert_eq!(stats.malicious, 2);
        assert_eq!(stats.total(), 62);
    }

    #[test]
    fn test_parse_report_without_id() {
        let body = json!({ "data": { "attributes": {} } });
        let report = client().parse_report(&body, "abc");
        assert!(!report.has_permalink());
        assert_eq!(report.sha256, "abc");
        assert!(report.stats.is_none());
    }

    #[test]
    fn test_parse_submission() {
        let body = json!({
            "data": {
                "type": "analysis",
                "id": "NjY0MjRlOTFjMDIyYTkyNWM0NjU2NWQzYWNlMzFmZmI6MTQ3NTA0ODI3Nw=="
            }
        });
        let submission = client().parse_submission(&body, "abc").unwrap();
        assert!(submission.analysis_id.starts_with("NjY0"));
        assert_eq!(
            submission.permalink,
            "https://www.virustotal.com/gui/file/abc"
        );

        let empty = json!({ "data": {} });
        assert!(matches!(
            client().parse_submission(&empty, "abc"),
            Err(Error::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": "WrongCredentialsError", "message": "Wrong API key"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("WrongCredentialsError: Wrong API key")
        );
        assert_eq!(error_message("<html>"), None);
        assert_eq!(error_message(r#"{"error": {}}"#), None);
    }

    #[tokio::test]
    async fn test_submit_rejects_large_file_locally() {
        let (_file, target) = sample_target(&[0u8; 128]);
        let client = client()
            .with_base_url("http://127.0.0.1:9")
            .with_max_upload_size(64);

        let err = client.submit_file(&target).await.unwrap_err();
        assert!(matches!(err, Error::SizeLimitExceeded { size: 128, max: 64 }));
    }

    #[tokio::test]
    async fn test_report_not_found() {
        let (_file, target) = sample_target(b"unknown file");
        let (url, _request) = serve_once(
            "404 Not Found",
            r#"{"error": {"code": "NotFoundError", "message": "not found"}}"#.to_string(),
        )
        .await;

        let report = client().with_base_url(url).file_report(&target).await.unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_report_rate_limited() {
        let (_file, target) = sample_target(b"busy");
        let (url, _request) = serve_once(
            "429 Too Many Requests",
            r#"{"error": {"code": "QuotaExceededError", "message": "Quota exceeded"}}"#.to_string(),
        )
        .await;

        let err = client().with_base_url(url).file_report(&target).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_report_found() {
        let contents = b"known file";
        let (_file, target) = sample_target(contents);
        let sha256 = HashCalculator::sha256_bytes(contents);
        let body = json!({ "data": { "id": sha256, "attributes": { "sha256": sha256 } } });
        let (url, _request) = serve_once("200 OK", body.to_string()).await;

        let report = client()
            .with_base_url(url)
            .file_report(&target)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.sha256, sha256);
        assert_eq!(report.permalink, format!("{}/file/{}", DEFAULT_GUI_URL, sha256));
    }

    #[tokio::test]
    async fn test_report_rejected_key() {
        let (_file, target) = sample_target(b"whatever");
        let (url, _request) = serve_once(
            "401 Unauthorized",
            r#"{"error": {"code": "WrongCredentialsError", "message": "Wrong API key"}}"#.to_string(),
        )
        .await;

        let err = client().with_base_url(url).file_report(&target).await.unwrap_err();
        match err {
            Error::ServiceRejected { status, message, .. } => {
                assert_eq!(status, 401);
                assert!(message.contains("Wrong API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_accepted() {
        let contents = b"fresh upload";
        let (_file, target) = sample_target(contents);
        let sha256 = HashCalculator::sha256_bytes(contents);
        let body = json!({ "data": { "type": "analysis", "id": "analysis-42" } });
        let (url, request) = serve_once("200 OK", body.to_string()).await;

        let submission = client().with_base_url(url).submit_file(&target).await.unwrap();
        assert_eq!(submission.analysis_id, "analysis-42");
        assert_eq!(submission.permalink, format!("{}/file/{}", DEFAULT_GUI_URL, sha256));

        let request = String::from_utf8_lossy(&request.await.unwrap()).to_string();
        assert!(request.starts_with("POST /files "));
        assert!(request.to_ascii_lowercase().contains(&format!("x-apikey: {}", KEY)));
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains("name=\"file\""));
        assert!(request.contains(&format!("filename=\"{}\"", target.file_name())));
        assert!(request.contains("fresh upload"));
    }

    #[tokio::test]
    async fn test_upload_rate_limited() {
        let (_file, target) = sample_target(b"busy upload");
        let (url, _request) = serve_once(
            "429 Too Many Requests",
            r#"{"error": {"code": "QuotaExceededError", "message": "Quota exceeded"}}"#.to_string(),
        )
        .await;

        let err = client().with_base_url(url).submit_file(&target).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
        assert!(err.is_service_limit());
    }

    #[tokio::test]
    async fn test_upload_too_large_for_service() {
        let (_file, target) = sample_target(&[7u8; 256]);
        let (url, _request) = serve_once(
            "413 Payload Too Large",
            r#"{"error": {"code": "RequestEntityTooLarge", "message": "too large"}}"#.to_string(),
        )
        .await;

        let err = client().with_base_url(url).submit_file(&target).await.unwrap_err();
        assert!(matches!(
            err,
            Error::SizeLimitExceeded {
                size: 256,
                max: MAX_UPLOAD_SIZE
            }
        ));
    }
}
