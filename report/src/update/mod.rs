//! Remote version check.
//!
//! Fetches a plain-text version file and compares it with the running
//! build. The check never blocks a report: failures are logged as warnings.

use std::cmp::Ordering;
use std::env;
use std::time::Duration;

use crate::error::{UpdateError, UpdateResult};
use crate::logs::{log_info, log_success, log_warning};

pub const DEFAULT_VERSION_URL: &str =
    "https://raw.githubusercontent.com/bsrpma/BSR-cari-data-dinamis/main/version.txt";

/// Environment variable overriding [`DEFAULT_VERSION_URL`].
pub const VERSION_URL_ENV: &str = "SALES_REPORT_VERSION_URL";

pub const LOCAL_VERSION: &str = env!("CARGO_PKG_VERSION");

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate { local: String },
    NewVersionAvailable { local: String, remote: String },
}

#[allow(async_fn_in_trait)]
pub trait UpdateChecker {
    async fn check(&self) -> UpdateResult<UpdateStatus>;
}

/// Checks a version file served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUpdateChecker {
    url: String,
    local_version: String,
}

impl HttpUpdateChecker {
    pub fn new(url: impl Into<String>, local_version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local_version: local_version.into(),
        }
    }

    /// Checker for this build, honoring `SALES_REPORT_VERSION_URL`.
    pub fn from_env() -> Self {
        let url = env::var(VERSION_URL_ENV).unwrap_or_else(|_| DEFAULT_VERSION_URL.to_string());
        Self::new(url, LOCAL_VERSION)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_remote_version(&self) -> UpdateResult<String> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let response = client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let version = body.trim();
        if version.is_empty() {
            return Err(UpdateError::EmptyVersion);
        }
        Ok(version.to_string())
    }
}

impl UpdateChecker for HttpUpdateChecker {
    async fn check(&self) -> UpdateResult<UpdateStatus> {
        let remote = self.fetch_remote_version().await?;
        Ok(compare_versions(&self.local_version, &remote))
    }
}

fn numeric_parts(version: &str) -> Option<Vec<u64>> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| part.parse().ok())
        .collect()
}

/// Compare dotted versions numerically (`1.10.0` > `1.9.0`, `1.0` == `1.0.0`).
///
/// Versions that are not purely numeric fall back to plain inequality.
pub fn compare_versions(local: &str, remote: &str) -> UpdateStatus {
    let newer = match (numeric_parts(local), numeric_parts(remote)) {
        (Some(mut l), Some(mut r)) => {
            let len = l.len().max(r.len());
            l.resize(len, 0);
            r.resize(len, 0);
            r.cmp(&l) == Ordering::Greater
        }
        _ => local.trim() != remote.trim(),
    };

    let local = local.trim().to_string();
    if newer {
        UpdateStatus::NewVersionAvailable {
            local,
            remote: remote.trim().to_string(),
        }
    } else {
        UpdateStatus::UpToDate { local }
    }
}

/// Run `checker` and log the outcome. Errors are downgraded to warnings.
pub async fn report_update_status<C: UpdateChecker>(checker: &C) -> Option<UpdateStatus> {
    log_info("🔄 Checking for updates...");
    match checker.check().await {
        Ok(status) => {
            match &status {
                UpdateStatus::UpToDate { local } => log_success(format!("Up to date ({})", local)),
                UpdateStatus::NewVersionAvailable { local, remote } => {
                    log_warning(format!("New version available: {} (local: {})", remote, local))
                }
            }
            Some(status)
        }
        Err(e) => {
            log_warning(format!("Update check failed, continuing with local version: {}", e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the URL to fetch.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/version.txt", addr)
    }

    #[test]
    fn test_compare_versions() {
        let up_to_date = |local: &str| UpdateStatus::UpToDate { local: local.into() };
        assert_eq!(compare_versions("1.0.0", "1.0.0"), up_to_date("1.0.0"));
        assert_eq!(compare_versions("1.0.0", " 1.0 \n"), up_to_date("1.0.0"));
        assert_eq!(compare_versions("1.2.0", "1.1.9"), up_to_date("1.2.0"));
        assert_eq!(
            compare_versions("1.9.0", "1.10.0"),
            UpdateStatus::NewVersionAvailable {
                local: "1.9.0".into(),
                remote: "1.10.0".into(),
            }
        );
        assert!(matches!(
            compare_versions("1.0.0", "1.0.0-beta"),
            UpdateStatus::NewVersionAvailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_http_checker_reads_remote_version() {
        let url = serve_once("200 OK", "2.0.0\n").await;
        let checker = HttpUpdateChecker::new(url, "1.0.0");

        let status = checker.check().await.unwrap();
        assert_eq!(
            status,
            UpdateStatus::NewVersionAvailable {
                local: "1.0.0".into(),
                remote: "2.0.0".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_http_checker_non_success_status() {
        let url = serve_once("404 Not Found", "missing").await;
        let checker = HttpUpdateChecker::new(url, "1.0.0");

        let err = checker.check().await.unwrap_err();
        assert!(matches!(err, UpdateError::Status(404)));
    }

    #[tokio::test]
    async fn test_status_carries_checker_local_version() {
        let url = serve_once("200 OK", "3.1.0").await;
        let checker = HttpUpdateChecker::new(url, "3.1.0");

        assert_eq!(
            report_update_status(&checker).await,
            Some(UpdateStatus::UpToDate { local: "3.1.0".into() })
        );
    }

    #[tokio::test]
    async fn test_failed_check_is_not_fatal() {
        let url = serve_once("200 OK", "   ").await;
        let checker = HttpUpdateChecker::new(url, "1.0.0");

        assert_eq!(report_update_status(&checker).await, None);
    }
}
