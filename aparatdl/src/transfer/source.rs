//! Byte sources for the transfer engine.
//!
//! [`ByteSource`] is the seam between the resume logic and the network. The
//! production implementation is [`HttpSource`]; tests substitute in-memory
//! sources.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE};

use crate::error::{DownloadError, DownloadResult};

/// Default timeout for video requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Status and body of a GET request.
pub struct RemoteBody {
    pub status: u16,
    pub reader: Box<dyn Read + Send>,
}

impl RemoteBody {
    /// 200 OK or 206 Partial Content.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 206)
    }

    pub fn is_partial(&self) -> bool {
        self.status == 206
    }
}

impl std::fmt::Debug for RemoteBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBody")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Blocking access to remote bytes.
pub trait ByteSource: Send + Sync {
    /// Total size of the resource, if the server reports one.
    fn content_length(&self, url: &str) -> DownloadResult<Option<u64>>;

    /// Open the resource, starting at `offset` when it is non-zero.
    fn open(&self, url: &str, offset: u64) -> DownloadResult<RemoteBody>;
}

/// HTTP byte source using `Range: bytes=<offset>-` for resume.
#[derive(Debug)]
pub struct HttpSource {
    client: Client,
    pub(crate) timeout: Duration,
}

impl HttpSource {
    /// Create a source with the default timeout.
    pub fn new() -> DownloadResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a source with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> DownloadResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DownloadError::TransferFailed {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            }
        })?;

        Ok(Self { client, timeout })
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> DownloadError {
        let reason = if e.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else {
            e.to_string()
        };
        DownloadError::TransferFailed {
            url: url.to_string(),
            reason,
        }
    }
}

impl ByteSource for HttpSource {
    fn content_length(&self, url: &str) -> DownloadResult<Option<u64>> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| self.request_error(url, e))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok()))
    }

    fn open(&self, url: &str, offset: u64) -> DownloadResult<RemoteBody> {
        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }

        let response = request.send().map_err(|e| self.request_error(url, e))?;

        Ok(RemoteBody {
            status: response.status().as_u16(),
            reader: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_http_source_default_timeout() {
        let source = HttpSource::new().unwrap();
        assert_eq!(source.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_http_source_with_timeout() {
        let source = HttpSource::with_timeout(Duration::from_secs(60)).unwrap();
        assert_eq!(source.timeout.as_secs(), 60);
    }

    #[test]
    fn test_remote_body_status() {
        let body = |status| RemoteBody {
            status,
            reader: Box::new(Cursor::new(Vec::new())),
        };

        assert!(body(200).is_success());
        assert!(!body(200).is_partial());
        assert!(body(206).is_success());
        assert!(body(206).is_partial());
        assert!(!body(204).is_success());
        assert!(!body(416).is_success());
    }
}
