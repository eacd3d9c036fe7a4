//! Release archive download into the staging area.
//!
//! Provides a trait-based abstraction over the HTTP fetch so the pipeline
//! can be exercised in tests without network access. The production
//! implementation uses `ureq` with an explicit, bounded timeout: an
//! unbounded hang would stall an otherwise re-runnable provisioning pass.

use std::path::Path;
use std::time::Duration;

/// Default network timeout for archive downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Trait for fetching a release archive to a local file.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactFetcher {
    /// Download `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-success status, or failure
    /// to write the destination file.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Errors arising from archive downloads.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The archive was not found (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based fetcher using `ureq`.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Build a fetcher whose requests are bounded by `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DOWNLOAD_TIMEOUT)
    }
}

impl ArtefactFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(FetchError::Io)?;
        Ok(())
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/bat.tar.gz", &err);
        assert!(matches!(mapped, FetchError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(500);
        let mapped = map_ureq_error("https://example.test/bat.tar.gz", &err);
        assert!(matches!(mapped, FetchError::Http { .. }));
    }

    #[test]
    fn http_error_display_includes_url() {
        let err = FetchError::Http {
            url: "https://example.test/bat.tar.gz".to_owned(),
            reason: "connection reset".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("example.test"));
        assert!(msg.contains("connection reset"));
    }
}
