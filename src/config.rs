//! Configuration types for the upload client.
//!
//! Every knob of the workflow lives in [`UploaderConfig`], built via its
//! [`UploaderConfigBuilder`]. The defaults reproduce the behaviour of the
//! browser page this client stands in for: one file, 4 MiB, `POST
//! /api/py/upload`, no timeout, no retry, no single-flight guard.

use crate::error::UploaderError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default size cap for the dropzone: 4 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Configuration for the upload workflow.
///
/// # Example
/// ```rust
/// use pdf2md_upload::UploaderConfig;
///
/// let config = UploaderConfig::builder()
///     .base_url("http://localhost:8000")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_url().unwrap().as_str(), "http://localhost:8000/api/py/upload");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Scheme, host and port of the conversion service. Default: `http://localhost:3000`.
    pub base_url: String,

    /// Path of the upload route, joined onto `base_url`. Default: `/api/py/upload`.
    pub upload_path: String,

    /// Multipart field name carrying the file. Default: `file`.
    pub field_name: String,

    /// Maximum number of files the dropzone accepts. Default: 1.
    pub max_files: usize,

    /// Maximum size per file in bytes. Default: 4 MiB.
    pub max_file_size: u64,

    /// Advertised document type shown under the drop target. Not enforced.
    pub accept_hint: String,

    /// Per-request timeout in seconds. Default: `None` (wait indefinitely).
    pub request_timeout_secs: Option<u64>,

    /// Retries on transport failures and 5xx responses. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubling after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// What `submit()` does while another submission is outstanding.
    pub in_flight: InFlightPolicy,

    /// Visible lines of each result pane. Default: 16.
    pub pane_height: usize,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            upload_path: "/api/py/upload".to_string(),
            field_name: "file".to_string(),
            max_files: 1,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accept_hint: "Only PDF files are converted to Markdown".to_string(),
            request_timeout_secs: None,
            max_retries: 0,
            retry_backoff_ms: 500,
            in_flight: InFlightPolicy::default(),
            pane_height: 16,
        }
    }
}

impl UploaderConfig {
    /// Create a new builder for `UploaderConfig`.
    pub fn builder() -> UploaderConfigBuilder {
        UploaderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute URL the multipart form is posted to.
    pub fn upload_url(&self) -> Result<Url, UploaderError> {
        let base = Url::parse(&self.base_url).map_err(|e| {
            UploaderError::InvalidConfig(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        base.join(&self.upload_path).map_err(|e| {
            UploaderError::InvalidConfig(format!("invalid upload path '{}': {e}", self.upload_path))
        })
    }
}

/// Builder for [`UploaderConfig`].
#[derive(Debug)]
pub struct UploaderConfigBuilder {
    config: UploaderConfig,
}

impl UploaderConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn upload_path(mut self, path: impl Into<String>) -> Self {
        self.config.upload_path = path.into();
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.config.field_name = name.into();
        self
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.config.max_files = n;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn accept_hint(mut self, hint: impl Into<String>) -> Self {
        self.config.accept_hint = hint.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn in_flight(mut self, policy: InFlightPolicy) -> Self {
        self.config.in_flight = policy;
        self
    }

    pub fn pane_height(mut self, lines: usize) -> Self {
        self.config.pane_height = lines.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploaderConfig, UploaderError> {
        let c = &self.config;
        if c.max_files == 0 {
            return Err(UploaderError::InvalidConfig(
                "max_files must be ≥ 1".into(),
            ));
        }
        if c.max_file_size == 0 {
            return Err(UploaderError::InvalidConfig(
                "max_file_size must be ≥ 1 byte".into(),
            ));
        }
        if c.field_name.trim().is_empty() {
            return Err(UploaderError::InvalidConfig(
                "multipart field name must not be empty".into(),
            ));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(UploaderError::InvalidConfig(
                "request timeout must be ≥ 1 second when set".into(),
            ));
        }
        c.upload_url()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Behaviour of `submit()` while an earlier submission has not resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InFlightPolicy {
    /// Issue the request anyway; the last response to resolve wins. (default)
    #[default]
    Allow,
    /// Raise an "already in progress" alert and skip the request.
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_browser_page() {
        let c = UploaderConfig::default();
        assert_eq!(c.max_files, 1);
        assert_eq!(c.max_file_size, 4 * 1024 * 1024);
        assert_eq!(c.field_name, "file");
        assert_eq!(c.request_timeout_secs, None);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.in_flight, InFlightPolicy::Allow);
        assert_eq!(
            c.upload_url().unwrap().as_str(),
            "http://localhost:3000/api/py/upload"
        );
    }

    #[test]
    fn build_rejects_bad_values() {
        assert!(UploaderConfig::builder().max_files(0).build().is_err());
        assert!(UploaderConfig::builder().max_file_size(0).build().is_err());
        assert!(UploaderConfig::builder().field_name("  ").build().is_err());
        assert!(UploaderConfig::builder()
            .request_timeout_secs(Some(0))
            .build()
            .is_err());
        assert!(UploaderConfig::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn upload_path_joins_onto_base() {
        let c = UploaderConfig::builder()
            .base_url("https://convert.example.com:8443/")
            .upload_path("/v2/upload")
            .build()
            .unwrap();
        assert_eq!(
            c.upload_url().unwrap().as_str(),
            "https://convert.example.com:8443/v2/upload"
        );
    }

    #[test]
    fn pane_height_clamped_to_one() {
        let c = UploaderConfig::builder().pane_height(0).build().unwrap();
        assert_eq!(c.pane_height, 1);
    }
}
