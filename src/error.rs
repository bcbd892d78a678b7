//! Error types for the pdf2md-upload library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`UploaderError`] — **Fatal**: the client cannot be set up at all
//!   (invalid configuration, unreadable input file, HTTP client construction).
//!   Returned as `Err(UploaderError)` from constructors and loaders.
//!
//! * [`SubmitError`] — **Per attempt**: one submission failed. It is never
//!   returned to the caller of [`crate::UploadController::submit`]; the
//!   controller logs it, raises its alert through the injected
//!   [`crate::Notifier`], and records it in [`crate::RequestOutcome::Failed`].
//!
//! * [`DropRejection`] — **Boundary**: the dropzone refused a file before it
//!   could reach the controller's selection.

use std::path::PathBuf;
use thiserror::Error;

// ── Alert texts ──────────────────────────────────────────────────────────

/// Alert raised when `submit()` is called with nothing selected.
pub const ALERT_NO_FILE: &str = "No files selected";
/// Alert raised on a non-2xx response.
pub const ALERT_UPLOAD_FAILED: &str = "File upload failed";
/// Alert raised on a 2xx response lacking one of the two result fields.
pub const ALERT_INCOMPLETE: &str = "Failed to extract markdown content or AI summary.";
/// Alert raised on a network or response-decoding failure.
pub const ALERT_TRANSPORT: &str = "Error uploading file";
/// Alert raised when single-flight rejection is enabled and a submission is outstanding.
pub const ALERT_IN_PROGRESS: &str = "An upload is already in progress";

/// All fatal errors returned by the pdf2md-upload library.
#[derive(Debug, Error)]
pub enum UploaderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A failed submission attempt.
///
/// `Clone` so it can live inside [`crate::RequestOutcome`] snapshots handed
/// to observers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// `submit()` was called while the selection was empty.
    #[error("no file selected")]
    NoFileSelected,

    /// Single-flight rejection: another submission is still outstanding.
    #[error("a submission is already in flight")]
    SubmissionInProgress,

    /// Network, DNS, or response-body decoding failure.
    #[error("transport failure: {reason}")]
    TransportFailure { reason: String },

    /// The endpoint answered with a non-2xx status.
    #[error("server rejected upload with HTTP {status}")]
    ServerRejected { status: u16, body: String },

    /// 2xx response missing the extracted text, the summary, or both.
    #[error("incomplete result: missing {}", missing.join(", "))]
    IncompleteResult { missing: Vec<String> },
}

impl SubmitError {
    /// The user-facing alert text for this failure.
    pub fn alert(&self) -> &'static str {
        match self {
            SubmitError::NoFileSelected => ALERT_NO_FILE,
            SubmitError::SubmissionInProgress => ALERT_IN_PROGRESS,
            SubmitError::TransportFailure { .. } => ALERT_TRANSPORT,
            SubmitError::ServerRejected { .. } => ALERT_UPLOAD_FAILED,
            SubmitError::IncompleteResult { .. } => ALERT_INCOMPLETE,
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Only consulted by [`crate::client::RetryingService`].
    pub fn is_transient(&self) -> bool {
        match self {
            SubmitError::TransportFailure { .. } => true,
            SubmitError::ServerRejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether a previously displayed result survives this failure.
    pub fn keeps_prior_result(&self) -> bool {
        !matches!(self, SubmitError::IncompleteResult { .. })
    }
}

/// A file refused by the dropzone before reaching the selection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DropRejection {
    #[error("Too many files: at most {max} file(s) can be selected")]
    TooManyFiles { max: usize },

    #[error("File '{name}' is too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("No file was dropped")]
    NothingDropped,
}
