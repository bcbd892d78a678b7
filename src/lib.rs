//! # pdf2md-upload
//!
//! Select one document, send it to a PDF-to-Markdown conversion endpoint, and
//! render the two texts it returns: the extracted Markdown and a generated
//! summary.
//!
//! ## Workflow Overview
//!
//! ```text
//! user gesture
//!  │
//!  ├─ 1. Dropzone    max 1 file, max 4 MiB; rejects before state is touched
//!  ├─ 2. Selection   Empty | Holding(file), owned by the controller
//!  ├─ 3. Submit      POST multipart `file` to /api/py/upload
//!  ├─ 4. Validate    both `markdownContent` and `aiSummary` or nothing
//!  ├─ 5. Alert       one Notifier message per failed attempt
//!  └─ 6. Render      observers re-render the view from a snapshot
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_upload::{
//!     service_from_config, FileHandle, Theme, ThemeMode, TracingNotifier, UploadController,
//!     UploadView, UploaderConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploaderConfig::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!     let controller = Arc::new(UploadController::new(
//!         service_from_config(&config)?,
//!         Arc::new(TracingNotifier),
//!     ));
//!     let mut view = UploadView::new(controller, &config, Theme::detect(ThemeMode::System));
//!
//!     view.drop_files(vec![FileHandle::from_path("report.pdf").await?])?;
//!     view.submit().await;
//!     print!("{}", view.render());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-upload` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod controller;
pub mod dropzone;
pub mod error;
pub mod notify;
pub mod observer;
pub mod output;
pub mod selection;
pub mod theme;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{
    service_from_config, ConversionService, HttpConversionService, RetryingService, SharedService,
};
pub use config::{InFlightPolicy, UploaderConfig, UploaderConfigBuilder, DEFAULT_MAX_FILE_SIZE};
pub use controller::{UploadController, UploadSnapshot};
pub use dropzone::Dropzone;
pub use error::{DropRejection, SubmitError, UploaderError};
pub use notify::{Notifier, SharedNotifier, TracingNotifier};
pub use observer::{NoopObserver, SharedObserver, UploadObserver};
pub use output::{save_result, ConversionResponse, ConversionResult, RequestOutcome};
pub use selection::{FileHandle, SelectionState};
pub use theme::{Theme, ThemeMode};
pub use view::{Pane, UploadView};
