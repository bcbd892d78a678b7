//! Observer trait for workflow state changes.
//!
//! Register an [`Arc<dyn UploadObserver>`] with
//! [`crate::UploadController::subscribe`] to be told whenever the selection,
//! the displayed result, or the submission status changes. A view re-renders
//! from [`crate::UploadController::snapshot`] inside these hooks.
//!
//! # Example
//!
//! ```rust
//! use pdf2md_upload::{SelectionState, UploadObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct RenderCounter(AtomicUsize);
//!
//! impl UploadObserver for RenderCounter {
//!     fn on_selection_changed(&self, _selection: &SelectionState) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::error::SubmitError;
use crate::output::ConversionResult;
use crate::selection::{FileHandle, SelectionState};
use std::sync::Arc;

/// Called by the controller after each state mutation.
///
/// All methods have default no-op implementations so implementors only
/// override what they care about. Hooks run after the controller's state
/// lock has been released, so they may call back into the controller.
///
/// # Thread safety
///
/// Overlapping submissions resolve on whichever task polls them, so hooks
/// may be called from different threads. Implementations must be
/// `Send + Sync`.
pub trait UploadObserver: Send + Sync {
    /// The selection was replaced or a file was removed.
    fn on_selection_changed(&self, selection: &SelectionState) {
        let _ = selection;
    }

    /// A request for `file` is about to be sent.
    fn on_submit_start(&self, file: &FileHandle) {
        let _ = file;
    }

    /// The displayed result was set (`Some`) or cleared (`None`).
    fn on_result_changed(&self, result: Option<&ConversionResult>) {
        let _ = result;
    }

    /// A submission attempt failed; its alert has already been raised.
    fn on_submit_error(&self, error: &SubmitError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need state events.
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Convenience alias for the type stored by the controller.
pub type SharedObserver = Arc<dyn UploadObserver>;
