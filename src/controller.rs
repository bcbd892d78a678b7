//! The upload controller: owns the selection, the displayed result, and the
//! submission workflow.
//!
//! ## State machine (per submission attempt)
//!
//! ```text
//! idle ──submit, selection empty──▶ idle                  (alert only)
//! idle ──submit, file held────────▶ in flight
//!                                     ├─ complete 2xx ──▶ idle, new result
//!                                     ├─ partial 2xx ───▶ idle, no result
//!                                     └─ non-2xx / I/O ─▶ idle, prior result kept
//! ```
//!
//! ## Locking
//!
//! State sits behind a `std::sync::Mutex` that is only held for the few
//! instructions it takes to read or replace a field, never across the network
//! `.await`. Observers and the notifier are always invoked after the lock is
//! released, observers first. Overlapping submissions are allowed unless the config selects
//! [`InFlightPolicy::Reject`]; with `Allow`, whichever response resolves last
//! decides the final result.

use crate::client::SharedService;
use crate::config::InFlightPolicy;
use crate::error::SubmitError;
use crate::notify::SharedNotifier;
use crate::observer::SharedObserver;
use crate::output::{ConversionResult, RequestOutcome};
use crate::selection::{FileHandle, SelectionState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Everything a view needs to render, copied out of the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSnapshot {
    pub selection: SelectionState,
    pub result: Option<ConversionResult>,
    pub outcome: Option<RequestOutcome>,
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct WorkflowState {
    selection: SelectionState,
    result: Option<ConversionResult>,
    outcome: Option<RequestOutcome>,
}

/// Mediates between file selection and the remote conversion call.
pub struct UploadController {
    service: SharedService,
    notifier: SharedNotifier,
    policy: InFlightPolicy,
    observers: Mutex<Vec<SharedObserver>>,
    state: Mutex<WorkflowState>,
    in_flight: AtomicUsize,
}

impl UploadController {
    pub fn new(service: SharedService, notifier: SharedNotifier) -> Self {
        Self {
            service,
            notifier,
            policy: InFlightPolicy::default(),
            observers: Mutex::new(Vec::new()),
            state: Mutex::new(WorkflowState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_policy(mut self, policy: InFlightPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register an observer for state changes.
    pub fn subscribe(&self, observer: SharedObserver) {
        lock(&self.observers).push(observer);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn selection(&self) -> SelectionState {
        lock(&self.state).selection.clone()
    }

    pub fn result(&self) -> Option<ConversionResult> {
        lock(&self.state).result.clone()
    }

    /// Outcome of the most recent attempt that got past the precondition checks.
    pub fn outcome(&self) -> Option<RequestOutcome> {
        lock(&self.state).outcome.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let state = lock(&self.state);
        UploadSnapshot {
            selection: state.selection.clone(),
            result: state.result.clone(),
            outcome: state.outcome.clone(),
            in_flight: self.in_flight.load(Ordering::SeqCst),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    /// Replace the selection. Count and size are not re-validated here; the
    /// dropzone has already done that.
    pub fn set_selection(&self, files: Vec<FileHandle>) {
        let selection = SelectionState::from_files(files);
        lock(&self.state).selection = selection.clone();
        for obs in self.observers() {
            obs.on_selection_changed(&selection);
        }
    }

    /// Upload the held file and update the result from the response.
    ///
    /// Never returns an error: every failure is logged, raised through the
    /// notifier exactly once, and recorded in [`Self::outcome`].
    pub async fn submit(&self) {
        let Some(file) = self.selection().file().cloned() else {
            self.raise(SubmitError::NoFileSelected);
            return;
        };

        let previously = self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _flight = FlightGuard(&self.in_flight);
        if previously > 0 && self.policy == InFlightPolicy::Reject {
            self.raise(SubmitError::SubmissionInProgress);
            return;
        }

        info!(file = %file.name(), size = file.size(), "Submitting file for conversion");
        lock(&self.state).outcome = Some(RequestOutcome::Pending);
        for obs in self.observers() {
            obs.on_submit_start(&file);
        }

        let outcome = match self.service.convert(&file).await {
            Ok(body) => body.into_result(),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                info!(
                    file = %file.name(),
                    extracted_len = result.extracted().len(),
                    summary_len = result.summary().len(),
                    "Conversion succeeded"
                );
                {
                    let mut state = lock(&self.state);
                    state.result = Some(result.clone());
                    state.outcome = Some(RequestOutcome::Succeeded(result.clone()));
                }
                for obs in self.observers() {
                    obs.on_result_changed(Some(&result));
                }
            }
            Err(e) => self.raise(e),
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Log, record, and alert a failed attempt.
    fn raise(&self, e: SubmitError) {
        let mut cleared = false;
        match &e {
            SubmitError::NoFileSelected | SubmitError::SubmissionInProgress => {
                warn!(error = %e, "Submission skipped");
            }
            _ => {
                error!(error = %e, "Submission failed");
                let mut state = lock(&self.state);
                if !e.keeps_prior_result() {
                    cleared = state.result.take().is_some();
                }
                state.outcome = Some(RequestOutcome::Failed(e.clone()));
            }
        }

        // Observers settle first so a progress display is gone before the alert.
        let observers = self.observers();
        if cleared {
            for obs in &observers {
                obs.on_result_changed(None);
            }
        }
        for obs in &observers {
            obs.on_submit_error(&e);
        }

        self.notifier.notify(e.alert());
    }

    fn observers(&self) -> Vec<SharedObserver> {
        lock(&self.observers).clone()
    }
}

/// Decrements the in-flight counter when a submission ends, however it ends.
struct FlightGuard<'a>(&'a AtomicUsize);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Lock a mutex, recovering the data if a panicking observer poisoned it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
