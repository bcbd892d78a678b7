//! User-visible alerts.
//!
//! The controller never prints anything itself. Every alert goes through an
//! injected [`Notifier`], so a terminal front end can print it, a headless
//! caller can log it, and a test can record it.

use std::sync::Arc;
use tracing::warn;

/// Receives one-shot, user-facing alert messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Any `Fn(&str)` closure is a notifier.
impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Routes alerts into the `tracing` log at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(alert = %message, "User alert");
    }
}

/// Convenience alias for the shared notifier handle.
pub type SharedNotifier = Arc<dyn Notifier>;
