//! Phase-completion alerts.
//!
//! Notification permission is a property of the [`Notifier`], queried on
//! every attempt. The engine asks for it once when notifications are turned
//! on; a denial is not an error, the alert is simply skipped.

mod desktop;
mod terminal;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::NotifierError;
use crate::queue::Queue;
use crate::timer::Phase;

pub use desktop::DesktopNotifier;
pub use terminal::TerminalNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Never asked.
    Undetermined,
}

pub trait Notifier: Send + Sync {
    /// Current permission; must not prompt.
    fn permission(&self) -> Permission;

    /// Ask for permission. May prompt the user or probe the platform.
    fn request_permission(&self) -> Permission;

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError>;
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn request_permission(&self) -> Permission {
        (**self).request_permission()
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError> {
        (**self).notify(title, body)
    }
}

/// Never notifies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifierError> {
        Err(NotifierError::PermissionDenied)
    }
}

/// Delivers alerts from a background thread.
///
/// Permission checks go straight to the inner notifier; only `notify` is
/// queued, so a slow notification service never stalls the timer driver.
pub struct QueuedNotifier {
    inner: Arc<dyn Notifier>,
    queue: Queue<(String, String)>,
}

impl QueuedNotifier {
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be started.
    pub fn spawn(inner: Arc<dyn Notifier>) -> std::io::Result<Self> {
        let sink = inner.clone();
        let queue = Queue::spawn("notifier", move |(title, body): (String, String)| {
            if let Err(e) = sink.notify(&title, &body) {
                warn!(error = %e, "failed to deliver notification");
            }
        })?;
        Ok(Self { inner, queue })
    }
}

impl Notifier for QueuedNotifier {
    fn permission(&self) -> Permission {
        self.inner.permission()
    }

    fn request_permission(&self) -> Permission {
        self.inner.request_permission()
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError> {
        if self.queue.push((title.to_string(), body.to_string())) {
            Ok(())
        } else {
            Err(NotifierError::WorkerStopped)
        }
    }
}

/// Title and body for the alert raised when `ended` finishes.
pub fn phase_end_message(ended: Phase) -> (&'static str, &'static str) {
    match ended {
        Phase::Break => ("Break is over!", "Time to get back to studying!"),
        Phase::Work => ("Pomodoro completed!", "Take a well-deserved break!"),
    }
}
