//! Session records and the sinks that persist them.
//!
//! The engine hands each [`SessionRecord`] to a [`SessionRecorder`] exactly
//! once, by value, and keeps no reference afterwards. Delivery is best
//! effort: a recorder failure is logged by the engine and never rolls back a
//! phase transition.

pub mod http;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::RecorderError;
use crate::queue::Queue;

pub use http::HttpRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// A work phase that ran to zero.
    Completed,
    /// A work phase stopped early, credited in whole minutes.
    Partial,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Completed => "completed",
            SessionKind::Partial => "partial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(SessionKind::Completed),
            "partial" => Some(SessionKind::Partial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique per record so stores can drop duplicates.
    pub id: Uuid,
    pub duration_minutes: u32,
    pub kind: SessionKind,
    pub occurred_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(kind: SessionKind, duration_minutes: u32, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_minutes,
            kind,
            occurred_at,
        }
    }

    pub fn completed(duration_minutes: u32, occurred_at: DateTime<Utc>) -> Self {
        Self::new(SessionKind::Completed, duration_minutes, occurred_at)
    }

    pub fn partial(duration_minutes: u32, occurred_at: DateTime<Utc>) -> Self {
        Self::new(SessionKind::Partial, duration_minutes, occurred_at)
    }
}

/// Sink for finished sessions.
///
/// Implementations must not block for long: the engine calls `record`
/// inline during a phase transition. Slow sinks should hand the work off
/// (see [`HttpRecorder`]).
pub trait SessionRecorder: Send + Sync {
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError>;
}

impl<T: SessionRecorder + ?Sized> SessionRecorder for Arc<T> {
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError> {
        (**self).record(record)
    }
}

/// Drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardRecorder;

impl SessionRecorder for DiscardRecorder {
    fn record(&self, _record: SessionRecord) -> Result<(), RecorderError> {
        Ok(())
    }
}

/// Keeps records in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<SessionRecord>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl SessionRecorder for MemoryRecorder {
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}

/// Forwards each record to every inner recorder.
///
/// A failing recorder does not stop delivery to the others. The first error
/// is returned after all recorders have been tried.
#[derive(Default)]
pub struct FanoutRecorder {
    recorders: Vec<(String, Arc<dyn SessionRecorder>)>,
}

impl FanoutRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, recorder: Arc<dyn SessionRecorder>) -> Self {
        self.recorders.push((name.into(), recorder));
        self
    }
}

impl SessionRecorder for FanoutRecorder {
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError> {
        let mut first_err = None;
        for (name, recorder) in &self.recorders {
            if let Err(e) = recorder.record(record.clone()) {
                warn!(recorder = %name, session = %record.id, error = %e, "session recorder failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Delivers records to a slow recorder from a background thread.
///
/// `record` only enqueues, so the timer driver never waits on the inner
/// sink. Records keep their order. Dropping the recorder waits for the
/// queue to drain.
pub struct QueuedRecorder {
    queue: Queue<SessionRecord>,
}

impl QueuedRecorder {
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be started.
    pub fn spawn(name: &str, inner: Arc<dyn SessionRecorder>) -> std::io::Result<Self> {
        let recorder = name.to_string();
        let queue = Queue::spawn(name, move |record: SessionRecord| {
            let id = record.id;
            if let Err(e) = inner.record(record) {
                warn!(recorder = %recorder, session = %id, error = %e, "queued session recorder failed");
            }
        })?;
        Ok(Self { queue })
    }
}

impl SessionRecorder for QueuedRecorder {
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError> {
        if self.queue.push(record) {
            Ok(())
        } else {
            Err(RecorderError::WorkerStopped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl SessionRecorder for Failing {
        fn record(&self, _record: SessionRecord) -> Result<(), RecorderError> {
            Err(RecorderError::NoRuntime)
        }
    }

    #[test]
    fn session_kind_round_trips_through_str() {
        for kind in [SessionKind::Completed, SessionKind::Partial] {
            assert_eq!(SessionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SessionKind::parse("pomodoro"), None);
    }

    #[test]
    fn records_get_distinct_ids() {
        let now = Utc::now();
        assert_ne!(
            SessionRecord::completed(25, now).id,
            SessionRecord::completed(25, now).id
        );
    }

    #[test]
    fn fanout_delivers_past_a_failure() {
        let memory = Arc::new(MemoryRecorder::new());
        let fanout = FanoutRecorder::new()
            .with("failing", Arc::new(Failing))
            .with("memory", memory.clone());

        let result = fanout.record(SessionRecord::partial(10, Utc::now()));

        assert!(matches!(result, Err(RecorderError::NoRuntime)));
        assert_eq!(memory.records().len(), 1);
        assert_eq!(memory.records()[0].duration_minutes, 10);
    }

    #[test]
    fn queued_recorder_delivers_in_order_before_drop_returns() {
        let memory = Arc::new(MemoryRecorder::new());
        let queued = QueuedRecorder::spawn("memory", memory.clone()).unwrap();

        queued.record(SessionRecord::completed(25, Utc::now())).unwrap();
        queued.record(SessionRecord::partial(7, Utc::now())).unwrap();
        drop(queued);

        let minutes: Vec<_> = memory.records().iter().map(|r| r.duration_minutes).collect();
        assert_eq!(minutes, vec![25, 7]);
    }

    #[test]
    fn queued_recorder_swallows_inner_failures() {
        let queued = QueuedRecorder::spawn("failing", Arc::new(Failing)).unwrap();
        assert!(queued
            .record(SessionRecord::partial(3, Utc::now()))
            .is_ok());
    }
}
