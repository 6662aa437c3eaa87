use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{BreakKind, Phase, Settings, TimerSnapshot};

/// Every state change in the engine produces an Event.
/// The CLI prints them; the driver broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Phase abandoned early; the engine is back at the start of a work phase.
    TimerStopped {
        ended: Phase,
        /// Whole minutes recorded as a partial session, if any.
        credited_minutes: Option<u32>,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimeAdjusted {
        phase: Phase,
        delta_secs: i64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        ended: Phase,
        next: Phase,
        /// Set when `next` is a break.
        next_break: Option<BreakKind>,
        remaining_secs: u64,
        running: bool,
        completed_work_cycles: u32,
        at: DateTime<Utc>,
    },
    SettingsApplied {
        settings: Settings,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        #[serde(flatten)]
        snapshot: TimerSnapshot,
        at: DateTime<Utc>,
    },
}
