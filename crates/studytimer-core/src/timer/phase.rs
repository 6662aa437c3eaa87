use serde::{Deserialize, Serialize};

/// Segment of a focus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Study Time",
            Phase::Break => "Break Time",
        }
    }
}

/// Break length chosen when a work phase ends.
///
/// Only exists at duration-selection time; the engine itself just tracks
/// [`Phase::Break`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    ShortBreak,
    LongBreak,
}

/// Live timer state.
///
/// `Idle` covers both "not started" and "paused": the countdown is frozen.
/// `Active` is counting down and receiving ticks. An `Active` state always
/// has `remaining_secs > 0`; reaching zero completes the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TimerState {
    Idle { phase: Phase, remaining_secs: u64 },
    Active { phase: Phase, remaining_secs: u64 },
}

impl TimerState {
    pub fn idle(phase: Phase, remaining_secs: u64) -> Self {
        TimerState::Idle {
            phase,
            remaining_secs,
        }
    }

    pub fn phase(&self) -> Phase {
        match *self {
            TimerState::Idle { phase, .. } | TimerState::Active { phase, .. } => phase,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        match *self {
            TimerState::Idle { remaining_secs, .. } | TimerState::Active { remaining_secs, .. } => {
                remaining_secs
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Active { .. })
    }
}

/// Read-only view of the engine handed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_secs: u64,
    pub running: bool,
    pub completed_work_cycles: u32,
}

impl TimerSnapshot {
    /// `MM:SS` rendering of the remaining time.
    pub fn clock_face(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }
}
