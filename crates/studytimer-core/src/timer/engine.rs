//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It owns no threads and never
//! sleeps: one `tick()` call means one elapsed second, and the caller (see
//! [`spawn_driver`](super::spawn_driver)) is responsible for pacing ticks
//! and serializing them with user intents.
//!
//! ## State Transitions
//!
//! ```text
//!              start                     tick (remaining -> 0)
//! Idle(phase) -------> Active(phase) --------------------------> Idle|Active(next)
//!      ^                  |                                     (auto-start setting)
//!      +------ pause -----+
//!
//! stop (any state) -> Idle(Work, study duration)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Settings::default())?
//!     .with_recorder(Arc::new(db))
//!     .with_notifier(Arc::new(TerminalNotifier::new(true)));
//! engine.start();
//! // Once per elapsed second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted { .. }) at zero
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::phase::{Phase, TimerSnapshot, TimerState};
use super::policy;
use super::settings::{Settings, SettingsStore};
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{phase_end_message, Notifier, NullNotifier, Permission};
use crate::recorder::{DiscardRecorder, SessionRecord, SessionRecorder};

/// Core focus-session engine.
pub struct TimerEngine {
    state: TimerState,
    completed_work_cycles: u32,
    settings: SettingsStore,
    /// Whether permission has been asked for since notifications were last
    /// switched on.
    permission_requested: bool,
    recorder: Arc<dyn SessionRecorder>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Create an engine in `Idle(Work, study duration)`.
    ///
    /// Records are discarded and notifications are not delivered until a
    /// recorder and notifier are attached.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `settings` is out of range.
    pub fn new(settings: Settings) -> Result<Self, ValidationError> {
        let settings = SettingsStore::new(settings)?;
        let work_secs = policy::next_work_duration_secs(settings.get());
        Ok(Self {
            state: TimerState::idle(Phase::Work, work_secs),
            completed_work_cycles: 0,
            settings,
            permission_requested: false,
            recorder: Arc::new(DiscardRecorder),
            notifier: Arc::new(NullNotifier),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn SessionRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Attach a notifier, asking it for permission if notifications are on.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self.permission_requested = false;
        self.ensure_permission();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    pub fn settings(&self) -> &Settings {
        self.settings.get()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase(),
            remaining_secs: self.remaining_secs(),
            running: self.is_running(),
            completed_work_cycles: self.completed_work_cycles,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            snapshot: self.snapshot(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the countdown. A phase with nothing left completes
    /// immediately instead of running for zero seconds.
    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Active { .. } => None,
            TimerState::Idle {
                phase,
                remaining_secs: 0,
            } => {
                debug!(?phase, "start with no time left, completing phase");
                Some(self.complete_phase(phase))
            }
            TimerState::Idle {
                phase,
                remaining_secs,
            } => {
                self.state = TimerState::Active {
                    phase,
                    remaining_secs,
                };
                debug!(?phase, remaining_secs, "timer started");
                Some(Event::TimerStarted {
                    phase,
                    remaining_secs,
                    at: self.clock.now(),
                })
            }
        }
    }

    /// Freeze the countdown. Resuming continues from exactly this value.
    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Active {
                phase,
                remaining_secs,
            } => {
                self.state = TimerState::idle(phase, remaining_secs);
                debug!(?phase, remaining_secs, "timer paused");
                Some(Event::TimerPaused {
                    phase,
                    remaining_secs,
                    at: self.clock.now(),
                })
            }
            TimerState::Idle { .. } => None,
        }
    }

    /// One elapsed second. Returns `Some(Event::PhaseCompleted)` when the
    /// phase runs out. Ignored while idle.
    pub fn tick(&mut self) -> Option<Event> {
        let TimerState::Active {
            phase,
            remaining_secs,
        } = self.state
        else {
            return None;
        };

        let remaining_secs = remaining_secs.saturating_sub(1);
        if remaining_secs == 0 {
            return Some(self.complete_phase(phase));
        }
        self.state = TimerState::Active {
            phase,
            remaining_secs,
        };
        None
    }

    /// Abandon the current phase and return to the start of a work phase.
    ///
    /// A running work phase is credited as a partial session with the whole
    /// minutes between the current study duration and the time left.
    /// Breaks are never credited.
    pub fn stop(&mut self) -> Event {
        let ended = self.phase();
        let remaining = self.remaining_secs();

        let mut credited_minutes = None;
        if ended == Phase::Work && self.is_running() {
            let study_secs = policy::next_work_duration_secs(self.settings.get());
            let elapsed = study_secs.saturating_sub(remaining);
            let minutes = u32::try_from(elapsed / 60).unwrap_or(u32::MAX);
            if minutes > 0 {
                self.emit(SessionRecord::partial(minutes, self.clock.now()));
                credited_minutes = Some(minutes);
            }
        }

        let work_secs = policy::next_work_duration_secs(self.settings.get());
        self.enter(Phase::Work, work_secs, false);
        debug!(?ended, ?credited_minutes, "timer stopped");

        Event::TimerStopped {
            ended,
            credited_minutes,
            remaining_secs: work_secs,
            at: self.clock.now(),
        }
    }

    /// Shift the remaining time while idle, clamping at zero.
    /// Ignored while running.
    pub fn adjust_remaining(&mut self, delta_secs: i64) -> Option<Event> {
        let TimerState::Idle {
            phase,
            remaining_secs,
        } = self.state
        else {
            debug!(delta_secs, "adjust ignored while running");
            return None;
        };

        let adjusted = i128::from(remaining_secs) + i128::from(delta_secs);
        let remaining_secs = u64::try_from(adjusted.max(0)).unwrap_or(u64::MAX);
        self.state = TimerState::idle(phase, remaining_secs);
        Some(Event::TimeAdjusted {
            phase,
            delta_secs,
            remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Replace the settings.
    ///
    /// An idle work phase picks up the new study duration immediately. A
    /// running phase keeps its countdown; new durations apply from the next
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field. Nothing is
    /// changed in that case.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<Event, ValidationError> {
        let previous = self.settings.apply(settings)?;

        if let TimerState::Idle {
            phase: Phase::Work, ..
        } = self.state
        {
            let work_secs = policy::next_work_duration_secs(&settings);
            self.enter(Phase::Work, work_secs, false);
        }

        if !settings.notifications_enabled {
            self.permission_requested = false;
        } else if !previous.notifications_enabled {
            self.ensure_permission();
        }

        info!(
            study = settings.study_duration_minutes,
            short_break = settings.short_break_minutes,
            long_break = settings.long_break_minutes,
            interval = settings.long_break_interval,
            "settings applied"
        );
        Ok(Event::SettingsApplied {
            settings,
            remaining_secs: self.remaining_secs(),
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, phase: Phase, duration_secs: u64, running: bool) {
        self.state = if running && duration_secs > 0 {
            TimerState::Active {
                phase,
                remaining_secs: duration_secs,
            }
        } else {
            TimerState::idle(phase, duration_secs)
        };
    }

    fn complete_phase(&mut self, ended: Phase) -> Event {
        self.notify_phase_end(ended);

        let settings = *self.settings.get();
        let (next, next_break) = match ended {
            Phase::Break => {
                let secs = policy::next_work_duration_secs(&settings);
                self.enter(Phase::Work, secs, settings.auto_start_next_work);
                (Phase::Work, None)
            }
            Phase::Work => {
                self.completed_work_cycles = self.completed_work_cycles.saturating_add(1);
                self.emit(SessionRecord::completed(
                    settings.study_duration_minutes,
                    self.clock.now(),
                ));
                let kind = policy::next_break(self.completed_work_cycles, &settings);
                let secs = policy::break_duration_secs(kind, &settings);
                self.enter(Phase::Break, secs, settings.auto_start_breaks);
                (Phase::Break, Some(kind))
            }
        };

        info!(
            ?ended,
            ?next,
            ?next_break,
            cycles = self.completed_work_cycles,
            running = self.is_running(),
            "phase completed"
        );
        Event::PhaseCompleted {
            ended,
            next,
            next_break,
            remaining_secs: self.remaining_secs(),
            running: self.is_running(),
            completed_work_cycles: self.completed_work_cycles,
            at: self.clock.now(),
        }
    }

    /// Hand a record to the recorder. Failures are logged, never retried.
    fn emit(&self, record: SessionRecord) {
        let id = record.id;
        let kind = record.kind;
        let minutes = record.duration_minutes;
        match self.recorder.record(record) {
            Ok(()) => info!(session = %id, ?kind, minutes, "session recorded"),
            Err(e) => warn!(session = %id, ?kind, minutes, error = %e, "failed to record session"),
        }
    }

    fn notify_phase_end(&self, ended: Phase) {
        if !self.settings.get().notifications_enabled {
            return;
        }
        if self.notifier.permission() != Permission::Granted {
            debug!(?ended, "notification skipped, permission not granted");
            return;
        }
        let (title, body) = phase_end_message(ended);
        if let Err(e) = self.notifier.notify(title, body) {
            warn!(error = %e, "failed to deliver notification");
        }
    }

    fn ensure_permission(&mut self) {
        if self.permission_requested || !self.settings.get().notifications_enabled {
            return;
        }
        self.permission_requested = true;
        if self.notifier.permission() != Permission::Granted {
            let permission = self.notifier.request_permission();
            debug!(?permission, "notification permission requested");
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("completed_work_cycles", &self.completed_work_cycles)
            .field("settings", self.settings.get())
            .finish_non_exhaustive()
    }
}
