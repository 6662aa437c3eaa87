//! # Study Timer Core Library
//!
//! This library provides the focus-session ("Pomodoro") engine behind the
//! Study Timer client, together with the collaborators it reports to.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-driven state machine over `Idle`/`Active` x
//!   `Work`/`Break`. One `tick()` is one elapsed second.
//! - **Driver**: A tokio task that serializes user intents and clock ticks
//!   onto the engine.
//! - **Recorders**: Sinks for completed and partial sessions (SQLite, HTTP).
//! - **Notifiers**: Permission-gated phase-completion alerts.
//! - **Storage**: SQLite session statistics and TOML configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerHandle`]: Async handle to a driven engine
//! - [`Settings`]: Validated timer configuration
//! - [`SessionRecorder`]: Trait for session sinks
//! - [`Notifier`]: Trait for alert delivery
//! - [`Database`]: Session persistence and statistics
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
mod queue;
pub mod recorder;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, NotifierError, RecorderError, ValidationError};
pub use events::Event;
pub use notify::{Notifier, Permission};
pub use recorder::{SessionKind, SessionRecord, SessionRecorder};
pub use storage::{Config, Database, Stats};
pub use timer::{
    spawn_driver, BreakKind, Phase, Settings, TimerEngine, TimerHandle, TimerSnapshot, TimerState,
};
