//! Cooperative task that owns a [`TimerEngine`] and feeds it.
//!
//! Intents and ticks are serialized onto one task with `tokio::select!`, so
//! nothing ever touches the engine concurrently. Ticks are only awaited
//! while the engine is running, and the tick source is reset every time the
//! engine goes from idle to running. Intents win over ticks when both are
//! ready, so a pause is never overtaken by a tick that was already due.
//!
//! Recorders and notifiers run inline on this task. Wrap blocking ones in
//! [`QueuedRecorder`](crate::recorder::QueuedRecorder) or
//! [`QueuedNotifier`](crate::notify::QueuedNotifier).

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::clock::TickSource;
use super::engine::TimerEngine;
use super::phase::TimerSnapshot;
use super::settings::Settings;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

enum Intent {
    Start,
    Pause,
    Stop,
    Adjust(i64),
    ApplySettings(Settings, oneshot::Sender<Result<(), ValidationError>>),
    Snapshot(oneshot::Sender<TimerSnapshot>),
    SnapshotEvent(oneshot::Sender<Event>),
    Shutdown,
}

/// Cloneable handle to a running driver.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    intents: mpsc::UnboundedSender<Intent>,
    events: broadcast::Sender<Event>,
}

/// Move `engine` onto a new task paced by `ticks`.
///
/// The join handle yields the engine back after [`TimerHandle::shutdown`]
/// or once every handle is dropped.
pub fn spawn_driver<T>(engine: TimerEngine, ticks: T) -> (TimerHandle, JoinHandle<TimerEngine>)
where
    T: TickSource + 'static,
{
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
    let handle = TimerHandle {
        intents: intent_tx,
        events: event_tx.clone(),
    };
    let task = tokio::spawn(drive(engine, ticks, intent_rx, event_tx));
    (handle, task)
}

impl TimerHandle {
    pub async fn start(&self) -> Result<(), CoreError> {
        self.send(Intent::Start)
    }

    pub async fn pause(&self) -> Result<(), CoreError> {
        self.send(Intent::Pause)
    }

    pub async fn stop(&self) -> Result<(), CoreError> {
        self.send(Intent::Stop)
    }

    pub async fn adjust(&self, delta_secs: i64) -> Result<(), CoreError> {
        self.send(Intent::Adjust(delta_secs))
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the settings are rejected, or
    /// [`CoreError::DriverClosed`] if the driver has stopped.
    pub async fn apply_settings(&self, settings: Settings) -> Result<(), CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Intent::ApplySettings(settings, tx))?;
        rx.await.map_err(|_| CoreError::DriverClosed)??;
        Ok(())
    }

    pub async fn state(&self) -> Result<TimerSnapshot, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Intent::Snapshot(tx))?;
        rx.await.map_err(|_| CoreError::DriverClosed)
    }

    /// Current state as a timestamped [`Event::StateSnapshot`].
    pub async fn snapshot_event(&self) -> Result<Event, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Intent::SnapshotEvent(tx))?;
        rx.await.map_err(|_| CoreError::DriverClosed)
    }

    /// Receive every event produced after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.send(Intent::Shutdown)
    }

    fn send(&self, intent: Intent) -> Result<(), CoreError> {
        self.intents
            .send(intent)
            .map_err(|_| CoreError::DriverClosed)
    }
}

async fn drive<T: TickSource>(
    mut engine: TimerEngine,
    mut ticks: T,
    mut intents: mpsc::UnboundedReceiver<Intent>,
    events: broadcast::Sender<Event>,
) -> TimerEngine {
    let publish = |event: Option<Event>| {
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = events.send(event);
        }
    };

    let mut ticking = false;
    loop {
        let running = engine.is_running();
        if running && !ticking {
            ticks.reset();
        }
        ticking = running;

        tokio::select! {
            biased;

            intent = intents.recv() => match intent {
                Some(Intent::Start) => publish(engine.start()),
                Some(Intent::Pause) => publish(engine.pause()),
                Some(Intent::Stop) => publish(Some(engine.stop())),
                Some(Intent::Adjust(delta)) => publish(engine.adjust_remaining(delta)),
                Some(Intent::ApplySettings(settings, reply)) => {
                    let result = engine.apply_settings(settings).map(|event| publish(Some(event)));
                    let _ = reply.send(result);
                }
                Some(Intent::Snapshot(reply)) => {
                    let _ = reply.send(engine.snapshot());
                }
                Some(Intent::SnapshotEvent(reply)) => {
                    let _ = reply.send(engine.snapshot_event());
                }
                Some(Intent::Shutdown) | None => {
                    debug!("timer driver shutting down");
                    break;
                }
            },

            tick = ticks.next_tick(), if running => match tick {
                Some(()) => publish(engine.tick()),
                None => {
                    warn!("tick source closed, pausing timer");
                    publish(engine.pause());
                    break;
                }
            },
        }
    }
    engine
}
