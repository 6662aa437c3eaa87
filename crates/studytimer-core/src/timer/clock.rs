//! Time sources for the timer.
//!
//! Two separate concerns live here:
//!
//! - [`Clock`] answers "what time is it" and stamps session records.
//! - [`TickSource`] paces the countdown, one tick per elapsed second.
//!
//! Both are swappable so tests never wait on real time.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Wall clock used to timestamp session records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Periodic source of one-second ticks.
///
/// The driver only awaits [`next_tick`](TickSource::next_tick) while the
/// engine is running, and calls [`reset`](TickSource::reset) whenever the
/// engine goes from idle to running so the first tick lands one full period
/// after the start.
pub trait TickSource: Send {
    /// Resolve on the next tick. `None` means the source is exhausted.
    fn next_tick(&mut self) -> impl Future<Output = Option<()>> + Send;

    /// Restart the period and drop anything queued while idle.
    fn reset(&mut self);
}

/// Tick source backed by [`tokio::time::interval`].
///
/// Ticks missed while the driver was busy are delivered back to back, so
/// every elapsed second is still counted.
#[derive(Debug)]
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        Self { interval }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> Option<()> {
        self.interval.tick().await;
        Some(())
    }

    fn reset(&mut self) {
        self.interval.reset();
    }
}

/// Sending half of a [`ChannelTicks`] source.
#[derive(Debug, Clone)]
pub struct TickFeeder {
    tx: mpsc::UnboundedSender<()>,
}

impl TickFeeder {
    /// Deliver one tick. Returns `false` once the receiving side is gone.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    pub fn ticks(&self, count: u64) -> bool {
        (0..count).all(|_| self.tick())
    }
}

/// Tick source fed by hand through a [`TickFeeder`].
#[derive(Debug)]
pub struct ChannelTicks {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ChannelTicks {
    pub fn new() -> (TickFeeder, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TickFeeder { tx }, Self { rx })
    }
}

impl TickSource for ChannelTicks {
    async fn next_tick(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    fn reset(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
    }

    #[tokio::test]
    async fn channel_ticks_reset_drops_queued() {
        let (feeder, mut ticks) = ChannelTicks::new();
        assert!(feeder.ticks(3));
        ticks.reset();
        assert!(feeder.tick());
        assert_eq!(ticks.next_tick().await, Some(()));
        assert!(ticks.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn channel_ticks_end_when_feeder_dropped() {
        let (feeder, mut ticks) = ChannelTicks::new();
        drop(feeder);
        assert_eq!(ticks.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_first_tick_after_full_period() {
        let mut ticks = IntervalTicks::every_second();
        let before = time::Instant::now();
        ticks.next_tick().await;
        assert!(before.elapsed() >= Duration::from_secs(1));
    }
}
