mod clock;
mod driver;
mod engine;
mod phase;
pub mod policy;
mod settings;

pub use clock::{ChannelTicks, Clock, IntervalTicks, ManualClock, SystemClock, TickFeeder, TickSource};
pub use driver::{spawn_driver, TimerHandle};
pub use engine::TimerEngine;
pub use phase::{BreakKind, Phase, TimerSnapshot, TimerState};
pub use settings::{Settings, SettingsStore};
