//! Duration policy: which phase comes next and how long it lasts.
//!
//! Pure functions of their inputs, no hidden state.

use super::phase::BreakKind;
use super::settings::Settings;

/// Break to take after `completed_work_cycles` work phases.
///
/// `completed_work_cycles` is the count *after* the work phase that just
/// ended, so with an interval of N the long break follows cycle N, 2N, 3N...
pub fn next_break(completed_work_cycles: u32, settings: &Settings) -> BreakKind {
    let interval = settings.long_break_interval.max(1);
    if completed_work_cycles > 0 && completed_work_cycles % interval == 0 {
        BreakKind::LongBreak
    } else {
        BreakKind::ShortBreak
    }
}

pub fn break_duration_secs(kind: BreakKind, settings: &Settings) -> u64 {
    let minutes = match kind {
        BreakKind::ShortBreak => settings.short_break_minutes,
        BreakKind::LongBreak => settings.long_break_minutes,
    };
    minutes_to_secs(minutes)
}

pub fn next_break_duration_secs(completed_work_cycles: u32, settings: &Settings) -> u64 {
    break_duration_secs(next_break(completed_work_cycles, settings), settings)
}

pub fn next_work_duration_secs(settings: &Settings) -> u64 {
    minutes_to_secs(settings.study_duration_minutes)
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_break_every_interval() {
        let settings = Settings::default();
        let kinds: Vec<_> = (1..=8).map(|n| next_break(n, &settings)).collect();
        assert_eq!(
            kinds,
            vec![
                BreakKind::ShortBreak,
                BreakKind::ShortBreak,
                BreakKind::ShortBreak,
                BreakKind::LongBreak,
                BreakKind::ShortBreak,
                BreakKind::ShortBreak,
                BreakKind::ShortBreak,
                BreakKind::LongBreak,
            ]
        );
    }

    #[test]
    fn interval_of_one_always_long() {
        let settings = Settings {
            long_break_interval: 1,
            ..Settings::default()
        };
        assert_eq!(next_break(1, &settings), BreakKind::LongBreak);
        assert_eq!(next_break(2, &settings), BreakKind::LongBreak);
    }

    #[test]
    fn durations_in_seconds() {
        let settings = Settings::default();
        assert_eq!(next_work_duration_secs(&settings), 1500);
        assert_eq!(next_break_duration_secs(1, &settings), 300);
        assert_eq!(next_break_duration_secs(4, &settings), 900);
    }
}
