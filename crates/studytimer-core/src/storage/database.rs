//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed and partial study sessions
//! - Session statistics (today, all-time, day streaks)

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, RecorderError};
use crate::recorder::{SessionKind, SessionRecord, SessionRecorder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub partial_sessions: u64,
    pub total_minutes: u64,
    pub today_minutes: u64,
    /// Consecutive days with at least one session, ending today (or
    /// yesterday if nothing has been recorded yet today).
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
}

/// SQLite database for session storage.
///
/// The connection sits behind a mutex so the database can be shared with
/// the timer driver as a [`SessionRecorder`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/studytimer/studytimer.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_default() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open(&dir.join("studytimer.db"))
    }

    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn
            .lock()
            .map_err(|_| DatabaseError::QueryFailed("connection mutex poisoned".into()))
    }

    /// Store a session. Returns `false` if a record with the same id was
    /// already stored.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<bool, DatabaseError> {
        let inserted = self.conn()?.execute(
            "INSERT OR IGNORE INTO sessions (id, kind, duration_min, occurred_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id.to_string(),
                record.kind.as_str(),
                record.duration_minutes,
                timestamp(record.occurred_at),
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Latest sessions first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, duration_min, occurred_at
             FROM sessions
             ORDER BY occurred_at DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, kind, minutes, occurred_at) = row?;
            records.push(SessionRecord {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::QueryFailed(format!("bad session id {id}: {e}")))?,
                kind: SessionKind::parse(&kind).ok_or_else(|| {
                    DatabaseError::QueryFailed(format!("bad session kind {kind}"))
                })?,
                duration_minutes: minutes,
                occurred_at: DateTime::parse_from_rfc3339(&occurred_at)
                    .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp {occurred_at}: {e}")))?
                    .with_timezone(&Utc),
            });
        }
        Ok(records)
    }

    /// Statistics as of now.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats(&self) -> Result<Stats, DatabaseError> {
        self.stats_at(Utc::now())
    }

    /// Statistics as of `now`; "today" is the UTC date of `now`.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats_at(&self, now: DateTime<Utc>) -> Result<Stats, DatabaseError> {
        let conn = self.conn()?;
        let mut stats = Stats::default();

        let mut stmt = conn.prepare(
            "SELECT kind, COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             GROUP BY kind",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        for row in rows {
            let (kind, count, minutes) = row?;
            stats.total_sessions += count;
            stats.total_minutes += minutes;
            match SessionKind::parse(&kind) {
                Some(SessionKind::Completed) => stats.completed_sessions += count,
                Some(SessionKind::Partial) => stats.partial_sessions += count,
                None => {}
            }
        }

        let today = now.date_naive();
        let start_of_today = format!("{}T00:00:00Z", today.format("%Y-%m-%d"));
        stats.today_minutes = conn.query_row(
            "SELECT COALESCE(SUM(duration_min), 0) FROM sessions WHERE occurred_at >= ?1",
            params![start_of_today],
            |row| row.get::<_, u64>(0),
        )?;

        let mut stmt =
            conn.prepare("SELECT DISTINCT substr(occurred_at, 1, 10) FROM sessions ORDER BY 1")?;
        let days = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|day| {
                day.ok()
                    .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
            })
            .collect::<Vec<_>>();
        let (current, longest) = streaks(&days, today);
        stats.current_streak_days = current;
        stats.longest_streak_days = longest;

        debug!(?stats, "computed session stats");
        Ok(stats)
    }
}

impl SessionRecorder for Database {
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError> {
        if !self.record_session(&record)? {
            debug!(session = %record.id, "duplicate session ignored");
        }
        Ok(())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current and longest runs of consecutive days in `days` (sorted,
/// deduplicated).
fn streaks(days: &[NaiveDate], today: NaiveDate) -> (u32, u32) {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let mut current = 0;
    let mut cursor = if days.last() == Some(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    for &day in days.iter().rev() {
        if day == cursor {
            current += 1;
            cursor -= Duration::days(1);
        } else if day < cursor {
            break;
        }
    }

    (current, longest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let now = at(2026, 10, 17, 10);
        db.record_session(&SessionRecord::completed(25, now)).unwrap();
        db.record_session(&SessionRecord::partial(10, now)).unwrap();

        let stats = db.stats_at(now).unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.partial_sessions, 1);
        assert_eq!(stats.total_minutes, 35);
        assert_eq!(stats.today_minutes, 35);
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let db = Database::open_memory().unwrap();
        let record = SessionRecord::completed(25, at(2026, 10, 17, 10));
        assert!(db.record_session(&record).unwrap());
        assert!(!db.record_session(&record).unwrap());
        assert_eq!(db.stats_at(record.occurred_at).unwrap().total_sessions, 1);
    }

    #[test]
    fn today_excludes_earlier_days() {
        let db = Database::open_memory().unwrap();
        db.record_session(&SessionRecord::completed(25, at(2026, 10, 16, 23)))
            .unwrap();
        db.record_session(&SessionRecord::completed(25, at(2026, 10, 17, 1)))
            .unwrap();
        let stats = db.stats_at(at(2026, 10, 17, 12)).unwrap();
        assert_eq!(stats.today_minutes, 25);
        assert_eq!(stats.total_minutes, 50);
    }

    #[test]
    fn recent_returns_latest_first() {
        let db = Database::open_memory().unwrap();
        let older = SessionRecord::completed(25, at(2026, 10, 16, 9));
        let newer = SessionRecord::partial(7, at(2026, 10, 17, 9));
        db.record_session(&older).unwrap();
        db.record_session(&newer).unwrap();

        let recent = db.recent(1).unwrap();
        assert_eq!(recent, vec![newer]);
    }

    #[test]
    fn works_as_session_recorder() {
        let db = Database::open_memory().unwrap();
        let recorder: &dyn SessionRecorder = &db;
        recorder
            .record(SessionRecord::completed(25, at(2026, 10, 17, 9)))
            .unwrap();
        assert_eq!(db.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn streaks_count_consecutive_days() {
        let days = [
            date(2026, 10, 1),
            date(2026, 10, 2),
            date(2026, 10, 3),
            date(2026, 10, 10),
            date(2026, 10, 16),
            date(2026, 10, 17),
        ];
        assert_eq!(streaks(&days, date(2026, 10, 17)), (2, 3));
    }

    #[test]
    fn current_streak_survives_until_end_of_today() {
        let days = [date(2026, 10, 15), date(2026, 10, 16)];
        assert_eq!(streaks(&days, date(2026, 10, 17)), (2, 2));
        assert_eq!(streaks(&days, date(2026, 10, 18)), (0, 2));
    }

    #[test]
    fn empty_history_has_no_streaks() {
        assert_eq!(streaks(&[], date(2026, 10, 17)), (0, 0));
    }

    #[test]
    fn stats_report_streaks() {
        let db = Database::open_memory().unwrap();
        for day in 14..=17 {
            db.record_session(&SessionRecord::completed(25, at(2026, 10, day, 9)))
                .unwrap();
        }
        let stats = db.stats_at(at(2026, 10, 17, 20)).unwrap();
        assert_eq!(stats.current_streak_days, 4);
        assert_eq!(stats.longest_streak_days, 4);
    }
}
