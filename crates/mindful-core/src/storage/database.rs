//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed breathing and focus sessions
//! - Session statistics (daily and all-time)
//! - Key-value store for application state (e.g. the serialized timer)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::SessionKind;

/// A finished session, ready to be persisted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub kind: SessionKind,
    /// Pattern or preset label shown to the user.
    pub label: String,
    pub duration_secs: u64,
    /// Full phase cycles completed (breaths for breathing sessions).
    pub cycles: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Where hosts record "session completed" events. The timer itself never
/// persists anything.
pub trait CompletionStore {
    /// Persist one completed session and return its id.
    ///
    /// # Errors
    /// Returns an error if the underlying store rejects the write.
    fn record_completion(&self, session: &CompletedSession) -> Result<i64>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub kind: String,
    pub label: String,
    pub duration_secs: u64,
    pub cycles: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Stats {
    pub total_sessions: u64,
    pub breathing_sessions: u64,
    pub focus_sessions: u64,
    pub breathing_min: u64,
    pub focus_min: u64,
    pub breath_cycles: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/mindful.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("mindful.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        info!(path = %path.display(), "session database opened");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                kind          TEXT NOT NULL,
                label         TEXT NOT NULL DEFAULT '',
                duration_secs INTEGER NOT NULL,
                cycles        INTEGER NOT NULL DEFAULT 0,
                started_at    TEXT NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_kind ON sessions(kind);",
        )?;
        Ok(())
    }

    /// Statistics over every recorded session.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn stats_all(&self) -> Result<Stats> {
        self.stats_since(None)
    }

    /// Statistics over sessions completed since midnight UTC.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn stats_today(&self) -> Result<Stats> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_since(Some(&format!("{today}T00:00:00+00:00")))
    }

    fn stats_since(&self, since: Option<&str>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*), COALESCE(SUM(duration_secs), 0), COALESCE(SUM(cycles), 0)
             FROM sessions
             WHERE ?1 IS NULL OR completed_at >= ?1
             GROUP BY kind",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        for row in rows {
            let (kind, count, secs, cycles) = row?;
            stats.total_sessions += count;
            match kind.as_str() {
                "breathing" => {
                    stats.breathing_sessions += count;
                    stats.breathing_min += secs / 60;
                    stats.breath_cycles += cycles;
                }
                "focus" => {
                    stats.focus_sessions += count;
                    stats.focus_min += secs / 60;
                }
                _ => {}
            }
        }
        Ok(stats)
    }

    /// Most recently completed sessions, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored timestamp is malformed.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, label, duration_secs, cycles, started_at, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, kind, label, duration_secs, cycles, started, completed) = row?;
            records.push(SessionRecord {
                id,
                kind,
                label,
                duration_secs,
                cycles,
                started_at: parse_timestamp(&started)?,
                completed_at: parse_timestamp(&completed)?,
            });
        }
        Ok(records)
    }

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl CompletionStore for Database {
    fn record_completion(&self, session: &CompletedSession) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (kind, label, duration_secs, cycles, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.kind.as_str(),
                session.label,
                session.duration_secs,
                session.cycles,
                session.started_at.to_rfc3339(),
                session.completed_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, kind = %session.kind, secs = session.duration_secs, "session recorded");
        Ok(id)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")).into())
}
