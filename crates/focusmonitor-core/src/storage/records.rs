//! SQLite-backed store for completed focus records.
//!
//! Records are append-only: there is no update or delete. The store also
//! carries a small `kv` table used to persist the serialized state machine
//! between CLI invocations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::{CoreError, StoreError};
use crate::session::FocusRecord;

/// Append-only record log, keyed by record id, indexed by completion date.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open the store at `~/.config/focusmonitor/focusmonitor.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusmonitor.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (used by tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id                   TEXT PRIMARY KEY,
                session_id           TEXT NOT NULL,
                actual_duration_min  INTEGER NOT NULL,
                date                 TEXT NOT NULL,
                achievement          TEXT,
                created_at           TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_date ON records(date);",
        )?;
        Ok(())
    }

    /// Persist one record.
    ///
    /// # Errors
    /// `DuplicateId` if a record with the same id was already appended;
    /// `Unavailable`/`QueryFailed` on underlying storage failure.
    pub fn append(&self, record: &FocusRecord) -> Result<(), StoreError> {
        let result = self.conn.execute(
            "INSERT INTO records (id, session_id, actual_duration_min, date, achievement, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.session_id,
                record.actual_duration_min,
                record.date.to_rfc3339(),
                record.achievement,
                record.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateId(record.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All records, ordered by completion date ascending.
    pub fn list_all(&self) -> Result<Vec<FocusRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, actual_duration_min, date, achievement, created_at
             FROM records ORDER BY date ASC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Records with completion date in `[start, end]` inclusive, ordered
    /// by date ascending.
    pub fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FocusRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, actual_duration_min, date, achievement, created_at
             FROM records WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![start.to_rfc3339(), end.to_rfc3339()], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row) -> Result<FocusRecord, rusqlite::Error> {
    let date_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;
    Ok(FocusRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        actual_duration_min: row.get(2)?,
        date: parse_datetime_fallback(&date_str),
        achievement: row.get(4)?,
        created_at: parse_datetime_fallback(&created_str),
    })
}

/// Parse an RFC 3339 string, falling back to the current instant.
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
