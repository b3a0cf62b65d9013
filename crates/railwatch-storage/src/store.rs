use crate::error::{Result, StorageError};
use chrono::{DateTime, Duration, Utc};
use railwatch_common::types::{Direction, TrainRecord};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS train_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_time INTEGER NOT NULL,
    train_id TEXT NOT NULL,
    status TEXT NOT NULL,
    delay_minutes INTEGER NOT NULL,
    station TEXT NOT NULL,
    direction TEXT NOT NULL DEFAULT 'OUT'
);
CREATE INDEX IF NOT EXISTS idx_train_logs_time ON train_logs(log_time);
CREATE INDEX IF NOT EXISTS idx_train_logs_train ON train_logs(train_id);
";

/// Append-only store of normalized train observations.
///
/// The connection is serialized behind a `Mutex` (single writer); WAL
/// journal mode keeps the file readable by other processes while a batch
/// insert is in flight.
pub struct TrainStore {
    conn: Mutex<Connection>,
}

impl TrainStore {
    /// Opens (creating if absent) the database file. Call
    /// [`TrainStore::migrate`] before any other operation.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| StorageError::Migration(format!("create {}: {e}", dir.display())))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection, recovering from a poisoned Mutex if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Idempotent schema migration: creates the table and both indexes,
    /// then adds the `direction` column to databases created before it
    /// existed. Existing rows are never touched. Safe to run repeatedly.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute_batch(SCHEMA)
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        let has_direction = {
            let mut stmt = conn
                .prepare("PRAGMA table_info(train_logs)")
                .map_err(|e| StorageError::Migration(e.to_string()))?;
            let mut found = false;
            let mut rows = stmt
                .query([])
                .map_err(|e| StorageError::Migration(e.to_string()))?;
            while let Some(row) = rows.next().map_err(|e| StorageError::Migration(e.to_string()))? {
                let name: String = row
                    .get(1)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                if name == "direction" {
                    found = true;
                    break;
                }
            }
            found
        };

        if !has_direction {
            conn.execute_batch("ALTER TABLE train_logs ADD COLUMN direction TEXT NOT NULL DEFAULT 'OUT'")
                .map_err(|e| StorageError::Migration(e.to_string()))?;
            tracing::info!("Added direction column to train_logs");
        }
        Ok(())
    }

    /// Appends one poll batch inside a single transaction. A failure on
    /// any row rolls back the whole batch. Returns the number of rows
    /// inserted.
    pub fn insert(&self, records: &[TrainRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO train_logs (log_time, train_id, status, delay_minutes, station, direction)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for rec in records {
                stmt.execute(rusqlite::params![
                    rec.observed_at.timestamp_millis(),
                    &rec.train_id,
                    &rec.status,
                    rec.delay_minutes,
                    &rec.station,
                    rec.direction.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(rows = records.len(), "Inserted poll batch");
        Ok(records.len())
    }

    /// All observations inside the trailing window, newest first.
    pub fn recent(&self, window: Duration) -> Result<Vec<TrainRecord>> {
        let cutoff = (Utc::now() - window).timestamp_millis();
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, log_time, train_id, status, delay_minutes, station, direction
             FROM train_logs WHERE log_time >= ?1
             ORDER BY log_time DESC",
        )?;
        let rows = stmt.query_map([cutoff], read_raw)?;
        collect_records(rows)
    }

    /// Observations for one train inside the trailing window, oldest
    /// first. Served by the `train_id` index.
    pub fn history(&self, train_id: &str, window: Duration) -> Result<Vec<TrainRecord>> {
        let cutoff = (Utc::now() - window).timestamp_millis();
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, log_time, train_id, status, delay_minutes, station, direction
             FROM train_logs WHERE train_id = ?1 AND log_time >= ?2
             ORDER BY log_time ASC",
        )?;
        let rows = stmt.query_map(rusqlite::params![train_id, cutoff], read_raw)?;
        collect_records(rows)
    }

    /// Deletes rows older than the cutoff. Returns the number removed.
    pub fn prune(&self, older_than: Duration) -> Result<usize> {
        let cutoff = (Utc::now() - older_than).timestamp_millis();
        let conn = self.lock_conn();
        let deleted = conn.execute("DELETE FROM train_logs WHERE log_time < ?1", [cutoff])?;
        if deleted > 0 {
            tracing::info!(rows = deleted, "Pruned stale observations");
        }
        Ok(deleted)
    }

    /// Total row count; used by health reporting and tests.
    pub fn count(&self) -> Result<i64> {
        let conn = self.lock_conn();
        let n = conn.query_row("SELECT COUNT(*) FROM train_logs", [], |row| row.get(0))?;
        Ok(n)
    }
}

struct RawRow {
    id: i64,
    log_time_ms: i64,
    train_id: String,
    status: String,
    delay_minutes: i64,
    station: String,
    direction: String,
}

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        log_time_ms: row.get(1)?,
        train_id: row.get(2)?,
        status: row.get(3)?,
        delay_minutes: row.get(4)?,
        station: row.get(5)?,
        direction: row.get(6)?,
    })
}

fn collect_records<I>(rows: I) -> Result<Vec<TrainRecord>>
where
    I: Iterator<Item = rusqlite::Result<RawRow>>,
{
    let mut out = Vec::new();
    for raw in rows {
        let raw = raw?;
        let observed_at = DateTime::<Utc>::from_timestamp_millis(raw.log_time_ms).ok_or(
            StorageError::InvalidTimestamp {
                row_id: raw.id,
                millis: raw.log_time_ms,
            },
        )?;
        let direction: Direction =
            raw.direction
                .parse()
                .map_err(|_| StorageError::InvalidDirection {
                    row_id: raw.id,
                    value: raw.direction.clone(),
                })?;
        out.push(TrainRecord {
            id: raw.id,
            observed_at,
            train_id: raw.train_id,
            direction,
            status: raw.status,
            delay_minutes: raw.delay_minutes,
            station: raw.station,
        });
    }
    Ok(out)
}
