//! SQLite-backed store for the inventory core.
//!
//! The database lives at `~/.inventrack/inventrack.db`. The handle is
//! explicitly constructed and passed into the synchronizer and the report
//! builder; there is no process-wide client singleton. Per-statement
//! atomicity is the only ordering guarantee across tables — the
//! flag-plus-synchronize sequence is deliberately not wrapped in a
//! cross-table transaction (callers retry on failure instead).

use std::path::PathBuf;

use rusqlite::Connection;

pub mod types;
pub use types::*;

pub mod criticals;
pub mod equipment;
pub mod lookups;
pub mod maintenance;

pub struct InventoryDb {
    conn: Connection,
}

impl InventoryDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `~/.inventrack/inventrack.db` and
    /// apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        // Wait out short lock contention from a concurrent writer instead of
        // surfacing SQLITE_BUSY immediately.
        conn.busy_timeout(std::time::Duration::from_millis(500))?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.inventrack/inventrack.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".inventrack").join("inventrack.db"))
    }
}

// =============================================================================
// Shared test utilities
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
