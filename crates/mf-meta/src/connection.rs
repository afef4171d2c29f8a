//! Metadata database handle.

use crate::error::{MetaError, MetaResult};
use crate::migration::run_migrations;
use duckdb::Connection;
use std::path::Path;

/// Run `body` between `BEGIN` and `COMMIT`; any error rolls the whole body
/// back.
pub(crate) fn in_transaction<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> MetaResult<T>,
) -> MetaResult<T> {
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| MetaError::TransactionError(format!("BEGIN failed: {e}")))?;

    let outcome = body(conn).and_then(|value| {
        conn.execute_batch("COMMIT")
            .map(|()| value)
            .map_err(|e| MetaError::TransactionError(format!("COMMIT failed: {e}")))
    });
    if outcome.is_err() {
        if let Err(e) = conn.execute_batch("ROLLBACK") {
            log::warn!("Metadata rollback failed: {e}");
        }
    }
    outcome
}

/// The metadata database: projects, datasets and training job records.
///
/// Opening runs any pending migrations. One caller at a time.
pub struct MetaDb {
    conn: Connection,
}

impl MetaDb {
    /// Open or create the database file at `path`, creating missing parent
    /// directories.
    pub fn open(path: &Path) -> MetaResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MetaError::ConnectionError(format!("creating {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| MetaError::ConnectionError(format!("{}: {e}", path.display())))?;
        Self::migrated(conn)
    }

    /// A throwaway in-memory database.
    pub fn open_memory() -> MetaResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| MetaError::ConnectionError(e.to_string()))?;
        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> MetaResult<Self> {
        let applied = run_migrations(&conn)?;
        if applied > 0 {
            log::info!("Applied {applied} metadata migration(s)");
        }
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run several store calls atomically.
    pub fn transaction<T>(
        &self,
        body: impl FnOnce(&Connection) -> MetaResult<T>,
    ) -> MetaResult<T> {
        in_transaction(&self.conn, body)
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
