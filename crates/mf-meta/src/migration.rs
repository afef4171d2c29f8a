//! Versioned schema migrations for the metadata database.
//!
//! Migrations are numbered SQL files under `ddl/`, embedded at compile time.
//! Applied versions are recorded in `mf_meta.schema_version`; each migration
//! and its version row commit together.

use crate::connection::in_transaction;
use crate::error::{MetaError, MetaResult};
use duckdb::Connection;

/// One embedded DDL migration.
pub struct Migration {
    pub version: i32,
    pub sql: &'static str,
}

/// Every migration, ascending by version.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("ddl/v001_initial.sql"),
}];

const VERSION_TABLE: &str = "CREATE SCHEMA IF NOT EXISTS mf_meta;
CREATE TABLE IF NOT EXISTS mf_meta.schema_version (
    version    INTEGER NOT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT now()
);";

/// Highest applied version, 0 on a fresh database.
pub fn schema_version(conn: &Connection) -> MetaResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM mf_meta.schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| MetaError::MigrationError(format!("reading schema version: {e}")))
}

/// Bring the database up to the latest version. Returns how many
/// migrations were applied.
pub fn run_migrations(conn: &Connection) -> MetaResult<usize> {
    conn.execute_batch(VERSION_TABLE)
        .map_err(|e| MetaError::MigrationError(format!("creating version table: {e}")))?;

    let current = schema_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    for migration in &pending {
        log::debug!("Applying metadata migration v{:03}", migration.version);
        in_transaction(conn, |conn| {
            conn.execute_batch(migration.sql).map_err(|e| {
                MetaError::MigrationError(format!("v{:03}: {e}", migration.version))
            })?;
            conn.execute(
                "INSERT INTO mf_meta.schema_version (version) VALUES (?)",
                duckdb::params![migration.version],
            )
            .map_err(|e| {
                MetaError::MigrationError(format!("recording v{:03}: {e}", migration.version))
            })?;
            Ok(())
        })?;
    }
    Ok(pending.len())
}
