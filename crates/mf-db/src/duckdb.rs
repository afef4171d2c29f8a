//! DuckDB warehouse backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Warehouse, WarehouseConnection};
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::Mutex;

/// In-process DuckDB warehouse.
///
/// The database instance is opened once; every [`connect`](Warehouse::connect)
/// hands out a fresh connection to the same instance, so tables created in
/// one materialization are visible to the next.
pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
}

impl DuckDbWarehouse {
    /// Create a new in-memory DuckDB database
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) a DuckDB database file.
    ///
    /// The file stem becomes the database's catalog name, so `cat.duckdb`
    /// serves tables as `cat.<schema>.<table>`.
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", e, path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute setup SQL (several statements) directly on the instance
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Count the rows a query returns
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        Ok(count as usize)
    }

    /// Check whether a `catalog.schema.table` (or shorter) relation exists
    pub fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let parts: Vec<&str> = name.split('.').collect();
        let (catalog, schema, table) = match parts.as_slice() {
            [table] => (None, "main", *table),
            [schema, table] => (None, *schema, *table),
            [catalog, schema, table] => (Some(*catalog), *schema, *table),
            _ => return Ok(false),
        };

        let count: i64 = match catalog {
            Some(catalog) => conn.query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_catalog = ? AND table_schema = ? AND table_name = ?",
                duckdb::params![catalog, schema, table],
                |row| row.get(0),
            ),
            None => conn.query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = ? AND table_name = ?",
                duckdb::params![schema, table],
                |row| row.get(0),
            ),
        }
        .map_err(|e| DbError::ExecutionError(e.to_string()))?;

        Ok(count > 0)
    }
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn connect(&self) -> DbResult<Box<dyn WarehouseConnection>> {
        let conn = self
            .lock()?
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Box::new(DuckDbConnection { conn }))
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// One connection handed out by [`DuckDbWarehouse`]
pub struct DuckDbConnection {
    conn: Connection,
}

#[async_trait]
impl WarehouseConnection for DuckDbConnection {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::ConnectionError(format!("close failed: {e}")))
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
