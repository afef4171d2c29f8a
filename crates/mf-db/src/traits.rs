//! Warehouse trait definitions

use crate::error::DbResult;
use async_trait::async_trait;

/// A SQL warehouse that datasets are materialized into.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Open a connection scoped to one materialization attempt
    async fn connect(&self) -> DbResult<Box<dyn WarehouseConnection>>;

    /// Warehouse type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// A live warehouse connection.
///
/// Callers release it with [`close`](WarehouseConnection::close) whether or
/// not their statements succeeded.
#[async_trait]
pub trait WarehouseConnection: Send {
    /// Execute one SQL statement to completion
    async fn execute(&mut self, sql: &str) -> DbResult<()>;

    /// Release the connection
    async fn close(self: Box<Self>) -> DbResult<()>;
}
