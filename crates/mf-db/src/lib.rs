//! mf-db - Warehouse abstraction layer for mlforge
//!
//! This crate provides the `Warehouse` / `WarehouseConnection` traits and
//! implementations for an in-process DuckDB database and a Databricks SQL
//! warehouse reached through the statement execution API.

pub mod databricks;
pub mod duckdb;
pub mod error;
pub mod traits;

pub use databricks::DatabricksSqlWarehouse;
pub use self::duckdb::DuckDbWarehouse;
pub use error::{DbError, DbResult};
pub use traits::{Warehouse, WarehouseConnection};
