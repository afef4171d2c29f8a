//! Metadata store for mlforge.
//!
//! Provides a DuckDB-backed store for projects, datasets and training job
//! records. It is the only state shared between engine calls; every
//! operation reads and writes it fresh.

pub mod connection;
pub mod error;
pub mod migration;
pub mod store;

pub use connection::MetaDb;
pub use error::{MetaError, MetaResult};
pub use store::datasets::DatasetListing;
pub use store::MetadataStore;
