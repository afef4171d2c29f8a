//! mf-engine - Dataset materialization and training orchestration
//!
//! Sequences the split validator and generator, the warehouse, the
//! metadata store, the job scheduler and the experiment tracker. Every
//! operation reads the metadata store fresh; the engine keeps no state
//! between calls.

pub mod error;
pub mod materialize;
pub mod runs;
pub mod training;

pub use error::{OrchestrationError, OrchestrationResult};
pub use materialize::{current_nonce, Materialization, Materializer};
pub use runs::{RunResolver, RunView, DATASET_NOT_FOUND, JOB_ID_NOT_IN_DB, JOB_ID_TAG_MISSING};
pub use training::{RunHandle, TrainingJobManager, RESERVED_PARAMETERS};
