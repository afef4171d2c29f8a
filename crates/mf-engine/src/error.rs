//! Error types for mf-engine

use mf_db::DbError;
use mf_meta::MetaError;
use mf_remote::RemoteError;
use mf_split::SplitError;
use thiserror::Error;

/// Orchestration errors.
///
/// Every variant raised after a remote side effect names the remote objects
/// involved so the operation can be finished by hand.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// The dataset definition is invalid; nothing was sent anywhere (O001)
    #[error("[O001] {0}")]
    Validation(#[from] SplitError),

    /// Could not open a warehouse connection (O002)
    #[error("[O002] Warehouse unavailable: {0}")]
    WarehouseUnavailable(#[source] DbError),

    /// A materialization statement failed (O003)
    #[error("[O003] Statement {statement_index} failed: {source}\n  SQL: {sql}")]
    WarehouseExecution {
        statement_index: usize,
        sql: String,
        #[source]
        source: DbError,
    },

    /// Job creation was requested before the training table exists (O004)
    #[error("[O004] Dataset '{dataset}' has not been materialized yet")]
    DatasetNotMaterialized { dataset: String },

    /// The job scheduler rejected a create or run call (O005)
    #[error("[O005] Job scheduler call failed{}: {source}", .job_id.map(|id| format!(" for job {id}")).unwrap_or_default())]
    Scheduler {
        job_id: Option<i64>,
        #[source]
        source: RemoteError,
    },

    /// A metadata write failed after the remote side already changed (O006)
    #[error("[O006] {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: MetaError,
    },

    /// Experiment lookup or run listing failed (O007)
    #[error("[O007] Tracker lookup failed for {what}: {source}")]
    TrackerLookup {
        what: String,
        #[source]
        source: RemoteError,
    },

    /// The dataset label cannot be turned into a model name (O008)
    #[error("[O008] Cannot register model from run {run_id}: {reason}")]
    RegistrationRejected { run_id: String, reason: String },

    /// Registering the model version failed (O009)
    #[error("[O009] Model registration of {model_name} failed: {source}")]
    Registration {
        model_name: String,
        #[source]
        source: RemoteError,
    },

    /// Project id not in the metadata store (O010)
    #[error("[O010] Project {0} not found")]
    ProjectNotFound(i64),

    /// Dataset id not in the metadata store (O011)
    #[error("[O011] Dataset {0} not found")]
    DatasetNotFound(i64),

    /// A metadata read failed (O012)
    #[error("[O012] {0}")]
    Metadata(#[from] MetaError),
}

/// Result type alias for OrchestrationError
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
