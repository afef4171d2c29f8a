//! mf-remote - Remote collaborators for mlforge
//!
//! Defines the [`JobScheduler`] and [`ExperimentTracker`] seams the engine
//! talks to, plus REST implementations for the Databricks Jobs 2.1 API and
//! the MLflow tracking API.

pub mod error;
pub mod jobs;
pub mod mlflow;
mod rest;
pub mod traits;

pub use error::{RemoteError, RemoteResult};
pub use jobs::{job_run_url, DatabricksJobs};
pub use mlflow::MlflowTracker;
pub use traits::{
    ExperimentTracker, JobDefinition, JobScheduler, ModelVersion, RunRecord, JOB_ID_TAG,
    JOB_RUN_ID_TAG, REGISTERED_MODEL_NAME_TAG, REGISTERED_MODEL_VERSION_TAG,
};
