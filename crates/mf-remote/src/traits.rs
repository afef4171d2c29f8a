//! Scheduler and tracker seams.

use crate::error::RemoteResult;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Run tag carrying the scheduler job id.
pub const JOB_ID_TAG: &str = "mlflow.databricks.jobID";
/// Run tag carrying the scheduler job run id.
pub const JOB_RUN_ID_TAG: &str = "mlflow.databricks.jobRunID";
/// Run tags recording a completed model registration.
pub const REGISTERED_MODEL_NAME_TAG: &str = "mlforge.registered_model_name";
pub const REGISTERED_MODEL_VERSION_TAG: &str = "mlforge.registered_model_version";

/// A git-sourced notebook job with fixed parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDefinition {
    pub name: String,
    pub git_url: String,
    pub git_provider: String,
    pub git_branch: String,
    /// Path inside the repository, without a `.py` suffix.
    pub notebook_path: String,
    pub parameters: BTreeMap<String, String>,
}

/// Creates and runs remote jobs.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Create a job and return its id.
    async fn create_job(&self, job: &JobDefinition) -> RemoteResult<i64>;

    /// Start a new run of an existing job and return the run id.
    async fn run_job(&self, job_id: i64) -> RemoteResult<i64>;
}

/// One experiment run as reported by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub status: Option<String>,
    /// Milliseconds since the epoch.
    pub start_time: Option<i64>,
    pub artifact_uri: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub registered_model_name: Option<String>,
    pub registered_model_version: Option<String>,
}

impl RunRecord {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// A registered model version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: String,
    pub status: Option<String>,
    pub status_message: Option<String>,
}

/// Reads experiment runs and registers models.
#[async_trait]
pub trait ExperimentTracker: Send + Sync {
    /// Resolve an experiment name to its id. A missing experiment is
    /// [`crate::RemoteError::NotFound`].
    async fn get_experiment_by_name(&self, name: &str) -> RemoteResult<String>;

    /// Runs of an experiment, most recent first.
    async fn list_runs(&self, experiment_id: &str) -> RemoteResult<Vec<RunRecord>>;

    /// Register `source_uri` as a new version of `model_name`, creating the
    /// model if needed, and record the registration on `run_id`.
    async fn register_model_version(
        &self,
        model_name: &str,
        source_uri: &str,
        run_id: &str,
    ) -> RemoteResult<ModelVersion>;
}
