//! Experiment runs joined back to local datasets, and model registration.

use crate::error::{OrchestrationError, OrchestrationResult};
use mf_core::sql_utils::{is_plain_identifier, sanitize_name};
use mf_core::{Project, TrackingConfig};
use mf_meta::MetadataStore;
use mf_remote::{
    job_run_url, ExperimentTracker, ModelVersion, RemoteError, RunRecord, JOB_ID_TAG,
    JOB_RUN_ID_TAG,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label for a run whose job id matches no training job record.
pub const JOB_ID_NOT_IN_DB: &str = "Job ID Not Found in DB";
/// Label for a run whose training job points at a deleted dataset.
pub const DATASET_NOT_FOUND: &str = "Dataset Not Found";
/// Label for a run that was not started by a scheduler job.
pub const JOB_ID_TAG_MISSING: &str = "Job ID Tag Missing";

const SENTINEL_LABELS: [&str; 3] = [JOB_ID_NOT_IN_DB, DATASET_NOT_FOUND, JOB_ID_TAG_MISSING];

/// A run as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunView {
    pub run_id: String,
    /// Dataset name, or one of the sentinel labels when it cannot be resolved.
    pub dataset_label: String,
    pub job_id: Option<String>,
    pub job_run_id: Option<String>,
    /// Scheduler run page, when both job tags and the workspace host are known.
    pub run_url: Option<String>,
    pub metrics: BTreeMap<String, f64>,
    pub status: Option<String>,
    pub start_time: Option<i64>,
    pub registered_model_name: Option<String>,
    pub registered_model_version: Option<String>,
}

impl RunView {
    /// Whether the label names a real dataset.
    pub fn has_dataset(&self) -> bool {
        !is_sentinel(&self.dataset_label)
    }
}

fn is_sentinel(label: &str) -> bool {
    SENTINEL_LABELS.contains(&label)
}

/// Lists a project's experiment runs and registers models from them.
pub struct RunResolver<'a> {
    store: &'a dyn MetadataStore,
    tracker: &'a dyn ExperimentTracker,
    tracking: TrackingConfig,
    workspace_url: Option<String>,
}

impl<'a> RunResolver<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        tracker: &'a dyn ExperimentTracker,
        tracking: TrackingConfig,
        workspace_url: Option<String>,
    ) -> Self {
        Self {
            store,
            tracker,
            tracking,
            workspace_url,
        }
    }

    /// Runs of the project's experiment in tracker order.
    ///
    /// A project whose experiment does not exist yet has no runs. Label
    /// lookups never fail the listing; unresolvable runs get a sentinel
    /// label instead.
    pub async fn list_runs_for_project(
        &self,
        project: &Project,
    ) -> OrchestrationResult<Vec<RunView>> {
        let experiment = self.tracking.experiment_path(project.name());
        let experiment_id = match self.tracker.get_experiment_by_name(&experiment).await {
            Ok(id) => id,
            Err(RemoteError::NotFound(_)) => {
                log::info!("Experiment {experiment} not found; project has no runs yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(OrchestrationError::TrackerLookup {
                    what: format!("experiment '{experiment}'"),
                    source,
                })
            }
        };
        let runs = self
            .tracker
            .list_runs(&experiment_id)
            .await
            .map_err(|source| OrchestrationError::TrackerLookup {
                what: format!("runs of experiment {experiment_id}"),
                source,
            })?;
        log::debug!("Experiment {experiment} has {} runs", runs.len());

        Ok(runs.into_iter().map(|run| self.view(run)).collect())
    }

    fn view(&self, run: RunRecord) -> RunView {
        let job_id = run.tag(JOB_ID_TAG).map(str::to_string);
        let job_run_id = run.tag(JOB_RUN_ID_TAG).map(str::to_string);
        let run_url = match (&self.workspace_url, &job_id, &job_run_id) {
            (Some(host), Some(job), Some(job_run)) => Some(job_run_url(host, job, job_run)),
            _ => None,
        };
        let dataset_label = match job_id.as_deref() {
            Some(job) => self.dataset_label(job),
            None => JOB_ID_TAG_MISSING.to_string(),
        };

        RunView {
            run_id: run.run_id,
            dataset_label,
            job_id,
            job_run_id,
            run_url,
            metrics: run.metrics,
            status: run.status,
            start_time: run.start_time,
            registered_model_name: run.registered_model_name,
            registered_model_version: run.registered_model_version,
        }
    }

    fn dataset_label(&self, job_tag: &str) -> String {
        let Ok(job_id) = job_tag.trim().parse::<i64>() else {
            log::debug!("Job id tag '{job_tag}' is not numeric");
            return JOB_ID_NOT_IN_DB.to_string();
        };
        let record = match self.store.get_training_job_by_job_id(job_id) {
            Ok(Some(record)) => record,
            Ok(None) => return JOB_ID_NOT_IN_DB.to_string(),
            Err(e) => {
                log::warn!("Training job lookup for job {job_id} failed: {e}");
                return JOB_ID_NOT_IN_DB.to_string();
            }
        };
        match self.store.dataset_name_by_id(record.dataset_id) {
            Ok(Some(name)) => name,
            Ok(None) => DATASET_NOT_FOUND.to_string(),
            Err(e) => {
                log::warn!("Dataset lookup for {} failed: {e}", record.dataset_id);
                DATASET_NOT_FOUND.to_string()
            }
        }
    }

    /// Register the model logged by `run_id` as
    /// `{catalog}.{schema}.{dataset_label}`.
    ///
    /// The source defaults to `runs:/{run_id}/model`. Sentinel labels are
    /// rejected before anything is sent to the tracker.
    pub async fn register_model(
        &self,
        run_id: &str,
        dataset_label: &str,
        model_source_uri: Option<&str>,
        project: &Project,
    ) -> OrchestrationResult<ModelVersion> {
        let reject = |reason: String| OrchestrationError::RegistrationRejected {
            run_id: run_id.to_string(),
            reason,
        };
        let label = dataset_label.trim();
        if is_sentinel(label) {
            return Err(reject(format!("dataset label is '{label}'")));
        }
        if label.is_empty() {
            return Err(reject("dataset label is empty".to_string()));
        }
        if !project.has_namespace() {
            return Err(reject(format!(
                "project '{}' has no catalog and schema",
                project.name()
            )));
        }

        let model = sanitize_name(label);
        if !is_plain_identifier(&model) {
            return Err(reject(format!(
                "dataset label '{label}' is not a valid model name"
            )));
        }

        let model_name = format!(
            "{}.{}.{model}",
            project.spec.catalog.trim(),
            project.spec.schema.trim(),
        );
        let source = model_source_uri
            .map(str::to_string)
            .unwrap_or_else(|| format!("runs:/{run_id}/model"));
        log::info!("Registering {source} as {model_name}");

        let version = self
            .tracker
            .register_model_version(&model_name, &source, run_id)
            .await
            .map_err(|source| OrchestrationError::Registration {
                model_name: model_name.clone(),
                source,
            })?;
        log::info!(
            "Registered {} version {} ({})",
            version.name,
            version.version,
            version.status.as_deref().unwrap_or("unknown status")
        );
        Ok(version)
    }
}

#[cfg(test)]
#[path = "runs_test.rs"]
mod tests;
