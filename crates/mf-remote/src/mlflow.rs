//! MLflow tracking REST client.

use crate::error::{RemoteError, RemoteResult};
use crate::rest::RestClient;
use crate::traits::{
    ExperimentTracker, ModelVersion, RunRecord, REGISTERED_MODEL_NAME_TAG,
    REGISTERED_MODEL_VERSION_TAG,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upper bound on runs fetched per experiment.
const MAX_RUNS: u32 = 1000;

#[derive(Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Serialize)]
struct SearchRunsRequest<'a> {
    experiment_ids: [&'a str; 1],
    max_results: u32,
    order_by: [&'static str; 1],
}

#[derive(Deserialize)]
struct SearchRunsResponse {
    #[serde(default)]
    runs: Vec<Run>,
}

#[derive(Deserialize)]
struct Run {
    info: RunInfo,
    #[serde(default)]
    data: RunData,
}

#[derive(Deserialize)]
struct RunInfo {
    run_id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_time: Option<i64>,
    #[serde(default)]
    artifact_uri: Option<String>,
}

#[derive(Deserialize, Default)]
struct RunData {
    #[serde(default)]
    metrics: Vec<Metric>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct Metric {
    key: String,
    value: f64,
}

#[derive(Deserialize)]
struct Tag {
    key: String,
    value: String,
}

#[derive(Serialize)]
struct CreateRegisteredModelRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CreateModelVersionRequest<'a> {
    name: &'a str,
    source: &'a str,
    run_id: &'a str,
}

#[derive(Deserialize)]
struct CreateModelVersionResponse {
    model_version: RemoteModelVersion,
}

#[derive(Deserialize)]
struct RemoteModelVersion {
    name: String,
    version: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

#[derive(Serialize)]
struct SetTagRequest<'a> {
    run_id: &'a str,
    key: &'a str,
    value: &'a str,
}

impl From<Run> for RunRecord {
    fn from(run: Run) -> Self {
        let tags: std::collections::BTreeMap<String, String> = run
            .data
            .tags
            .into_iter()
            .map(|t| (t.key, t.value))
            .collect();
        RunRecord {
            run_id: run.info.run_id,
            status: run.info.status,
            start_time: run.info.start_time,
            artifact_uri: run.info.artifact_uri,
            registered_model_name: tags.get(REGISTERED_MODEL_NAME_TAG).cloned(),
            registered_model_version: tags.get(REGISTERED_MODEL_VERSION_TAG).cloned(),
            metrics: run
                .data
                .metrics
                .into_iter()
                .map(|m| (m.key, m.value))
                .collect(),
            tags,
        }
    }
}

/// Experiment tracker backed by an MLflow tracking server.
pub struct MlflowTracker {
    rest: RestClient,
}

impl MlflowTracker {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> RemoteResult<Self> {
        Ok(Self {
            rest: RestClient::new(base_url, token)?,
        })
    }

    async fn ensure_registered_model(&self, model_name: &str) -> RemoteResult<()> {
        let created: RemoteResult<serde_json::Value> = self
            .rest
            .post(
                "/api/2.0/mlflow/registered-models/create",
                &CreateRegisteredModelRequest { name: model_name },
            )
            .await;
        match created {
            Ok(_) => {
                log::info!("Created registered model {model_name}");
                Ok(())
            }
            Err(e) if e.error_code() == Some("RESOURCE_ALREADY_EXISTS") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn set_tag(&self, run_id: &str, key: &str, value: &str) {
        let result: RemoteResult<serde_json::Value> = self
            .rest
            .post(
                "/api/2.0/mlflow/runs/set-tag",
                &SetTagRequest { run_id, key, value },
            )
            .await;
        if let Err(e) = result {
            log::warn!("Could not tag run {run_id} with {key}: {e}");
        }
    }
}

#[async_trait]
impl ExperimentTracker for MlflowTracker {
    async fn get_experiment_by_name(&self, name: &str) -> RemoteResult<String> {
        let result: RemoteResult<GetExperimentResponse> = self
            .rest
            .get(
                "/api/2.0/mlflow/experiments/get-by-name",
                &[("experiment_name", name)],
            )
            .await;
        match result {
            Ok(response) => Ok(response.experiment.experiment_id),
            Err(RemoteError::Api {
                status, error_code, ..
            }) if status == 404 || error_code.as_deref() == Some("RESOURCE_DOES_NOT_EXIST") => {
                Err(RemoteError::NotFound(format!("experiment '{name}'")))
            }
            Err(e) => Err(e),
        }
    }

    async fn list_runs(&self, experiment_id: &str) -> RemoteResult<Vec<RunRecord>> {
        let response: SearchRunsResponse = self
            .rest
            .post(
                "/api/2.0/mlflow/runs/search",
                &SearchRunsRequest {
                    experiment_ids: [experiment_id],
                    max_results: MAX_RUNS,
                    order_by: ["attributes.start_time DESC"],
                },
            )
            .await?;
        log::debug!(
            "Experiment {experiment_id} has {} runs",
            response.runs.len()
        );
        Ok(response.runs.into_iter().map(RunRecord::from).collect())
    }

    async fn register_model_version(
        &self,
        model_name: &str,
        source_uri: &str,
        run_id: &str,
    ) -> RemoteResult<ModelVersion> {
        self.ensure_registered_model(model_name).await?;
        let response: CreateModelVersionResponse = self
            .rest
            .post(
                "/api/2.0/mlflow/model-versions/create",
                &CreateModelVersionRequest {
                    name: model_name,
                    source: source_uri,
                    run_id,
                },
            )
            .await?;
        let version = response.model_version;
        log::info!(
            "Registered {} version {} from run {run_id}",
            version.name,
            version.version
        );

        self.set_tag(run_id, REGISTERED_MODEL_NAME_TAG, &version.name)
            .await;
        self.set_tag(run_id, REGISTERED_MODEL_VERSION_TAG, &version.version)
            .await;

        Ok(ModelVersion {
            name: version.name,
            version: version.version,
            status: version.status,
            status_message: version.status_message,
        })
    }
}

#[cfg(test)]
#[path = "mlflow_test.rs"]
mod tests;
