//! Databricks Jobs 2.1 scheduler.

use crate::error::RemoteResult;
use crate::rest::RestClient;
use crate::traits::{JobDefinition, JobScheduler};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task key of the single notebook task in every training job.
pub const TRAINING_TASK_KEY: &str = "TrainModel";

/// Link to a job run's page in the workspace UI.
pub fn job_run_url(host: &str, job_id: &str, job_run_id: &str) -> String {
    format!(
        "{}/jobs/{}/runs/{}",
        host.trim_end_matches('/'),
        job_id,
        job_run_id
    )
}

#[derive(Serialize)]
struct CreateJobRequest<'a> {
    name: &'a str,
    git_source: GitSource<'a>,
    tasks: [NotebookTask<'a>; 1],
}

#[derive(Serialize)]
struct GitSource<'a> {
    git_url: &'a str,
    git_provider: &'a str,
    git_branch: &'a str,
}

#[derive(Serialize)]
struct NotebookTask<'a> {
    task_key: &'static str,
    notebook_task: NotebookSpec<'a>,
}

#[derive(Serialize)]
struct NotebookSpec<'a> {
    notebook_path: &'a str,
    base_parameters: &'a BTreeMap<String, String>,
    source: &'static str,
}

#[derive(Deserialize)]
struct CreateJobResponse {
    job_id: i64,
}

#[derive(Serialize)]
struct RunNowRequest {
    job_id: i64,
}

#[derive(Deserialize)]
struct RunNowResponse {
    run_id: i64,
}

/// Job scheduler backed by a Databricks workspace.
pub struct DatabricksJobs {
    rest: RestClient,
}

impl DatabricksJobs {
    /// `base_url` includes the scheme; a trailing slash is ignored.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> RemoteResult<Self> {
        Ok(Self {
            rest: RestClient::new(base_url, token)?,
        })
    }

    pub fn run_page_url(&self, job_id: i64, run_id: i64) -> String {
        job_run_url(self.rest.base_url(), &job_id.to_string(), &run_id.to_string())
    }
}

#[async_trait]
impl JobScheduler for DatabricksJobs {
    async fn create_job(&self, job: &JobDefinition) -> RemoteResult<i64> {
        let request = CreateJobRequest {
            name: &job.name,
            git_source: GitSource {
                git_url: &job.git_url,
                git_provider: &job.git_provider,
                git_branch: &job.git_branch,
            },
            tasks: [NotebookTask {
                task_key: TRAINING_TASK_KEY,
                notebook_task: NotebookSpec {
                    notebook_path: &job.notebook_path,
                    base_parameters: &job.parameters,
                    source: "GIT",
                },
            }],
        };
        let response: CreateJobResponse = self.rest.post("/api/2.1/jobs/create", &request).await?;
        log::info!("Created job {} ({})", response.job_id, job.name);
        Ok(response.job_id)
    }

    async fn run_job(&self, job_id: i64) -> RemoteResult<i64> {
        let response: RunNowResponse = self
            .rest
            .post("/api/2.1/jobs/run-now", &RunNowRequest { job_id })
            .await?;
        log::info!(
            "Started run {} of job {}: {}",
            response.run_id,
            job_id,
            self.run_page_url(job_id, response.run_id)
        );
        Ok(response.run_id)
    }
}
