//! Training job lifecycle: one remote job per dataset, one run per call.

use crate::error::{OrchestrationError, OrchestrationResult};
use mf_core::sql_utils::sanitize_name;
use mf_core::{Dataset, GitConfig, Project};
use mf_meta::{MetaError, MetadataStore};
use mf_remote::{JobDefinition, JobScheduler};
use mf_split::SplitError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Notebook parameters set by the engine. Caller parameters with these
/// names are ignored.
pub const RESERVED_PARAMETERS: [&str; 4] = [
    "target",
    "training_table_name",
    "eval_table_name",
    "experiment_name",
];

/// A started training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunHandle {
    pub job_id: i64,
    pub run_id: i64,
    /// Whether this call created the remote job.
    pub created_job: bool,
    /// Partial-success notes, such as a job that exists remotely but is not
    /// recorded locally.
    pub warnings: Vec<String>,
}

/// How the freshly created job id ended up in the metadata store.
enum Persisted {
    Stored,
    /// Another caller recorded a job first; its id wins.
    Lost { winner: i64 },
}

/// Creates a training job per (project, dataset) on first use and reuses
/// it for every later run.
pub struct TrainingJobManager<'a> {
    store: &'a dyn MetadataStore,
    scheduler: &'a dyn JobScheduler,
    git: GitConfig,
}

impl<'a> TrainingJobManager<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        scheduler: &'a dyn JobScheduler,
        git: GitConfig,
    ) -> Self {
        Self {
            store,
            scheduler,
            git,
        }
    }

    /// Start a training run for `dataset`, creating its job if none is
    /// recorded yet.
    ///
    /// `user_parameters` is stored with the job record when the record is
    /// created; its scalar top-level entries become extra notebook
    /// parameters.
    pub async fn ensure_job_and_run(
        &self,
        project: &Project,
        dataset: &Dataset,
        user_parameters: &serde_json::Value,
    ) -> OrchestrationResult<RunHandle> {
        let existing = self.store.get_training_job(project.id, dataset.id)?;

        if let Some(job_id) = existing.as_ref().and_then(|record| record.job_id) {
            log::info!("Reusing job {job_id} for dataset {}", dataset.name());
            let run_id = self.run(job_id).await?;
            return Ok(RunHandle {
                job_id,
                run_id,
                created_job: false,
                warnings: Vec::new(),
            });
        }

        let definition = self.job_definition(project, dataset, user_parameters)?;
        let created = self
            .scheduler
            .create_job(&definition)
            .await
            .map_err(|source| OrchestrationError::Scheduler {
                job_id: None,
                source,
            })?;

        let mut warnings = Vec::new();
        let persisted = self.persist_job_id(
            existing.map(|r| r.id),
            project,
            dataset,
            created,
            user_parameters,
        );
        let job_id = match persisted {
            Ok(Persisted::Stored) => created,
            Ok(Persisted::Lost { winner }) => {
                let warning = format!(
                    "job {created} was created but job {winner} was already recorded for dataset {}; \
                     job {created} is orphaned",
                    dataset.name()
                );
                log::warn!("{warning}");
                warnings.push(warning);
                winner
            }
            Err(e) => {
                let warning =
                    format!("job {created} exists remotely but is not tracked locally: {e}");
                log::warn!("{warning}");
                warnings.push(warning);
                created
            }
        };

        let run_id = self.run(job_id).await?;
        Ok(RunHandle {
            job_id,
            run_id,
            created_job: job_id == created,
            warnings,
        })
    }

    async fn run(&self, job_id: i64) -> OrchestrationResult<i64> {
        self.scheduler
            .run_job(job_id)
            .await
            .map_err(|source| OrchestrationError::Scheduler {
                job_id: Some(job_id),
                source,
            })
    }

    fn job_definition(
        &self,
        project: &Project,
        dataset: &Dataset,
        user_parameters: &serde_json::Value,
    ) -> OrchestrationResult<JobDefinition> {
        let (training_table, eval_table) = dataset.materialized_tables().ok_or_else(|| {
            OrchestrationError::DatasetNotMaterialized {
                dataset: dataset.name().to_string(),
            }
        })?;
        if project.spec.git_url.trim().is_empty() {
            return Err(SplitError::MissingRequiredField { field: "git_url" }.into());
        }
        if project.spec.training_notebook.trim().is_empty() {
            return Err(SplitError::MissingRequiredField {
                field: "training_notebook",
            }
            .into());
        }

        let mut parameters = scalar_parameters(user_parameters);
        parameters.insert("target".to_string(), dataset.spec.target.clone());
        parameters.insert("training_table_name".to_string(), training_table.to_string());
        parameters.insert("eval_table_name".to_string(), eval_table.to_string());
        parameters.insert("experiment_name".to_string(), project.name().to_string());

        Ok(JobDefinition {
            name: format!(
                "{}_{}_training",
                sanitize_name(project.name()),
                sanitize_name(dataset.name())
            ),
            git_url: project.spec.git_url.trim().to_string(),
            git_provider: self.git.provider.clone(),
            git_branch: self.git.branch.clone(),
            notebook_path: project.notebook_path(),
            parameters,
        })
    }

    /// Record `job_id` on the (project, dataset) row, creating the row if
    /// needed. A concurrent writer that got there first wins.
    fn persist_job_id(
        &self,
        existing_training_id: Option<i64>,
        project: &Project,
        dataset: &Dataset,
        job_id: i64,
        user_parameters: &serde_json::Value,
    ) -> Result<Persisted, MetaError> {
        let training_id = match existing_training_id {
            Some(id) => id,
            None => match self
                .store
                .create_training_job_record(project.id, dataset.id, user_parameters)
            {
                Ok(record) => record.id,
                Err(MetaError::Conflict(_)) => self.reread(project, dataset)?.id,
                Err(e) => return Err(e),
            },
        };

        if self.store.update_training_job_id(training_id, job_id)? {
            log::info!("Recorded job {job_id} for dataset {}", dataset.name());
            return Ok(Persisted::Stored);
        }
        match self.reread(project, dataset)?.job_id {
            Some(winner) => Ok(Persisted::Lost { winner }),
            None => Err(MetaError::Conflict(format!(
                "training job {training_id} could not be updated"
            ))),
        }
    }

    fn reread(
        &self,
        project: &Project,
        dataset: &Dataset,
    ) -> Result<mf_core::TrainingJob, MetaError> {
        self.store
            .get_training_job(project.id, dataset.id)?
            .ok_or(MetaError::NotFound {
                entity: "training job",
                id: format!("{}/{}", project.id, dataset.id),
            })
    }
}

/// Scalar top-level entries of the caller's parameters as notebook strings.
/// Reserved names, nulls, arrays and objects are skipped.
fn scalar_parameters(user_parameters: &serde_json::Value) -> BTreeMap<String, String> {
    let Some(object) = user_parameters.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter(|(key, _)| !RESERVED_PARAMETERS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    log::debug!("Skipping non-scalar parameter {key}");
                    return None;
                }
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

#[cfg(test)]
#[path = "training_test.rs"]
mod tests;
