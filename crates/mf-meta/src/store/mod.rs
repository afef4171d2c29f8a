//! Record access for projects, datasets and training jobs.
//!
//! Each submodule exposes free functions over a borrowed [`duckdb::Connection`] so
//! callers can compose them inside [`MetaDb::transaction`]. The
//! [`MetadataStore`] trait narrows that surface to what orchestration needs.

use crate::connection::MetaDb;
use crate::error::MetaResult;
use mf_core::{Dataset, Project, TrainingJob};

pub mod datasets;
pub mod projects;
pub mod training_jobs;

/// The metadata operations orchestration depends on.
pub trait MetadataStore {
    fn get_project(&self, project_id: i64) -> MetaResult<Option<Project>>;

    fn get_dataset(&self, dataset_id: i64) -> MetaResult<Option<Dataset>>;

    /// Record the materialized table pair and set the flag.
    fn mark_materialized(
        &self,
        dataset_id: i64,
        training_table: &str,
        eval_table: &str,
    ) -> MetaResult<()>;

    fn get_training_job(&self, project_id: i64, dataset_id: i64)
        -> MetaResult<Option<TrainingJob>>;

    /// Insert the (project, dataset) row; a second insert for the same pair
    /// is a [`crate::MetaError::Conflict`].
    fn create_training_job_record(
        &self,
        project_id: i64,
        dataset_id: i64,
        parameters: &serde_json::Value,
    ) -> MetaResult<TrainingJob>;

    /// Set the remote job id only if none is stored yet. Returns whether
    /// this call won.
    fn update_training_job_id(&self, training_id: i64, job_id: i64) -> MetaResult<bool>;

    fn get_training_job_by_job_id(&self, job_id: i64) -> MetaResult<Option<TrainingJob>>;

    fn dataset_name_by_id(&self, dataset_id: i64) -> MetaResult<Option<String>>;
}

impl MetadataStore for MetaDb {
    fn get_project(&self, project_id: i64) -> MetaResult<Option<Project>> {
        projects::get_project(self.conn(), project_id)
    }

    fn get_dataset(&self, dataset_id: i64) -> MetaResult<Option<Dataset>> {
        datasets::get_dataset(self.conn(), dataset_id)
    }

    fn mark_materialized(
        &self,
        dataset_id: i64,
        training_table: &str,
        eval_table: &str,
    ) -> MetaResult<()> {
        datasets::mark_materialized(self.conn(), dataset_id, training_table, eval_table)
    }

    fn get_training_job(
        &self,
        project_id: i64,
        dataset_id: i64,
    ) -> MetaResult<Option<TrainingJob>> {
        training_jobs::get_training_job(self.conn(), project_id, dataset_id)
    }

    fn create_training_job_record(
        &self,
        project_id: i64,
        dataset_id: i64,
        parameters: &serde_json::Value,
    ) -> MetaResult<TrainingJob> {
        training_jobs::create_training_job_record(self.conn(), project_id, dataset_id, parameters)
    }

    fn update_training_job_id(&self, training_id: i64, job_id: i64) -> MetaResult<bool> {
        training_jobs::update_training_job_id(self.conn(), training_id, job_id)
    }

    fn get_training_job_by_job_id(&self, job_id: i64) -> MetaResult<Option<TrainingJob>> {
        training_jobs::get_training_job_by_job_id(self.conn(), job_id)
    }

    fn dataset_name_by_id(&self, dataset_id: i64) -> MetaResult<Option<String>> {
        datasets::dataset_name_by_id(self.conn(), dataset_id)
    }
}
