//! Training job records: one row per (project, dataset), holding the remote
//! job id once it exists.

use crate::error::{MetaError, MetaResult, MetaResultExt};
use chrono::{DateTime, Utc};
use duckdb::{Connection, OptionalExt};
use mf_core::TrainingJob;

const TRAINING_JOB_COLUMNS: &str = "t.training_id, t.project_id, t.dataset_id, t.job_id, \
     t.parameters, CAST(epoch_ms(t.updated_at) AS BIGINT)";

struct TrainingJobRow {
    id: i64,
    project_id: i64,
    dataset_id: i64,
    job_id: Option<i64>,
    parameters: String,
    updated_at_ms: i64,
}

fn training_job_row(row: &duckdb::Row<'_>) -> duckdb::Result<TrainingJobRow> {
    Ok(TrainingJobRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        dataset_id: row.get(2)?,
        job_id: row.get(3)?,
        parameters: row.get(4)?,
        updated_at_ms: row.get(5)?,
    })
}

impl TrainingJobRow {
    fn decode(self) -> MetaResult<TrainingJob> {
        let parameters = serde_json::from_str(&self.parameters).map_err(|e| MetaError::Decode {
            column: "parameters",
            message: e.to_string(),
        })?;
        let updated_at =
            DateTime::<Utc>::from_timestamp_millis(self.updated_at_ms).ok_or(MetaError::Decode {
                column: "updated_at",
                message: format!("{} ms is out of range", self.updated_at_ms),
            })?;
        Ok(TrainingJob {
            id: self.id,
            project_id: self.project_id,
            dataset_id: self.dataset_id,
            job_id: self.job_id,
            parameters,
            updated_at,
        })
    }
}

pub fn get_training_job(
    conn: &Connection,
    project_id: i64,
    dataset_id: i64,
) -> MetaResult<Option<TrainingJob>> {
    conn.query_row(
        &format!(
            "SELECT {TRAINING_JOB_COLUMNS} FROM mf_meta.training_jobs t
             WHERE t.project_id = ? AND t.dataset_id = ?"
        ),
        duckdb::params![project_id, dataset_id],
        training_job_row,
    )
    .optional()
    .query_context("select training job")?
    .map(TrainingJobRow::decode)
    .transpose()
}

/// Insert the row for a (project, dataset) pair.
///
/// Fails with [`MetaError::Conflict`] when the pair already has a row.
pub fn create_training_job_record(
    conn: &Connection,
    project_id: i64,
    dataset_id: i64,
    parameters: &serde_json::Value,
) -> MetaResult<TrainingJob> {
    let parameters_json = serde_json::to_string(parameters)
        .map_err(|e| MetaError::QueryError(format!("encode parameters: {e}")))?;
    let training_id: i64 = conn
        .query_row(
            "INSERT INTO mf_meta.training_jobs (project_id, dataset_id, parameters)
             VALUES (?, ?, ?)
             RETURNING training_id",
            duckdb::params![project_id, dataset_id, parameters_json],
            |row| row.get(0),
        )
        .query_context("insert training_jobs")?;

    get_training_job(conn, project_id, dataset_id)?.ok_or(MetaError::NotFound {
        entity: "training job",
        id: training_id.to_string(),
    })
}

/// Set the remote job id on a row that does not have one yet.
///
/// Returns `false` when the row already carried a job id (it is left
/// untouched), `true` when this call set it.
pub fn update_training_job_id(conn: &Connection, training_id: i64, job_id: i64) -> MetaResult<bool> {
    let updated = conn
        .execute(
            "UPDATE mf_meta.training_jobs SET job_id = ?, updated_at = now()
             WHERE training_id = ? AND job_id IS NULL",
            duckdb::params![job_id, training_id],
        )
        .query_context("update training job id")?;
    if updated > 0 {
        return Ok(true);
    }

    let exists: Option<i64> = conn
        .query_row(
            "SELECT training_id FROM mf_meta.training_jobs WHERE training_id = ?",
            duckdb::params![training_id],
            |row| row.get(0),
        )
        .optional()
        .query_context("select training job")?;
    match exists {
        Some(_) => Ok(false),
        None => Err(MetaError::NotFound {
            entity: "training job",
            id: training_id.to_string(),
        }),
    }
}

pub fn get_training_job_by_job_id(conn: &Connection, job_id: i64) -> MetaResult<Option<TrainingJob>> {
    conn.query_row(
        &format!("SELECT {TRAINING_JOB_COLUMNS} FROM mf_meta.training_jobs t WHERE t.job_id = ? LIMIT 1"),
        duckdb::params![job_id],
        training_job_row,
    )
    .optional()
    .query_context("select training job by job id")?
    .map(TrainingJobRow::decode)
    .transpose()
}

/// Name of the dataset trained by remote job `job_id`.
pub fn dataset_name_by_job_id(conn: &Connection, job_id: i64) -> MetaResult<Option<String>> {
    conn.query_row(
        "SELECT d.name
         FROM mf_meta.training_jobs t
         JOIN mf_meta.datasets d ON d.dataset_id = t.dataset_id
         WHERE t.job_id = ?
         LIMIT 1",
        duckdb::params![job_id],
        |row| row.get(0),
    )
    .optional()
    .query_context("select dataset name by job id")
}
