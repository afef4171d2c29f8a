//! Dataset records and their materialization outputs.

use crate::error::{MetaError, MetaResult, MetaResultExt};
use duckdb::{Connection, OptionalExt};
use mf_core::{Dataset, DatasetSpec};
use serde::Serialize;

const DATASET_COLUMNS: &str = "d.dataset_id, d.project_id, d.name, d.target, d.source_type, \
     d.evaluation_type, d.source_table, d.timestamp_col, d.eol_definition, \
     d.feature_lookup_definition, d.percentage, d.source_table_eval, d.split_time_column, \
     d.materialized, d.training_table_name, d.eval_table_name";

/// A dataset together with the name of the project that owns it.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetListing {
    pub project_name: String,
    #[serde(flatten)]
    pub dataset: Dataset,
}

/// Raw row as stored; list columns are still JSON text.
struct DatasetRow {
    dataset: Dataset,
    eol_definition: String,
    feature_lookup_definition: String,
}

fn dataset_row(row: &duckdb::Row<'_>) -> duckdb::Result<DatasetRow> {
    Ok(DatasetRow {
        dataset: Dataset {
            id: row.get(0)?,
            project_id: row.get(1)?,
            spec: DatasetSpec {
                name: row.get(2)?,
                target: row.get(3)?,
                source_type: row.get(4)?,
                evaluation_type: row.get(5)?,
                source_table: row.get(6)?,
                timestamp_col: row.get(7)?,
                eol_definition: Vec::new(),
                feature_lookup_definition: Vec::new(),
                percentage: row.get(10)?,
                source_table_eval: row.get(11)?,
                split_time_column: row.get(12)?,
            },
            materialized: row.get(13)?,
            training_table_name: row.get(14)?,
            eval_table_name: row.get(15)?,
        },
        eol_definition: row.get(8)?,
        feature_lookup_definition: row.get(9)?,
    })
}

fn decode_list(column: &'static str, text: &str) -> MetaResult<Vec<String>> {
    serde_json::from_str(text).map_err(|e| MetaError::Decode {
        column,
        message: e.to_string(),
    })
}

fn encode_list(items: &[String]) -> MetaResult<String> {
    serde_json::to_string(items).map_err(|e| MetaError::QueryError(format!("encode list: {e}")))
}

impl DatasetRow {
    fn decode(self) -> MetaResult<Dataset> {
        let mut dataset = self.dataset;
        dataset.spec.eol_definition = decode_list("eol_definition", &self.eol_definition)?;
        dataset.spec.feature_lookup_definition = decode_list(
            "feature_lookup_definition",
            &self.feature_lookup_definition,
        )?;
        Ok(dataset)
    }
}

/// Insert a dataset under an existing project.
pub fn create_dataset(conn: &Connection, project_id: i64, spec: &DatasetSpec) -> MetaResult<Dataset> {
    if super::projects::get_project(conn, project_id)?.is_none() {
        return Err(MetaError::NotFound {
            entity: "project",
            id: project_id.to_string(),
        });
    }

    let id: i64 = conn
        .query_row(
            "INSERT INTO mf_meta.datasets (project_id, name, target, source_type, evaluation_type,
                 source_table, timestamp_col, eol_definition, feature_lookup_definition, percentage,
                 source_table_eval, split_time_column)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING dataset_id",
            duckdb::params![
                project_id,
                spec.name,
                spec.target,
                spec.source_type,
                spec.evaluation_type,
                spec.source_table,
                spec.timestamp_col,
                encode_list(&spec.eol_definition)?,
                encode_list(&spec.feature_lookup_definition)?,
                spec.percentage,
                spec.source_table_eval,
                spec.split_time_column,
            ],
            |row| row.get(0),
        )
        .query_context("insert datasets")?;
    log::debug!("Created dataset {} ({}) in project {}", id, spec.name, project_id);

    Ok(Dataset {
        id,
        project_id,
        spec: spec.clone(),
        materialized: false,
        training_table_name: None,
        eval_table_name: None,
    })
}

pub fn get_dataset(conn: &Connection, dataset_id: i64) -> MetaResult<Option<Dataset>> {
    conn.query_row(
        &format!("SELECT {DATASET_COLUMNS} FROM mf_meta.datasets d WHERE d.dataset_id = ?"),
        duckdb::params![dataset_id],
        dataset_row,
    )
    .optional()
    .query_context("select dataset")?
    .map(DatasetRow::decode)
    .transpose()
}

pub fn get_dataset_by_name(
    conn: &Connection,
    project_id: i64,
    name: &str,
) -> MetaResult<Option<Dataset>> {
    conn.query_row(
        &format!(
            "SELECT {DATASET_COLUMNS} FROM mf_meta.datasets d WHERE d.project_id = ? AND d.name = ?"
        ),
        duckdb::params![project_id, name],
        dataset_row,
    )
    .optional()
    .query_context("select dataset by name")?
    .map(DatasetRow::decode)
    .transpose()
}

/// Datasets of one project, ordered by name.
pub fn list_datasets(conn: &Connection, project_id: i64) -> MetaResult<Vec<Dataset>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {DATASET_COLUMNS} FROM mf_meta.datasets d WHERE d.project_id = ? ORDER BY d.name"
        ))
        .query_context("prepare list datasets")?;
    let rows = stmt
        .query_map(duckdb::params![project_id], dataset_row)
        .query_context("list datasets")?
        .collect::<Result<Vec<_>, _>>()
        .query_context("collect datasets")?;
    rows.into_iter().map(DatasetRow::decode).collect()
}

/// Every dataset with its project name, newest first.
pub fn list_all_datasets(conn: &Connection) -> MetaResult<Vec<DatasetListing>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {DATASET_COLUMNS}, p.name
             FROM mf_meta.datasets d
             JOIN mf_meta.projects p ON p.project_id = d.project_id
             ORDER BY d.created_at DESC, d.dataset_id DESC"
        ))
        .query_context("prepare list all datasets")?;
    let rows = stmt
        .query_map([], |row| Ok((dataset_row(row)?, row.get::<_, String>(16)?)))
        .query_context("list all datasets")?
        .collect::<Result<Vec<_>, _>>()
        .query_context("collect all datasets")?;
    rows.into_iter()
        .map(|(raw, project_name)| {
            Ok(DatasetListing {
                project_name,
                dataset: raw.decode()?,
            })
        })
        .collect()
}

/// Overwrite a dataset's declared fields. Materialization outputs are kept.
pub fn update_dataset(conn: &Connection, dataset_id: i64, spec: &DatasetSpec) -> MetaResult<Dataset> {
    let updated = conn
        .execute(
            "UPDATE mf_meta.datasets
             SET name = ?, target = ?, source_type = ?, evaluation_type = ?, source_table = ?,
                 timestamp_col = ?, eol_definition = ?, feature_lookup_definition = ?,
                 percentage = ?, source_table_eval = ?, split_time_column = ?
             WHERE dataset_id = ?",
            duckdb::params![
                spec.name,
                spec.target,
                spec.source_type,
                spec.evaluation_type,
                spec.source_table,
                spec.timestamp_col,
                encode_list(&spec.eol_definition)?,
                encode_list(&spec.feature_lookup_definition)?,
                spec.percentage,
                spec.source_table_eval,
                spec.split_time_column,
                dataset_id,
            ],
        )
        .query_context("update datasets")?;
    if updated == 0 {
        return Err(MetaError::NotFound {
            entity: "dataset",
            id: dataset_id.to_string(),
        });
    }
    get_dataset(conn, dataset_id)?.ok_or(MetaError::NotFound {
        entity: "dataset",
        id: dataset_id.to_string(),
    })
}

/// Delete a dataset and its training job record.
pub fn delete_dataset(conn: &Connection, dataset_id: i64) -> MetaResult<()> {
    conn.execute(
        "DELETE FROM mf_meta.training_jobs WHERE dataset_id = ?",
        duckdb::params![dataset_id],
    )
    .query_context("delete dataset training jobs")?;
    let deleted = conn
        .execute(
            "DELETE FROM mf_meta.datasets WHERE dataset_id = ?",
            duckdb::params![dataset_id],
        )
        .query_context("delete datasets")?;
    if deleted == 0 {
        return Err(MetaError::NotFound {
            entity: "dataset",
            id: dataset_id.to_string(),
        });
    }
    Ok(())
}

/// Record a successful materialization. The flag only ever moves to `true`.
pub fn mark_materialized(
    conn: &Connection,
    dataset_id: i64,
    training_table: &str,
    eval_table: &str,
) -> MetaResult<()> {
    let updated = conn
        .execute(
            "UPDATE mf_meta.datasets
             SET materialized = true, training_table_name = ?, eval_table_name = ?
             WHERE dataset_id = ?",
            duckdb::params![training_table, eval_table, dataset_id],
        )
        .query_context("update materialization")?;
    if updated == 0 {
        return Err(MetaError::NotFound {
            entity: "dataset",
            id: dataset_id.to_string(),
        });
    }
    Ok(())
}

pub fn dataset_name_by_id(conn: &Connection, dataset_id: i64) -> MetaResult<Option<String>> {
    conn.query_row(
        "SELECT name FROM mf_meta.datasets WHERE dataset_id = ?",
        duckdb::params![dataset_id],
        |row| row.get(0),
    )
    .optional()
    .query_context("select dataset name")
}

/// Name of the dataset whose current training table is `table_name`.
pub fn dataset_name_by_training_table(
    conn: &Connection,
    table_name: &str,
) -> MetaResult<Option<String>> {
    conn.query_row(
        "SELECT name FROM mf_meta.datasets WHERE training_table_name = ? LIMIT 1",
        duckdb::params![table_name],
        |row| row.get(0),
    )
    .optional()
    .query_context("select dataset name by training table")
}
