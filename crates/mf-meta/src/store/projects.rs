//! Project records: create, read, update, delete.

use crate::error::{MetaError, MetaResult, MetaResultExt};
use duckdb::{Connection, OptionalExt};
use mf_core::{Project, ProjectSpec};

const PROJECT_COLUMNS: &str =
    "project_id, name, description, catalog, schema_name, git_url, training_notebook";

fn project_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        spec: ProjectSpec {
            name: row.get(1)?,
            description: row.get(2)?,
            catalog: row.get(3)?,
            schema: row.get(4)?,
            git_url: row.get(5)?,
            training_notebook: row.get(6)?,
        },
    })
}

/// Insert a project. Returns the stored record with its generated id.
pub fn create_project(conn: &Connection, spec: &ProjectSpec) -> MetaResult<Project> {
    let id: i64 = conn
        .query_row(
            "INSERT INTO mf_meta.projects (name, description, catalog, schema_name, git_url, training_notebook)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING project_id",
            duckdb::params![
                spec.name,
                spec.description,
                spec.catalog,
                spec.schema,
                spec.git_url,
                spec.training_notebook,
            ],
            |row| row.get(0),
        )
        .query_context("insert projects")?;
    log::debug!("Created project {} ({})", id, spec.name);
    Ok(Project {
        id,
        spec: spec.clone(),
    })
}

pub fn get_project(conn: &Connection, project_id: i64) -> MetaResult<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM mf_meta.projects WHERE project_id = ?"),
        duckdb::params![project_id],
        project_from_row,
    )
    .optional()
    .query_context("select project")
}

pub fn get_project_by_name(conn: &Connection, name: &str) -> MetaResult<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM mf_meta.projects WHERE name = ?"),
        duckdb::params![name],
        project_from_row,
    )
    .optional()
    .query_context("select project by name")
}

/// All projects ordered by name.
pub fn list_projects(conn: &Connection) -> MetaResult<Vec<Project>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM mf_meta.projects ORDER BY name ASC"
        ))
        .query_context("prepare list projects")?;
    let rows = stmt
        .query_map([], project_from_row)
        .query_context("list projects")?
        .collect::<Result<Vec<_>, _>>()
        .query_context("collect projects")?;
    Ok(rows)
}

/// Overwrite a project's editable fields.
pub fn update_project(conn: &Connection, project_id: i64, spec: &ProjectSpec) -> MetaResult<Project> {
    let updated = conn
        .execute(
            "UPDATE mf_meta.projects
             SET name = ?, description = ?, catalog = ?, schema_name = ?, git_url = ?, training_notebook = ?
             WHERE project_id = ?",
            duckdb::params![
                spec.name,
                spec.description,
                spec.catalog,
                spec.schema,
                spec.git_url,
                spec.training_notebook,
                project_id,
            ],
        )
        .query_context("update projects")?;
    if updated == 0 {
        return Err(MetaError::NotFound {
            entity: "project",
            id: project_id.to_string(),
        });
    }
    Ok(Project {
        id: project_id,
        spec: spec.clone(),
    })
}

/// Delete a project with its datasets and training job records.
///
/// Children go first; wrap the call in [`crate::MetaDb::transaction`] so a
/// failure leaves nothing half-deleted.
pub fn delete_project(conn: &Connection, project_id: i64) -> MetaResult<()> {
    let stmts = [
        "DELETE FROM mf_meta.training_jobs WHERE project_id = ?",
        "DELETE FROM mf_meta.datasets WHERE project_id = ?",
    ];
    for stmt in &stmts {
        conn.execute(stmt, duckdb::params![project_id])
            .query_context("delete project children")?;
    }
    let deleted = conn
        .execute(
            "DELETE FROM mf_meta.projects WHERE project_id = ?",
            duckdb::params![project_id],
        )
        .query_context("delete projects")?;
    if deleted == 0 {
        return Err(MetaError::NotFound {
            entity: "project",
            id: project_id.to_string(),
        });
    }
    Ok(())
}
