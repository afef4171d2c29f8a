//! Dataset materialization: validate, generate, execute, record.

use crate::error::{OrchestrationError, OrchestrationResult};
use mf_core::{Dialect, TableName};
use mf_db::{Warehouse, WarehouseConnection};
use mf_meta::MetadataStore;
use mf_split::{generate, validate, SplitPlan};
use serde::Serialize;

/// Wall-clock seconds, used to make generated table names unique.
pub fn current_nonce() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// Outcome of a successful materialization.
#[derive(Debug, Clone, Serialize)]
pub struct Materialization {
    pub dataset_id: i64,
    pub training_table: TableName,
    pub eval_table: TableName,
    pub statements_executed: usize,
    /// Non-fatal problems, such as a temporary table that could not be dropped.
    pub warnings: Vec<String>,
}

/// Turns dataset definitions into training and evaluation tables.
pub struct Materializer<'a> {
    store: &'a dyn MetadataStore,
    warehouse: &'a dyn Warehouse,
    dialect: Dialect,
}

impl<'a> Materializer<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        warehouse: &'a dyn Warehouse,
        dialect: Dialect,
    ) -> Self {
        Self {
            store,
            warehouse,
            dialect,
        }
    }

    /// Materialize dataset `dataset_id` with table names suffixed by `nonce`.
    ///
    /// `split_time` is the boundary for timestamp splits. On success the
    /// dataset is marked materialized with the new table names. A failed
    /// statement stops the sequence; tables created before it are left in
    /// place.
    pub async fn materialize(
        &self,
        dataset_id: i64,
        split_time: Option<&str>,
        nonce: u64,
    ) -> OrchestrationResult<Materialization> {
        let dataset = self
            .store
            .get_dataset(dataset_id)?
            .ok_or(OrchestrationError::DatasetNotFound(dataset_id))?;
        let project = self
            .store
            .get_project(dataset.project_id)?
            .ok_or(OrchestrationError::ProjectNotFound(dataset.project_id))?;

        let normalized = validate(&dataset.spec, &project, split_time)?;
        let plan = generate(&normalized, nonce, self.dialect);
        log::info!(
            "Materializing dataset {} into {} / {} on {}",
            dataset.name(),
            plan.training_table,
            plan.eval_table,
            self.warehouse.db_type()
        );

        let mut conn = self
            .warehouse
            .connect()
            .await
            .map_err(OrchestrationError::WarehouseUnavailable)?;
        let executed = execute_plan(conn.as_mut(), &plan).await;
        if let Err(e) = conn.close().await {
            log::warn!("Failed to close warehouse connection: {e}");
        }
        let (statements_executed, warnings) = executed?;

        self.store
            .mark_materialized(dataset_id, &plan.training_table, &plan.eval_table)
            .map_err(|source| OrchestrationError::Persistence {
                context: format!(
                    "tables {} and {} were created but dataset {} was not updated",
                    plan.training_table, plan.eval_table, dataset_id
                ),
                source,
            })?;

        Ok(Materialization {
            dataset_id,
            training_table: plan.training_table,
            eval_table: plan.eval_table,
            statements_executed,
            warnings,
        })
    }
}

/// Run a plan's statements in order.
///
/// Stops at the first failing statement. Cleanup statements still run when
/// the temporary table was created, and their failure is only a warning.
/// Returns the number of statements that succeeded and the warnings.
pub async fn execute_plan(
    conn: &mut dyn WarehouseConnection,
    plan: &SplitPlan,
) -> OrchestrationResult<(usize, Vec<String>)> {
    let mut executed = 0;
    let mut temp_created = false;
    let mut failure = None;

    for (index, statement) in plan.statements.iter().enumerate() {
        if statement.kind.is_cleanup() {
            continue;
        }
        log::debug!("Executing statement {}: {}", index + 1, statement.sql);
        match conn.execute(&statement.sql).await {
            Ok(()) => {
                executed += 1;
                if statement.kind == mf_split::StatementKind::CreateTemp {
                    temp_created = true;
                }
            }
            Err(source) => {
                failure = Some(OrchestrationError::WarehouseExecution {
                    statement_index: index + 1,
                    sql: statement.sql.clone(),
                    source,
                });
                break;
            }
        }
    }

    let mut warnings = Vec::new();
    if temp_created {
        for statement in plan.statements.iter().filter(|s| s.kind.is_cleanup()) {
            log::debug!("Cleanup: {}", statement.sql);
            match conn.execute(&statement.sql).await {
                Ok(()) => executed += 1,
                Err(e) => {
                    log::warn!("Cleanup statement failed: {e}");
                    warnings.push(format!("cleanup failed ({}): {e}", statement.sql));
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok((executed, warnings)),
    }
}

#[cfg(test)]
#[path = "materialize_test.rs"]
mod tests;
