//! Training/evaluation SQL generation.
//!
//! Produces the ordered statement list for one materialization attempt.
//! Table names carry the caller's nonce, so repeated materializations of the
//! same dataset never write to the same tables.

use crate::spec::{EvaluationKind, NormalizedSpec};
use mf_core::sql_utils::{qualify_table_ref, sanitize_name, string_literal};
use mf_core::{Dialect, TableName};

/// Column holding the random draw in the temporary table.
pub const SPLIT_COLUMN: &str = "mf_split_rand";

/// Role of a statement within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CreateTemp,
    CreateTraining,
    CreateEval,
    DropTemp,
}

impl StatementKind {
    /// Cleanup statements run after a failure too, once the temp table exists.
    pub fn is_cleanup(&self) -> bool {
        matches!(self, StatementKind::DropTemp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitStatement {
    pub kind: StatementKind,
    pub sql: String,
}

/// Everything needed to materialize one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub statements: Vec<SplitStatement>,
    pub training_table: TableName,
    pub eval_table: TableName,
}

impl SplitPlan {
    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|s| s.sql.as_str()).collect()
    }
}

/// Generate the materialization statements for `spec`.
///
/// Deterministic in `(spec, nonce, dialect)`.
pub fn generate(spec: &NormalizedSpec, nonce: u64, dialect: Dialect) -> SplitPlan {
    let base = sanitize_name(&spec.dataset_name);
    let table = |suffix: &str| {
        TableName::qualified(&spec.catalog, &spec.schema, &format!("{base}_{suffix}_{nonce}"))
    };
    let training_table = table("training");
    let eval_table = table("eval");
    let source = source_relation(spec.source.tables(), &spec.catalog, &spec.schema);

    let statements = match &spec.evaluation {
        EvaluationKind::Random { percentage } => {
            let temp_table = table("split_tmp");
            let star_without_split = star_except(dialect, SPLIT_COLUMN);
            vec![
                SplitStatement {
                    kind: StatementKind::CreateTemp,
                    sql: format!(
                        "CREATE OR REPLACE TABLE {temp_table} AS SELECT *, random() AS {SPLIT_COLUMN} FROM {source}"
                    ),
                },
                SplitStatement {
                    kind: StatementKind::CreateTraining,
                    sql: format!(
                        "CREATE OR REPLACE TABLE {training_table} AS SELECT {star_without_split} FROM {temp_table} WHERE {SPLIT_COLUMN} >= {percentage}"
                    ),
                },
                SplitStatement {
                    kind: StatementKind::CreateEval,
                    sql: format!(
                        "CREATE OR REPLACE TABLE {eval_table} AS SELECT {star_without_split} FROM {temp_table} WHERE {SPLIT_COLUMN} < {percentage}"
                    ),
                },
                SplitStatement {
                    kind: StatementKind::DropTemp,
                    sql: format!("DROP TABLE IF EXISTS {temp_table}"),
                },
            ]
        }
        EvaluationKind::Table { eval_tables } => {
            let eval_source = source_relation(eval_tables, &spec.catalog, &spec.schema);
            vec![
                SplitStatement {
                    kind: StatementKind::CreateTraining,
                    sql: format!("CREATE OR REPLACE TABLE {training_table} AS SELECT * FROM {source}"),
                },
                SplitStatement {
                    kind: StatementKind::CreateEval,
                    sql: format!("CREATE OR REPLACE TABLE {eval_table} AS SELECT * FROM {eval_source}"),
                },
            ]
        }
        EvaluationKind::Timestamp {
            column,
            split_value,
        } => {
            let literal = string_literal(split_value);
            vec![
                SplitStatement {
                    kind: StatementKind::CreateTraining,
                    sql: format!(
                        "CREATE OR REPLACE TABLE {training_table} AS SELECT * FROM {source} WHERE {column} < {literal}"
                    ),
                },
                SplitStatement {
                    kind: StatementKind::CreateEval,
                    sql: format!(
                        "CREATE OR REPLACE TABLE {eval_table} AS SELECT * FROM {source} WHERE {column} >= {literal}"
                    ),
                },
            ]
        }
    };
    log::debug!(
        "Planned {} statements for {} ({})",
        statements.len(),
        spec.dataset_name,
        spec.evaluation.evaluation_type()
    );

    SplitPlan {
        statements,
        training_table,
        eval_table,
    }
}

/// The relation rows are read from: one qualified table, or a `UNION ALL`
/// of several.
fn source_relation(tables: &[TableName], catalog: &str, schema: &str) -> String {
    let qualified: Vec<String> = tables
        .iter()
        .map(|t| qualify_table_ref(t, catalog, schema))
        .collect();
    match qualified.as_slice() {
        [single] => single.clone(),
        many => {
            let union = many
                .iter()
                .map(|t| format!("SELECT * FROM {t}"))
                .collect::<Vec<_>>()
                .join(" UNION ALL ");
            format!("({union}) AS mf_source")
        }
    }
}

fn star_except(dialect: Dialect, column: &str) -> String {
    match dialect {
        Dialect::Databricks => format!("* EXCEPT ({column})"),
        Dialect::DuckDb => format!("* EXCLUDE ({column})"),
    }
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
