//! Dataset split validation.

use crate::error::{SplitError, SplitResult};
use crate::spec::{EvaluationKind, NormalizedSpec, SourceKind};
use crate::table_ref::{parse_column_name, parse_table_list};
use mf_core::sql_utils::{is_plain_identifier, sanitize_name, split_comma_list};
use mf_core::{DatasetSpec, EvaluationType, Project, SourceType};

/// Validate a dataset definition against its owning project.
///
/// `split_time` is the literal boundary supplied at materialization time; it
/// is only consulted for timestamp splits. Pure: no I/O, no logging.
pub fn validate(
    spec: &DatasetSpec,
    project: &Project,
    split_time: Option<&str>,
) -> SplitResult<NormalizedSpec> {
    let source_type: SourceType = spec
        .source_type
        .parse()
        .map_err(|_| SplitError::UnsupportedSourceType(spec.source_type.clone()))?;
    let evaluation_type: EvaluationType = spec
        .evaluation_type
        .parse()
        .map_err(|_| SplitError::UnsupportedEvaluationType(spec.evaluation_type.clone()))?;

    let source_text = required(spec.source_table.as_deref(), "source_table")?;
    let target = required(Some(&spec.target), "target")?;
    let catalog = required(Some(&project.spec.catalog), "catalog")?;
    let schema = required(Some(&project.spec.schema), "schema")?;
    let dataset_name = spec.name.trim();
    if !is_plain_identifier(&sanitize_name(dataset_name)) {
        return Err(SplitError::InvalidDatasetName(dataset_name.to_string()));
    }

    let evaluation = match evaluation_type {
        EvaluationType::Random => {
            let percentage = spec.percentage.ok_or(SplitError::InvalidSplitParameter {
                field: "percentage",
                message: "required for random splits".to_string(),
            })?;
            if !(percentage > 0.0 && percentage < 1.0) {
                return Err(SplitError::InvalidSplitParameter {
                    field: "percentage",
                    message: format!("{percentage} is outside the open interval (0, 1)"),
                });
            }
            EvaluationKind::Random { percentage }
        }
        EvaluationType::Table => {
            let eval_text = non_empty(spec.source_table_eval.as_deref()).ok_or(
                SplitError::InvalidSplitParameter {
                    field: "source_table_eval",
                    message: "required for table splits".to_string(),
                },
            )?;
            let eval_tables = parse_table_list(eval_text)?;
            if eval_tables.is_empty() {
                return Err(SplitError::InvalidSplitParameter {
                    field: "source_table_eval",
                    message: "no table reference given".to_string(),
                });
            }
            EvaluationKind::Table { eval_tables }
        }
        EvaluationType::Timestamp => {
            let column = non_empty(spec.split_time_column.as_deref())
                .or_else(|| non_empty(spec.timestamp_col.as_deref()))
                .ok_or(SplitError::InvalidSplitParameter {
                    field: "timestamp_col",
                    message: "a split column is required for timestamp splits".to_string(),
                })?;
            let split_value = non_empty(split_time).ok_or(SplitError::InvalidSplitParameter {
                field: "split_time",
                message: "a split value is required for timestamp splits".to_string(),
            })?;
            EvaluationKind::Timestamp {
                column: parse_column_name(column, "timestamp_col")?,
                split_value: split_value.to_string(),
            }
        }
    };

    let tables = parse_table_list(source_text)?;
    if tables.is_empty() {
        return Err(SplitError::MissingRequiredField {
            field: "source_table",
        });
    }
    let timestamp_col = non_empty(spec.timestamp_col.as_deref())
        .map(|c| parse_column_name(c, "timestamp_col"))
        .transpose()?;

    let source = match source_type {
        SourceType::StaticTable => SourceKind::StaticTable { tables },
        SourceType::DynamicTable => SourceKind::DynamicTable {
            tables,
            timestamp_col,
        },
        SourceType::FeatureLookup => SourceKind::FeatureLookup {
            tables,
            timestamp_col,
            eol_definition: flatten_list(&spec.eol_definition),
            feature_lookup_definition: flatten_list(&spec.feature_lookup_definition),
        },
    };

    Ok(NormalizedSpec {
        dataset_name: dataset_name.to_string(),
        target: target.to_string(),
        catalog: catalog.to_string(),
        schema: schema.to_string(),
        source,
        evaluation,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> SplitResult<&'a str> {
    non_empty(value).ok_or(SplitError::MissingRequiredField { field })
}

/// Entries may themselves hold comma-separated text typed into one field.
fn flatten_list(entries: &[String]) -> Vec<String> {
    entries.iter().flat_map(|e| split_comma_list(e)).collect()
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
