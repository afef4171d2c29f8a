//! Dataset records: a source-table specification plus a train/eval split.
//!
//! The stored record keeps `source_type` and `evaluation_type` as the raw
//! strings the caller supplied; `mf-split` turns them into closed variants
//! during validation.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a dataset's rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    StaticTable,
    DynamicTable,
    FeatureLookup,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::StaticTable => "static_table",
            SourceType::DynamicTable => "dynamic_table",
            SourceType::FeatureLookup => "feature_lookup",
        }
    }
}

impl FromStr for SourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "static_table" => Ok(SourceType::StaticTable),
            "dynamic_table" => Ok(SourceType::DynamicTable),
            "feature_lookup" => Ok(SourceType::FeatureLookup),
            other => Err(CoreError::UnknownVariant {
                kind: "source type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How rows are split between the training and evaluation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Random,
    Table,
    Timestamp,
}

impl EvaluationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationType::Random => "random",
            EvaluationType::Table => "table",
            EvaluationType::Timestamp => "timestamp",
        }
    }
}

impl FromStr for EvaluationType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "random" => Ok(EvaluationType::Random),
            "table" => Ok(EvaluationType::Table),
            "timestamp" => Ok(EvaluationType::Timestamp),
            other => Err(CoreError::UnknownVariant {
                kind: "evaluation type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-declared dataset fields.
///
/// Type-conditional fields are optional; which ones are required depends on
/// `source_type` and `evaluation_type`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    /// Label column name.
    #[serde(default)]
    pub target: String,
    pub source_type: String,
    pub evaluation_type: String,
    /// One or more comma-separated table references.
    #[serde(default)]
    pub source_table: Option<String>,
    #[serde(default)]
    pub timestamp_col: Option<String>,
    #[serde(default)]
    pub eol_definition: Vec<String>,
    #[serde(default)]
    pub feature_lookup_definition: Vec<String>,
    /// Fraction of rows routed to evaluation, for `random` splits.
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub source_table_eval: Option<String>,
    #[serde(default)]
    pub split_time_column: Option<String>,
}

/// A persisted dataset together with its materialization outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub project_id: i64,
    #[serde(flatten)]
    pub spec: DatasetSpec,
    pub materialized: bool,
    pub training_table_name: Option<String>,
    pub eval_table_name: Option<String>,
}

impl Dataset {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Both generated table names, once the dataset has been materialized.
    pub fn materialized_tables(&self) -> Option<(&str, &str)> {
        match (&self.training_table_name, &self.eval_table_name) {
            (Some(training), Some(eval)) => Some((training.as_str(), eval.as_str())),
            _ => None,
        }
    }
}
