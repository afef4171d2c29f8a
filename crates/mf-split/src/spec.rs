//! Validated split specification.

use mf_core::{EvaluationType, SourceType, TableName};

/// Where the rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    StaticTable {
        tables: Vec<TableName>,
    },
    DynamicTable {
        tables: Vec<TableName>,
        timestamp_col: Option<String>,
    },
    FeatureLookup {
        tables: Vec<TableName>,
        timestamp_col: Option<String>,
        eol_definition: Vec<String>,
        feature_lookup_definition: Vec<String>,
    },
}

impl SourceKind {
    /// Source table references as entered (unqualified or partially qualified).
    pub fn tables(&self) -> &[TableName] {
        match self {
            SourceKind::StaticTable { tables }
            | SourceKind::DynamicTable { tables, .. }
            | SourceKind::FeatureLookup { tables, .. } => tables,
        }
    }

    pub fn timestamp_col(&self) -> Option<&str> {
        match self {
            SourceKind::StaticTable { .. } => None,
            SourceKind::DynamicTable { timestamp_col, .. }
            | SourceKind::FeatureLookup { timestamp_col, .. } => timestamp_col.as_deref(),
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            SourceKind::StaticTable { .. } => SourceType::StaticTable,
            SourceKind::DynamicTable { .. } => SourceType::DynamicTable,
            SourceKind::FeatureLookup { .. } => SourceType::FeatureLookup,
        }
    }
}

/// How rows are divided between training and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationKind {
    /// Fraction in `(0, 1)` routed to evaluation.
    Random { percentage: f64 },
    /// Evaluation rows copied verbatim from separate tables.
    Table { eval_tables: Vec<TableName> },
    /// Half-open split on `column`: training below `split_value`, evaluation
    /// at or above it.
    Timestamp { column: String, split_value: String },
}

impl EvaluationKind {
    pub fn evaluation_type(&self) -> EvaluationType {
        match self {
            EvaluationKind::Random { .. } => EvaluationType::Random,
            EvaluationKind::Table { .. } => EvaluationType::Table,
            EvaluationKind::Timestamp { .. } => EvaluationType::Timestamp,
        }
    }
}

/// A dataset definition that has passed validation, together with the
/// namespace its tables are created in.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSpec {
    pub dataset_name: String,
    pub target: String,
    pub catalog: String,
    pub schema: String,
    pub source: SourceKind,
    pub evaluation: EvaluationKind,
}
