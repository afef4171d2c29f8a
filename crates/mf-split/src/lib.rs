//! mf-split - Dataset split specification for mlforge
//!
//! Turns a stored dataset definition into a [`NormalizedSpec`] (one closed
//! variant per source kind and evaluation kind) and then into the ordered
//! SQL statements that materialize its training and evaluation tables.

pub mod error;
pub mod generator;
pub mod spec;
pub mod table_ref;
pub mod validator;

pub use error::{SplitError, SplitResult};
pub use generator::{generate, SplitPlan, SplitStatement, StatementKind, SPLIT_COLUMN};
pub use spec::{EvaluationKind, NormalizedSpec, SourceKind};
pub use validator::validate;
