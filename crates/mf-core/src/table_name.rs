//! Warehouse table references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// A warehouse table reference, usually fully qualified as
/// `catalog.schema.table`.
///
/// Keeps generated training/eval table names apart from dataset and column
/// names. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Wrap a reference the caller built or already validated.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "table name must not be empty");
        Self(name)
    }

    /// `None` for an empty or all-whitespace reference.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    /// `catalog.schema.table`
    pub fn qualified(catalog: &str, schema: &str, table: &str) -> Self {
        Self(format!("{catalog}.{schema}.{table}"))
    }

    /// Number of dot-separated segments in the reference.
    pub fn segment_count(&self) -> usize {
        self.0.split('.').count()
    }

    /// The last segment, i.e. the table without its namespace.
    pub fn table_part(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = &'static str;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::try_new(name).ok_or("table name must not be empty")
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for TableName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TableName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TableName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for TableName {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}
