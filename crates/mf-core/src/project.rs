//! Project records: a catalog/schema namespace plus a training notebook.

use serde::{Deserialize, Serialize};

/// Folder inside the git repository that holds training notebooks.
pub const NOTEBOOKS_FOLDER: &str = "notebooks";

/// User-editable project fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub catalog: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub git_url: String,
    /// Path relative to the repository's `notebooks/` folder.
    #[serde(default)]
    pub training_notebook: String,
}

/// A persisted project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(flatten)]
    pub spec: ProjectSpec,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Whether datasets under this project have a namespace to materialize into.
    pub fn has_namespace(&self) -> bool {
        !self.spec.catalog.trim().is_empty() && !self.spec.schema.trim().is_empty()
    }

    /// Notebook path as the job scheduler expects it: rooted at
    /// [`NOTEBOOKS_FOLDER`], without a `.py` suffix.
    pub fn notebook_path(&self) -> String {
        let notebook = self.spec.training_notebook.trim().trim_start_matches('/');
        let notebook = notebook.strip_suffix(".py").unwrap_or(notebook);
        format!("{NOTEBOOKS_FOLDER}/{notebook}")
    }
}
