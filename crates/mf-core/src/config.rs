//! Configuration types and parsing for mlforge.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration from mlforge.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Metadata store location
    #[serde(default)]
    pub meta: MetaConfig,

    /// Warehouse used to materialize datasets
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Remote workspace (jobs, tracking, SQL statements) credentials
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Git source attached to training jobs
    #[serde(default)]
    pub git: GitConfig,

    /// Experiment tracking settings
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Metadata store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    /// DuckDB file holding projects, datasets and training jobs
    #[serde(default = "default_meta_path")]
    pub path: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            path: default_meta_path(),
        }
    }
}

/// Warehouse backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    /// Databricks SQL warehouse over the statement execution API (default)
    #[default]
    Databricks,
    /// In-process DuckDB database
    DuckDb,
}

impl std::fmt::Display for WarehouseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseKind::Databricks => write!(f, "databricks"),
            WarehouseKind::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// SQL dialect used when generating split statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Databricks SQL (`SELECT * EXCEPT (...)`)
    #[default]
    Databricks,
    /// DuckDB SQL (`SELECT * EXCLUDE (...)`)
    DuckDb,
}

/// Warehouse connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Backend type (databricks or duckdb)
    #[serde(rename = "type", default)]
    pub kind: WarehouseKind,

    /// DuckDB database path (file or :memory:)
    #[serde(default = "default_duckdb_path")]
    pub path: String,

    /// Databricks SQL warehouse id
    #[serde(default)]
    pub warehouse_id: Option<String>,

    /// Dialect override; defaults to the backend's own dialect
    #[serde(default)]
    pub dialect: Option<Dialect>,

    /// Interval between status polls for long-running statements
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            kind: WarehouseKind::default(),
            path: default_duckdb_path(),
            warehouse_id: None,
            dialect: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Workspace credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Workspace host, with or without the https:// scheme
    #[serde(default)]
    pub host: Option<String>,

    /// Personal access token
    #[serde(default)]
    pub token: Option<String>,
}

/// Git source for training jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Provider name as the job scheduler spells it
    #[serde(default = "default_git_provider")]
    pub provider: String,

    /// Branch checked out for every run
    #[serde(default = "default_git_branch")]
    pub branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            provider: default_git_provider(),
            branch: default_git_branch(),
        }
    }
}

/// Experiment tracking configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackingConfig {
    /// Folder experiments live under, e.g. `/Users/someone@example.com`
    #[serde(default)]
    pub experiment_root: Option<String>,
}

impl TrackingConfig {
    /// Experiment name for a project: `{experiment_root}/{project_name}`, or
    /// the bare project name when no root is configured.
    pub fn experiment_path(&self, project_name: &str) -> String {
        match self
            .experiment_root
            .as_deref()
            .map(|r| r.trim().trim_end_matches('/'))
            .filter(|r| !r.is_empty())
        {
            Some(root) => format!("{root}/{project_name}"),
            None => project_name.to_string(),
        }
    }
}

const DEFAULT_META_PATH: &str = ".mlforge/meta.duckdb";

fn default_meta_path() -> String {
    DEFAULT_META_PATH.to_string()
}

fn default_duckdb_path() -> String {
    ":memory:".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_git_provider() -> String {
    "gitHub".to_string()
}

fn default_git_branch() -> String {
    "main".to_string()
}

/// Credentials supplied outside the config file (flags or environment).
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub host: Option<String>,
    pub token: Option<String>,
    pub warehouse_id: Option<String>,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory.
    /// Looks for mlforge.yml or mlforge.yaml; falls back to defaults when
    /// neither exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("mlforge.yml");
        let yaml_path = dir.join("mlforge.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            log::debug!("No mlforge.yml in {}, using defaults", dir.display());
            Ok(Self::default())
        }
    }

    /// Apply credentials given on the command line or through the
    /// environment. Non-empty overrides win over file values.
    pub fn with_overrides(mut self, overrides: CredentialOverrides) -> Self {
        fn pick(file: Option<String>, over: Option<String>) -> Option<String> {
            over.filter(|v| !v.trim().is_empty()).or(file)
        }
        self.workspace.host = pick(self.workspace.host.take(), overrides.host);
        self.workspace.token = pick(self.workspace.token.take(), overrides.token);
        self.warehouse.warehouse_id =
            pick(self.warehouse.warehouse_id.take(), overrides.warehouse_id);
        self
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.meta.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "meta.path cannot be empty".to_string(),
            });
        }
        if self.warehouse.poll_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "warehouse.poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.git.branch.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "git.branch cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Dialect for generated SQL: the explicit override, else the backend's own.
    pub fn dialect(&self) -> Dialect {
        self.warehouse.dialect.unwrap_or(match self.warehouse.kind {
            WarehouseKind::Databricks => Dialect::Databricks,
            WarehouseKind::DuckDb => Dialect::DuckDb,
        })
    }

    /// Workspace base URL with an `https://` scheme and no trailing slash.
    pub fn workspace_url(&self) -> CoreResult<String> {
        let host = self
            .workspace
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: "workspace host is not set (workspace.host or DATABRICKS_HOST)"
                    .to_string(),
            })?;
        let url = if host.starts_with("https://") || host.starts_with("http://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Ok(url.trim_end_matches('/').to_string())
    }

    /// Workspace access token.
    pub fn workspace_token(&self) -> CoreResult<&str> {
        self.workspace
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: "workspace token is not set (workspace.token or DATABRICKS_TOKEN)"
                    .to_string(),
            })
    }

    /// Databricks SQL warehouse id.
    pub fn warehouse_id(&self) -> CoreResult<&str> {
        self.warehouse
            .warehouse_id
            .as_deref()
            .filter(|w| !w.trim().is_empty())
            .ok_or_else(|| CoreError::ConfigInvalid {
                message:
                    "warehouse id is not set (warehouse.warehouse_id or DATABRICKS_WAREHOUSE_ID)"
                        .to_string(),
            })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
