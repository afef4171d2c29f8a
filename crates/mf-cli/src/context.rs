//! Runtime context for CLI commands

use anyhow::{Context, Result};
use mf_core::{Config, CredentialOverrides, WarehouseKind};
use mf_db::{DatabricksSqlWarehouse, DuckDbWarehouse, Warehouse};
use mf_meta::MetaDb;
use mf_remote::{DatabricksJobs, MlflowTracker};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::GlobalArgs;

/// Loaded configuration plus the directory its relative paths resolve
/// against. Remote clients are built on demand so commands that only touch
/// the metadata store never need credentials.
pub struct RuntimeContext {
    pub config: Config,
    pub root: PathBuf,
}

impl RuntimeContext {
    /// Load the configuration and apply flag/environment credentials
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);
        let config = match &args.config {
            Some(path) => {
                Config::load(Path::new(path)).context("Failed to load configuration file")?
            }
            None => Config::load_from_dir(&root).context("Failed to load project configuration")?,
        };
        let config = config.with_overrides(CredentialOverrides {
            host: args.host.clone(),
            token: args.token.clone(),
            warehouse_id: args.warehouse_id.clone(),
        });
        Ok(Self { config, root })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Open (creating if needed) the metadata store
    pub fn open_meta(&self) -> Result<MetaDb> {
        let path = self.resolve(&self.config.meta.path);
        log::debug!("Opening metadata store {}", path.display());
        MetaDb::open(&path)
            .with_context(|| format!("Failed to open metadata store {}", path.display()))
    }

    /// The configured warehouse backend
    pub fn warehouse(&self) -> Result<Box<dyn Warehouse>> {
        let warehouse = &self.config.warehouse;
        match warehouse.kind {
            WarehouseKind::DuckDb => {
                let db = if warehouse.path == ":memory:" {
                    DuckDbWarehouse::in_memory()
                } else {
                    DuckDbWarehouse::from_path(&self.resolve(&warehouse.path))
                }
                .context("Failed to open DuckDB warehouse")?;
                Ok(Box::new(db))
            }
            WarehouseKind::Databricks => {
                let db = DatabricksSqlWarehouse::new(
                    self.config.workspace_url()?,
                    self.config.workspace_token()?,
                    self.config.warehouse_id()?,
                    Duration::from_millis(warehouse.poll_interval_ms),
                )
                .context("Failed to create SQL warehouse client")?;
                Ok(Box::new(db))
            }
        }
    }

    /// Jobs API client
    pub fn scheduler(&self) -> Result<DatabricksJobs> {
        DatabricksJobs::new(self.config.workspace_url()?, self.config.workspace_token()?)
            .context("Failed to create jobs client")
    }

    /// Experiment tracking client
    pub fn tracker(&self) -> Result<MlflowTracker> {
        MlflowTracker::new(self.config.workspace_url()?, self.config.workspace_token()?)
            .context("Failed to create tracking client")
    }

    /// Workspace URL for deep links, when a host is configured
    pub fn workspace_url(&self) -> Option<String> {
        self.config.workspace_url().ok()
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
