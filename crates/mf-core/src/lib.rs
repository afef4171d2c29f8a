//! mf-core - Core library for mlforge
//!
//! This crate provides the shared records (projects, datasets, training
//! jobs), configuration parsing, strongly-typed table names and the SQL
//! helpers used across all mlforge components.

pub mod config;
pub mod dataset;
pub mod error;
pub mod project;
pub mod sql_utils;
pub mod table_name;
pub mod training_job;

pub use config::{Config, CredentialOverrides, Dialect, GitConfig, TrackingConfig, WarehouseKind};
pub use dataset::{Dataset, DatasetSpec, EvaluationType, SourceType};
pub use error::{CoreError, CoreResult};
pub use project::{Project, ProjectSpec};
pub use table_name::TableName;
pub use training_job::TrainingJob;
