//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use mf_core::{EvaluationType, SourceType};
use std::str::FromStr;

/// mlforge - register datasets, materialize train/eval splits and run
/// training jobs
#[derive(Parser, Debug)]
#[command(name = "mf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding mlforge.yml; relative paths in it resolve here
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Workspace host
    #[arg(long, global = true, env = "DATABRICKS_HOST")]
    pub host: Option<String>,

    /// Workspace access token
    #[arg(long, global = true, env = "DATABRICKS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SQL warehouse id
    #[arg(long, global = true, env = "DATABRICKS_WAREHOUSE_ID")]
    pub warehouse_id: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage projects
    Project(ProjectArgs),

    /// Manage and materialize datasets
    Dataset(DatasetArgs),

    /// Start training runs
    Train(TrainArgs),

    /// Inspect experiment runs and register models
    Runs(RunsArgs),
}

/// Arguments for the project command
#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommands,
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project
    Add(ProjectAddArgs),

    /// List projects
    List(ListArgs),

    /// Show one project
    Show(ShowArgs),

    /// Change project fields
    Update(ProjectUpdateArgs),

    /// Delete a project with its datasets and training jobs
    Delete(NameArgs),
}

/// Editable project fields
#[derive(Args, Debug, Default)]
pub struct ProjectFields {
    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,

    /// Catalog generated tables are written to
    #[arg(long)]
    pub catalog: Option<String>,

    /// Schema generated tables are written to
    #[arg(long)]
    pub schema: Option<String>,

    /// Git repository holding the training notebook
    #[arg(long)]
    pub git_url: Option<String>,

    /// Notebook path relative to the repository's notebooks/ folder
    #[arg(long)]
    pub training_notebook: Option<String>,
}

/// Arguments for project add
#[derive(Args, Debug)]
pub struct ProjectAddArgs {
    /// Project name
    pub name: String,

    #[command(flatten)]
    pub fields: ProjectFields,
}

/// Arguments for project update
#[derive(Args, Debug)]
pub struct ProjectUpdateArgs {
    /// Project name
    pub name: String,

    /// New project name
    #[arg(long)]
    pub rename: Option<String>,

    #[command(flatten)]
    pub fields: ProjectFields,
}

/// Arguments for list commands
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for show commands
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record name
    pub name: String,

    /// Output JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// A single record name
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Record name
    pub name: String,
}

/// Arguments for the dataset command
#[derive(Args, Debug)]
pub struct DatasetArgs {
    #[command(subcommand)]
    pub command: DatasetCommands,
}

/// Dataset subcommands
#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Register a dataset under a project
    Add(DatasetAddArgs),

    /// List datasets, optionally for one project
    List(DatasetListArgs),

    /// Show one dataset
    Show(DatasetShowArgs),

    /// Change dataset fields
    Update(DatasetUpdateArgs),

    /// Delete a dataset and its training job record
    Delete(DatasetRef),

    /// Create the training and evaluation tables
    Materialize(MaterializeArgs),
}

/// Identifies a dataset by project and name
#[derive(Args, Debug)]
pub struct DatasetRef {
    /// Owning project
    #[arg(long)]
    pub project: String,

    /// Dataset name
    pub name: String,
}

/// Type-conditional dataset fields
#[derive(Args, Debug, Default)]
pub struct DatasetFields {
    /// Source table reference(s), comma-separated
    #[arg(long)]
    pub source_table: Option<String>,

    /// Event time column of the source
    #[arg(long)]
    pub timestamp_col: Option<String>,

    /// End-of-life definitions (feature_lookup sources)
    #[arg(long, value_delimiter = ',')]
    pub eol_definition: Vec<String>,

    /// Feature lookup definitions (feature_lookup sources)
    #[arg(long, value_delimiter = ',')]
    pub feature_lookup_definition: Vec<String>,

    /// Fraction of rows sent to evaluation (random split)
    #[arg(long)]
    pub percentage: Option<f64>,

    /// Evaluation table reference(s) (table split)
    #[arg(long)]
    pub source_table_eval: Option<String>,

    /// Column compared against --split-time (timestamp split)
    #[arg(long)]
    pub split_time_column: Option<String>,
}

/// Arguments for dataset add
#[derive(Args, Debug)]
pub struct DatasetAddArgs {
    #[command(flatten)]
    pub dataset: DatasetRef,

    /// Label column
    #[arg(long)]
    pub target: String,

    /// static_table, dynamic_table or feature_lookup
    #[arg(long, value_parser = SourceType::from_str, default_value = "static_table")]
    pub source_type: SourceType,

    /// random, table or timestamp
    #[arg(long, value_parser = EvaluationType::from_str, default_value = "random")]
    pub evaluation_type: EvaluationType,

    #[command(flatten)]
    pub fields: DatasetFields,
}

/// Arguments for dataset update
#[derive(Args, Debug)]
pub struct DatasetUpdateArgs {
    #[command(flatten)]
    pub dataset: DatasetRef,

    /// New dataset name
    #[arg(long)]
    pub rename: Option<String>,

    /// Label column
    #[arg(long)]
    pub target: Option<String>,

    /// static_table, dynamic_table or feature_lookup
    #[arg(long, value_parser = SourceType::from_str)]
    pub source_type: Option<SourceType>,

    /// random, table or timestamp
    #[arg(long, value_parser = EvaluationType::from_str)]
    pub evaluation_type: Option<EvaluationType>,

    #[command(flatten)]
    pub fields: DatasetFields,
}

/// Arguments for dataset list
#[derive(Args, Debug)]
pub struct DatasetListArgs {
    /// Only datasets of this project
    #[arg(long)]
    pub project: Option<String>,

    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for dataset show
#[derive(Args, Debug)]
pub struct DatasetShowArgs {
    #[command(flatten)]
    pub dataset: DatasetRef,

    /// Output JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for dataset materialize
#[derive(Args, Debug)]
pub struct MaterializeArgs {
    #[command(flatten)]
    pub dataset: DatasetRef,

    /// Boundary for timestamp splits; earlier rows train, later rows evaluate
    #[arg(long)]
    pub split_time: Option<String>,
}

/// Arguments for the train command
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(subcommand)]
    pub command: TrainCommands,
}

/// Train subcommands
#[derive(Subcommand, Debug)]
pub enum TrainCommands {
    /// Run the dataset's training job, creating it on first use
    Run(TrainRunArgs),
}

/// Arguments for train run
#[derive(Args, Debug)]
pub struct TrainRunArgs {
    /// Owning project
    #[arg(long)]
    pub project: String,

    /// Dataset to train on
    #[arg(long)]
    pub dataset: String,

    /// Extra notebook parameters as a JSON object
    #[arg(long)]
    pub params: Option<String>,
}

/// Arguments for the runs command
#[derive(Args, Debug)]
pub struct RunsArgs {
    #[command(subcommand)]
    pub command: RunsCommands,
}

/// Runs subcommands
#[derive(Subcommand, Debug)]
pub enum RunsCommands {
    /// List the project's experiment runs, newest first
    List(RunsListArgs),

    /// Register the model logged by a run
    Register(RunsRegisterArgs),
}

/// Arguments for runs list
#[derive(Args, Debug)]
pub struct RunsListArgs {
    /// Project whose experiment is listed
    #[arg(long)]
    pub project: String,

    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for runs register
#[derive(Args, Debug)]
pub struct RunsRegisterArgs {
    /// Project whose namespace receives the model
    #[arg(long)]
    pub project: String,

    /// Experiment run id
    #[arg(long)]
    pub run_id: String,

    /// Model artifact URI; defaults to runs:/<run-id>/model
    #[arg(long)]
    pub model_uri: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
