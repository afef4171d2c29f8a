//! Training run command.

use crate::cli::{GlobalArgs, TrainArgs, TrainCommands, TrainRunArgs};
use crate::commands::common::{find_dataset, find_project};
use crate::context::RuntimeContext;
use anyhow::{Context, Result};
use mf_engine::TrainingJobManager;

/// Execute the train command.
pub async fn execute(args: &TrainArgs, global: &GlobalArgs) -> Result<()> {
    match &args.command {
        TrainCommands::Run(run) => execute_run(run, global).await,
    }
}

/// Parse `--params`: absent means an empty object, anything but an object
/// is rejected.
pub(crate) fn parse_params(raw: Option<&str>) -> Result<serde_json::Value> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(serde_json::Value::Object(Default::default()));
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--params is not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("--params must be a JSON object");
    }
    Ok(value)
}

async fn execute_run(args: &TrainRunArgs, global: &GlobalArgs) -> Result<()> {
    let params = parse_params(args.params.as_deref())?;
    let ctx = RuntimeContext::new(global)?;
    let meta = ctx.open_meta()?;
    let project = find_project(&meta, &args.project)?;
    let dataset = find_dataset(&meta, &project, &args.dataset)?;
    let scheduler = ctx.scheduler()?;

    let handle = TrainingJobManager::new(&meta, &scheduler, ctx.config.git.clone())
        .ensure_job_and_run(&project, &dataset, &params)
        .await
        .with_context(|| format!("Failed to start training for dataset '{}'", dataset.name()))?;

    if handle.created_job {
        println!("Created job {} for dataset '{}'", handle.job_id, dataset.name());
    }
    println!("Started run {} of job {}", handle.run_id, handle.job_id);
    println!("  {}", scheduler.run_page_url(handle.job_id, handle.run_id));
    for warning in &handle.warnings {
        println!("  warning: {warning}");
    }
    Ok(())
}
