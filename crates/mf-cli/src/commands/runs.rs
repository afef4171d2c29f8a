//! Experiment run listing and model registration commands.

use crate::cli::{GlobalArgs, RunsArgs, RunsCommands, RunsListArgs, RunsRegisterArgs};
use crate::commands::common::{self, find_project, or_dash};
use crate::context::RuntimeContext;
use anyhow::{Context, Result};
use mf_engine::{RunResolver, RunView};

/// Execute the runs command.
pub async fn execute(args: &RunsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    match &args.command {
        RunsCommands::List(list) => execute_list(list, &ctx).await,
        RunsCommands::Register(register) => execute_register(register, &ctx).await,
    }
}

/// Milliseconds since the epoch as `YYYY-MM-DD HH:MM:SS` UTC.
pub(crate) fn format_start_time(millis: Option<i64>) -> String {
    millis
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Metrics as `name=value` pairs, sorted by name.
pub(crate) fn format_metrics(view: &RunView) -> String {
    view.metrics
        .iter()
        .map(|(name, value)| format!("{name}={value:.4}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn registered_model(view: &RunView) -> String {
    match (&view.registered_model_name, &view.registered_model_version) {
        (Some(name), Some(version)) => format!("{name} v{version}"),
        (Some(name), None) => name.clone(),
        _ => "-".to_string(),
    }
}

async fn execute_list(args: &RunsListArgs, ctx: &RuntimeContext) -> Result<()> {
    let meta = ctx.open_meta()?;
    let project = find_project(&meta, &args.project)?;
    let tracker = ctx.tracker()?;
    let resolver = RunResolver::new(
        &meta,
        &tracker,
        ctx.config.tracking.clone(),
        ctx.workspace_url(),
    );
    let views = resolver
        .list_runs_for_project(&project)
        .await
        .with_context(|| format!("Failed to list runs for project '{}'", project.name()))?;
    if args.json {
        return common::print_json(&views);
    }

    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|v| {
            vec![
                v.run_id.clone(),
                format_start_time(v.start_time),
                or_dash(v.status.as_deref()),
                v.dataset_label.clone(),
                format_metrics(v),
                registered_model(v),
                or_dash(v.run_url.as_deref()),
            ]
        })
        .collect();
    common::print_table(
        &["RUN", "STARTED", "STATUS", "DATASET", "METRICS", "MODEL", "JOB RUN"],
        &rows,
    );
    Ok(())
}

async fn execute_register(args: &RunsRegisterArgs, ctx: &RuntimeContext) -> Result<()> {
    let meta = ctx.open_meta()?;
    let project = find_project(&meta, &args.project)?;
    let tracker = ctx.tracker()?;
    let resolver = RunResolver::new(
        &meta,
        &tracker,
        ctx.config.tracking.clone(),
        ctx.workspace_url(),
    );

    let views = resolver
        .list_runs_for_project(&project)
        .await
        .with_context(|| format!("Failed to list runs for project '{}'", project.name()))?;
    let view = views
        .iter()
        .find(|v| v.run_id == args.run_id)
        .with_context(|| {
            format!(
                "Run '{}' not found in the experiment of project '{}'",
                args.run_id,
                project.name()
            )
        })?;

    let version = resolver
        .register_model(
            &view.run_id,
            &view.dataset_label,
            args.model_uri.as_deref(),
            &project,
        )
        .await
        .with_context(|| format!("Failed to register model from run '{}'", view.run_id))?;

    println!("Registered {} version {}", version.name, version.version);
    if let Some(status) = &version.status {
        println!("  status: {status}");
    }
    if let Some(message) = &version.status_message {
        println!("  {message}");
    }
    Ok(())
}
