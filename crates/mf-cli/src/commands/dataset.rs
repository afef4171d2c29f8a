//! Dataset management and materialization commands.

use crate::cli::{
    DatasetAddArgs, DatasetArgs, DatasetCommands, DatasetFields, DatasetListArgs, DatasetRef,
    DatasetShowArgs, DatasetUpdateArgs, GlobalArgs, MaterializeArgs,
};
use crate::commands::common::{self, find_dataset, find_project, or_dash};
use crate::context::RuntimeContext;
use anyhow::{Context, Result};
use mf_core::{Dataset, DatasetSpec};
use mf_engine::{current_nonce, Materializer};
use mf_meta::store::datasets;
use mf_meta::MetaDb;

/// Execute the dataset command.
pub async fn execute(args: &DatasetArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let meta = ctx.open_meta()?;
    match &args.command {
        DatasetCommands::Add(add) => execute_add(add, &meta),
        DatasetCommands::List(list) => execute_list(list, &meta),
        DatasetCommands::Show(show) => execute_show(show, &meta),
        DatasetCommands::Update(update) => execute_update(update, &meta),
        DatasetCommands::Delete(delete) => execute_delete(delete, &meta),
        DatasetCommands::Materialize(materialize) => {
            execute_materialize(materialize, &ctx, &meta).await
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Overwrite `spec` with every type-conditional field given on the command
/// line. Empty strings clear a field.
pub(crate) fn apply_fields(spec: &mut DatasetSpec, fields: &DatasetFields) {
    if fields.source_table.is_some() {
        spec.source_table = non_empty(&fields.source_table);
    }
    if fields.timestamp_col.is_some() {
        spec.timestamp_col = non_empty(&fields.timestamp_col);
    }
    if !fields.eol_definition.is_empty() {
        spec.eol_definition = fields.eol_definition.clone();
    }
    if !fields.feature_lookup_definition.is_empty() {
        spec.feature_lookup_definition = fields.feature_lookup_definition.clone();
    }
    if fields.percentage.is_some() {
        spec.percentage = fields.percentage;
    }
    if fields.source_table_eval.is_some() {
        spec.source_table_eval = non_empty(&fields.source_table_eval);
    }
    if fields.split_time_column.is_some() {
        spec.split_time_column = non_empty(&fields.split_time_column);
    }
}

fn execute_add(args: &DatasetAddArgs, meta: &MetaDb) -> Result<()> {
    let project = find_project(meta, &args.dataset.project)?;
    let name = args.dataset.name.trim();
    if name.is_empty() {
        anyhow::bail!("Dataset name cannot be empty");
    }
    let mut spec = DatasetSpec {
        name: name.to_string(),
        target: args.target.trim().to_string(),
        source_type: args.source_type.to_string(),
        evaluation_type: args.evaluation_type.to_string(),
        ..Default::default()
    };
    apply_fields(&mut spec, &args.fields);

    let dataset = datasets::create_dataset(meta.conn(), project.id, &spec)
        .with_context(|| format!("Failed to create dataset '{name}'"))?;
    println!(
        "Created dataset '{}' in project '{}' (id {})",
        dataset.name(),
        project.name(),
        dataset.id
    );
    Ok(())
}

fn execute_list(args: &DatasetListArgs, meta: &MetaDb) -> Result<()> {
    let listings = match &args.project {
        Some(name) => {
            let project = find_project(meta, name)?;
            datasets::list_datasets(meta.conn(), project.id)
                .context("Failed to list datasets")?
                .into_iter()
                .map(|dataset| mf_meta::DatasetListing {
                    project_name: project.name().to_string(),
                    dataset,
                })
                .collect()
        }
        None => datasets::list_all_datasets(meta.conn()).context("Failed to list datasets")?,
    };
    if args.json {
        return common::print_json(&listings);
    }

    let rows: Vec<Vec<String>> = listings
        .iter()
        .map(|l| {
            vec![
                l.dataset.id.to_string(),
                l.project_name.clone(),
                l.dataset.name().to_string(),
                l.dataset.spec.source_type.clone(),
                l.dataset.spec.evaluation_type.clone(),
                or_dash(l.dataset.training_table_name.as_deref()),
            ]
        })
        .collect();
    common::print_table(
        &["ID", "PROJECT", "NAME", "SOURCE", "SPLIT", "TRAINING TABLE"],
        &rows,
    );
    Ok(())
}

fn execute_show(args: &DatasetShowArgs, meta: &MetaDb) -> Result<()> {
    let project = find_project(meta, &args.dataset.project)?;
    let dataset = find_dataset(meta, &project, &args.dataset.name)?;
    if args.json {
        return common::print_json(&dataset);
    }
    print_dataset(&dataset);
    Ok(())
}

fn print_dataset(dataset: &Dataset) {
    let spec = &dataset.spec;
    println!("Dataset: {} (id {})", dataset.name(), dataset.id);
    println!("  target:          {}", or_dash(Some(&spec.target)));
    println!("  source type:     {}", spec.source_type);
    println!("  source table:    {}", or_dash(spec.source_table.as_deref()));
    if let Some(col) = &spec.timestamp_col {
        println!("  timestamp col:   {col}");
    }
    if !spec.eol_definition.is_empty() {
        println!("  eol definition:  {}", spec.eol_definition.join(", "));
    }
    if !spec.feature_lookup_definition.is_empty() {
        println!(
            "  feature lookups: {}",
            spec.feature_lookup_definition.join(", ")
        );
    }
    println!("  evaluation type: {}", spec.evaluation_type);
    if let Some(p) = spec.percentage {
        println!("  percentage:      {p}");
    }
    if let Some(eval) = &spec.source_table_eval {
        println!("  eval source:     {eval}");
    }
    if let Some(col) = &spec.split_time_column {
        println!("  split column:    {col}");
    }
    match dataset.materialized_tables() {
        Some((training, eval)) => {
            println!("  training table:  {training}");
            println!("  eval table:      {eval}");
        }
        None => println!("  not materialized"),
    }
}

fn execute_update(args: &DatasetUpdateArgs, meta: &MetaDb) -> Result<()> {
    let project = find_project(meta, &args.dataset.project)?;
    let dataset = find_dataset(meta, &project, &args.dataset.name)?;
    let mut spec = dataset.spec.clone();
    if let Some(rename) = &args.rename {
        spec.name = rename.trim().to_string();
    }
    if let Some(target) = &args.target {
        spec.target = target.trim().to_string();
    }
    if let Some(source_type) = args.source_type {
        spec.source_type = source_type.to_string();
    }
    if let Some(evaluation_type) = args.evaluation_type {
        spec.evaluation_type = evaluation_type.to_string();
    }
    apply_fields(&mut spec, &args.fields);
    if spec == dataset.spec {
        println!("Nothing to update for dataset '{}'", dataset.name());
        return Ok(());
    }

    let updated = datasets::update_dataset(meta.conn(), dataset.id, &spec)
        .with_context(|| format!("Failed to update dataset '{}'", dataset.name()))?;
    println!("Updated dataset '{}'", updated.name());
    if updated.materialized {
        println!("  note: existing tables were built from the previous definition; re-materialize to apply changes");
    }
    Ok(())
}

fn execute_delete(args: &DatasetRef, meta: &MetaDb) -> Result<()> {
    let project = find_project(meta, &args.project)?;
    let dataset = find_dataset(meta, &project, &args.name)?;
    meta.transaction(|conn| datasets::delete_dataset(conn, dataset.id))
        .with_context(|| format!("Failed to delete dataset '{}'", dataset.name()))?;
    println!("Deleted dataset '{}'", dataset.name());
    if let Some((training, eval)) = dataset.materialized_tables() {
        println!("  tables {training} and {eval} were left in the warehouse");
    }
    Ok(())
}

async fn execute_materialize(
    args: &MaterializeArgs,
    ctx: &RuntimeContext,
    meta: &MetaDb,
) -> Result<()> {
    let project = find_project(meta, &args.dataset.project)?;
    let dataset = find_dataset(meta, &project, &args.dataset.name)?;
    let warehouse = ctx.warehouse()?;

    let result = Materializer::new(meta, warehouse.as_ref(), ctx.config.dialect())
        .materialize(dataset.id, args.split_time.as_deref(), current_nonce())
        .await
        .with_context(|| format!("Failed to materialize dataset '{}'", dataset.name()))?;

    println!("Materialized dataset '{}'", dataset.name());
    println!("  training table: {}", result.training_table);
    println!("  eval table:     {}", result.eval_table);
    println!("  statements:     {}", result.statements_executed);
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    Ok(())
}
