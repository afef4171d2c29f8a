//! Project management commands.

use crate::cli::{
    GlobalArgs, ListArgs, NameArgs, ProjectAddArgs, ProjectArgs, ProjectCommands, ProjectFields,
    ProjectUpdateArgs, ShowArgs,
};
use crate::commands::common::{self, find_project, or_dash};
use crate::context::RuntimeContext;
use anyhow::{Context, Result};
use mf_core::ProjectSpec;
use mf_meta::store::projects;

/// Execute the project command.
pub async fn execute(args: &ProjectArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let meta = ctx.open_meta()?;
    match &args.command {
        ProjectCommands::Add(add) => execute_add(add, &meta),
        ProjectCommands::List(list) => execute_list(list, &meta),
        ProjectCommands::Show(show) => execute_show(show, &meta),
        ProjectCommands::Update(update) => execute_update(update, &meta),
        ProjectCommands::Delete(delete) => execute_delete(delete, &meta),
    }
}

/// Overwrite `spec` with every field given on the command line.
pub(crate) fn apply_fields(spec: &mut ProjectSpec, fields: &ProjectFields) {
    let set = |target: &mut String, value: &Option<String>| {
        if let Some(v) = value {
            *target = v.trim().to_string();
        }
    };
    set(&mut spec.description, &fields.description);
    set(&mut spec.catalog, &fields.catalog);
    set(&mut spec.schema, &fields.schema);
    set(&mut spec.git_url, &fields.git_url);
    set(&mut spec.training_notebook, &fields.training_notebook);
}

fn execute_add(args: &ProjectAddArgs, meta: &mf_meta::MetaDb) -> Result<()> {
    let name = args.name.trim();
    if name.is_empty() {
        anyhow::bail!("Project name cannot be empty");
    }
    let mut spec = ProjectSpec {
        name: name.to_string(),
        ..Default::default()
    };
    apply_fields(&mut spec, &args.fields);

    let project = projects::create_project(meta.conn(), &spec)
        .with_context(|| format!("Failed to create project '{name}'"))?;
    println!("Created project '{}' (id {})", project.name(), project.id);
    if !project.has_namespace() {
        println!("  note: set --catalog and --schema before materializing datasets");
    }
    Ok(())
}

fn execute_list(args: &ListArgs, meta: &mf_meta::MetaDb) -> Result<()> {
    let projects = projects::list_projects(meta.conn()).context("Failed to list projects")?;
    if args.json {
        return common::print_json(&projects);
    }

    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name().to_string(),
                or_dash(Some(&p.spec.catalog)),
                or_dash(Some(&p.spec.schema)),
                or_dash(Some(&p.spec.training_notebook)),
            ]
        })
        .collect();
    common::print_table(&["ID", "NAME", "CATALOG", "SCHEMA", "NOTEBOOK"], &rows);
    Ok(())
}

fn execute_show(args: &ShowArgs, meta: &mf_meta::MetaDb) -> Result<()> {
    let project = find_project(meta, &args.name)?;
    if args.json {
        return common::print_json(&project);
    }

    println!("Project: {} (id {})", project.name(), project.id);
    println!("  description: {}", or_dash(Some(&project.spec.description)));
    println!("  catalog:     {}", or_dash(Some(&project.spec.catalog)));
    println!("  schema:      {}", or_dash(Some(&project.spec.schema)));
    println!("  git url:     {}", or_dash(Some(&project.spec.git_url)));
    println!("  notebook:    {}", project.notebook_path());
    Ok(())
}

fn execute_update(args: &ProjectUpdateArgs, meta: &mf_meta::MetaDb) -> Result<()> {
    let project = find_project(meta, &args.name)?;
    let mut spec = project.spec.clone();
    if let Some(rename) = &args.rename {
        spec.name = rename.trim().to_string();
    }
    apply_fields(&mut spec, &args.fields);
    if spec == project.spec {
        println!("Nothing to update for project '{}'", project.name());
        return Ok(());
    }

    let updated = projects::update_project(meta.conn(), project.id, &spec)
        .with_context(|| format!("Failed to update project '{}'", project.name()))?;
    println!("Updated project '{}'", updated.name());
    Ok(())
}

fn execute_delete(args: &NameArgs, meta: &mf_meta::MetaDb) -> Result<()> {
    let project = find_project(meta, &args.name)?;
    meta.transaction(|conn| projects::delete_project(conn, project.id))
        .with_context(|| format!("Failed to delete project '{}'", project.name()))?;
    println!("Deleted project '{}'", project.name());
    Ok(())
}
