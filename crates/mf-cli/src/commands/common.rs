//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use mf_core::{Dataset, Project};
use mf_meta::store::{datasets, projects};
use mf_meta::MetaDb;
use serde::Serialize;

/// Look up a project by name.
pub(crate) fn find_project(meta: &MetaDb, name: &str) -> Result<Project> {
    projects::get_project_by_name(meta.conn(), name)
        .context("Failed to read projects")?
        .with_context(|| format!("Project '{name}' not found"))
}

/// Look up a dataset by project and dataset name.
pub(crate) fn find_dataset(meta: &MetaDb, project: &Project, name: &str) -> Result<Dataset> {
    datasets::get_dataset_by_name(meta.conn(), project.id, name)
        .context("Failed to read datasets")?
        .with_context(|| format!("Dataset '{name}' not found in project '{}'", project.name()))
}

/// Render an optional value, `-` when absent.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Pretty-printed JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize JSON output")?;
    println!("{output}");
    Ok(())
}

/// Calculate column widths for a table given headers and rows.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Format a table: a left-aligned header row, a dashed separator and each
/// data row, columns separated by two spaces.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = calculate_column_widths(headers, rows);
    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.iter().map(|h| h.to_string()).collect()));
    out.push(line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        out.push(line(row.clone()));
    }
    out.join("\n")
}

/// Print a formatted table to stdout, or a note when there are no rows.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(0 rows)");
        return;
    }
    println!("{}", format_table(headers, rows));
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
