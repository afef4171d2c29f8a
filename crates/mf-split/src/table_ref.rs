//! Table and column reference parsing.
//!
//! References are entered by hand, so each one is run through the SQL
//! parser as the relation of `SELECT * FROM <reference>` and must come back
//! as a bare object name: no alias, no join, no trailing clause. Column names
//! get the same treatment as the sole item of a projection.

use crate::error::{SplitError, SplitResult};
use mf_core::sql_utils::split_comma_list;
use mf_core::TableName;
use sqlparser::ast::{Expr, SelectItem, SetExpr, Statement, TableFactor};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Parse one table reference of one to three dot-separated identifiers.
pub fn parse_table_ref(reference: &str) -> SplitResult<TableName> {
    let reference = reference.trim();
    let invalid = |message: &str| SplitError::InvalidTableReference {
        reference: reference.to_string(),
        message: message.to_string(),
    };
    if reference.is_empty() {
        return Err(invalid("empty reference"));
    }

    let sql = format!("SELECT * FROM {reference}");
    let statements =
        Parser::parse_sql(&GenericDialect {}, &sql).map_err(|e| invalid(&e.to_string()))?;

    let [Statement::Query(query)] = statements.as_slice() else {
        return Err(invalid("not a single table reference"));
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Err(invalid("not a single table reference"));
    };
    let [from] = select.from.as_slice() else {
        return Err(invalid("not a single table reference"));
    };
    if !from.joins.is_empty() {
        return Err(invalid("joins are not allowed"));
    }
    let TableFactor::Table {
        name, alias: None, ..
    } = &from.relation
    else {
        return Err(invalid("not a plain table name"));
    };

    let parts = name.0.len();
    if !(1..=3).contains(&parts) {
        return Err(invalid("expected table, schema.table or catalog.schema.table"));
    }
    // Qualification counts dots, so quoted identifiers may not contain any.
    if name.to_string() != reference || reference.matches('.').count() + 1 != parts {
        return Err(invalid("unexpected text around the table name"));
    }

    Ok(TableName::new(reference))
}

/// Parse a single column name, reporting failures against `field`.
pub fn parse_column_name(column: &str, field: &'static str) -> SplitResult<String> {
    let column = column.trim();
    let invalid = |message: String| SplitError::InvalidSplitParameter { field, message };

    let sql = format!("SELECT {column} FROM t");
    let statements = Parser::parse_sql(&GenericDialect {}, &sql)
        .map_err(|e| invalid(format!("'{column}' is not a column name: {e}")))?;
    let not_a_column = || invalid(format!("'{column}' is not a single column name"));

    let [Statement::Query(query)] = statements.as_slice() else {
        return Err(not_a_column());
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Err(not_a_column());
    };
    let [SelectItem::UnnamedExpr(Expr::Identifier(ident))] = select.projection.as_slice() else {
        return Err(not_a_column());
    };
    if ident.to_string() != column {
        return Err(not_a_column());
    }
    Ok(column.to_string())
}

/// Parse a comma-separated list of table references. Empty entries are
/// dropped; an entirely empty list yields an empty vector.
pub fn parse_table_list(text: &str) -> SplitResult<Vec<TableName>> {
    split_comma_list(text)
        .iter()
        .map(|r| parse_table_ref(r))
        .collect()
}
