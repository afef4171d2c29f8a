//! SQL text helpers shared by the split generator and the remote clients.

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a value as a single-quoted SQL string literal.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Turn a human-entered name into an identifier segment by replacing spaces
/// with underscores.
///
/// # Examples
/// ```
/// use mf_core::sql_utils::sanitize_name;
/// assert_eq!(sanitize_name("churn model v2"), "churn_model_v2");
/// ```
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Whether `name` can be used unquoted as one segment of a table or model
/// name: ASCII letters, digits and underscores, not starting with a digit.
///
/// # Examples
/// ```
/// use mf_core::sql_utils::is_plain_identifier;
/// assert!(is_plain_identifier("orders_v2"));
/// assert!(!is_plain_identifier("orders.v2"));
/// ```
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Qualify a table reference against a default catalog and schema.
///
/// - no dot: `table` becomes `catalog.schema.table`
/// - one dot: `schema.table` becomes `catalog.schema.table`
/// - two or more dots: already fully qualified, returned as-is
///
/// Validated split sources never have more than three parts, so the last
/// case only ever sees `catalog.schema.table`.
///
/// # Examples
/// ```
/// use mf_core::sql_utils::qualify_table_ref;
/// assert_eq!(qualify_table_ref("sales", "cat", "sch"), "cat.sch.sales");
/// assert_eq!(qualify_table_ref("raw.sales", "cat", "sch"), "cat.raw.sales");
/// assert_eq!(qualify_table_ref("other.raw.sales", "cat", "sch"), "other.raw.sales");
/// ```
pub fn qualify_table_ref(reference: &str, catalog: &str, schema: &str) -> String {
    let reference = reference.trim();
    match reference.matches('.').count() {
        0 => format!("{catalog}.{schema}.{reference}"),
        1 => format!("{catalog}.{reference}"),
        _ => reference.to_string(),
    }
}

/// Parse comma-separated free text into an ordered list, trimming whitespace
/// and dropping empty entries. Duplicates are kept.
///
/// # Examples
/// ```
/// use mf_core::sql_utils::split_comma_list;
/// assert_eq!(split_comma_list(" a, b,,a "), vec!["a", "b", "a"]);
/// ```
pub fn split_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
