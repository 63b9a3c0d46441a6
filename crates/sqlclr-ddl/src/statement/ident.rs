//! T-SQL identifier and literal quoting

/// Quote an identifier using SQL Server's square bracket syntax
///
/// Closing brackets inside the identifier are doubled.
///
/// # Example
///
/// ```
/// use sqlclr_ddl::quote_identifier;
///
/// assert_eq!(quote_identifier("Negate"), "[Negate]");
/// assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
/// ```
pub fn quote_identifier(ident: &str) -> String {
    let escaped = ident.replace(']', "]]");
    format!("[{}]", escaped)
}

/// Quote a Unicode string literal (`N'...'`), doubling single quotes
///
/// # Example
///
/// ```
/// use sqlclr_ddl::quote_nstring;
///
/// assert_eq!(quote_nstring("it's"), "N'it''s'");
/// ```
pub fn quote_nstring(s: &str) -> String {
    let escaped = s.replace('\'', "''");
    format!("N'{}'", escaped)
}

/// Returns `[schema].[name]`, or `[name]` without a schema
pub fn qualified_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) => format!("{}.{}", quote_identifier(s), quote_identifier(name)),
        None => quote_identifier(name),
    }
}
