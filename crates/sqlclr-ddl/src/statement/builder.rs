//! Statement builders
//!
//! Each `append_*` function renders exactly one statement, terminated by a
//! newline, onto the end of `buf`. Fallible builders do all their lookups
//! before writing, so a failed call leaves `buf` untouched.

use sqlclr_core::{ClrResult, ModuleSource, PermissionSet, Routine};

use super::ident::{qualified_name, quote_identifier};
use crate::signature::{ReturnShape, SqlField, project};

/// Indent of the first entry of a parameter or column list
const FIRST_ENTRY: &str = "      ";
/// Prefix of every following entry
const NEXT_ENTRY: &str = "    , ";

/// Appends `CREATE ASSEMBLY` for a module, reading its payload once.
pub fn append_create_module<M: ModuleSource + ?Sized>(
    buf: &mut String,
    module: &M,
    permission_set: PermissionSet,
) -> ClrResult<()> {
    let payload = module.read_payload()?;
    append_create_module_from_bytes(buf, module.name(), &payload, permission_set);
    Ok(())
}

/// Appends `CREATE ASSEMBLY [name] FROM 0x...` for an in-memory payload.
///
/// The payload is written as uppercase hex without separators. A
/// `WITH PERMISSION_SET` clause follows unless `permission_set` is
/// [`PermissionSet::Default`].
pub fn append_create_module_from_bytes(
    buf: &mut String,
    name: &str,
    payload: &[u8],
    permission_set: PermissionSet,
) {
    buf.push_str("CREATE ASSEMBLY ");
    buf.push_str(&quote_identifier(name));
    buf.push_str(" FROM 0x");
    buf.push_str(&hex::encode_upper(payload));
    if let Some(keyword) = permission_set.keyword() {
        buf.push_str(" WITH PERMISSION_SET = ");
        buf.push_str(keyword);
    }
    buf.push('\n');
}

/// Appends `CREATE FUNCTION` for a routine.
///
/// `schema` qualifies the function name and `name` replaces the routine's
/// SQL-visible name; the `EXTERNAL NAME` binding always names the module,
/// the declaring type and the member.
pub fn append_create_routine(
    buf: &mut String,
    routine: &Routine<'_>,
    schema: Option<&str>,
    name: Option<&str>,
) -> ClrResult<()> {
    let signature = project(routine)?;
    let name = name.unwrap_or(routine.name());

    let mut sql = String::new();
    sql.push_str("CREATE FUNCTION ");
    sql.push_str(&qualified_name(schema, name));
    sql.push('\n');

    sql.push_str("(\n");
    append_entries(&mut sql, &signature.parameters, "@");
    sql.push_str(")\n");

    match &signature.returns {
        ReturnShape::Scalar(sql_type) => {
            sql.push_str("RETURNS ");
            sql.push_str(sql_type);
            sql.push('\n');
        }
        ReturnShape::TableValued(columns) => {
            sql.push_str("RETURNS TABLE\n");
            sql.push_str("(\n");
            append_entries(&mut sql, columns, "");
            sql.push_str(")\n");
        }
    }

    sql.push_str("AS\n");
    sql.push_str("EXTERNAL NAME ");
    sql.push_str(&quote_identifier(routine.module_name()));
    sql.push('.');
    sql.push_str(&quote_identifier(&routine.declaring_type().full_name));
    sql.push('.');
    sql.push_str(&quote_identifier(routine.member_name()));
    sql.push('\n');

    buf.push_str(&sql);
    Ok(())
}

fn append_entries(buf: &mut String, fields: &[SqlField], sigil: &str) {
    for (i, field) in fields.iter().enumerate() {
        buf.push_str(if i == 0 { FIRST_ENTRY } else { NEXT_ENTRY });
        buf.push_str(sigil);
        buf.push_str(&field.name);
        buf.push(' ');
        buf.push_str(field.sql_type);
        buf.push('\n');
    }
}

/// Appends `DROP ASSEMBLY [name]`
pub fn append_drop_module(buf: &mut String, name: &str) {
    buf.push_str("DROP ASSEMBLY ");
    buf.push_str(&quote_identifier(name));
    buf.push('\n');
}

/// Appends `DROP FUNCTION [schema].[name]`, or `DROP FUNCTION [name]`
pub fn append_drop_routine(buf: &mut String, schema: Option<&str>, name: &str) {
    buf.push_str("DROP FUNCTION ");
    buf.push_str(&qualified_name(schema, name));
    buf.push('\n');
}

/// Appends the `clr enabled` configuration change and `RECONFIGURE`
pub fn append_configure_clr(buf: &mut String, enabled: bool) {
    buf.push_str("EXEC sp_configure 'clr enabled', ");
    buf.push(if enabled { '1' } else { '0' });
    buf.push_str(";\n");
    buf.push_str("RECONFIGURE;\n");
}
