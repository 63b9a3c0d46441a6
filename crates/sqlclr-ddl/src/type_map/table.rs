//! Fixed mapping from host value types to SQL Server column types
//!
//! Native value types and their nullable adapter counterparts share a column
//! type. Lookups never fall back to a default: a type missing from the table
//! is an error.

use std::collections::HashMap;
use std::sync::LazyLock;

use sqlclr_core::{ClrError, ClrResult, SourceType};

static TYPE_MAP: LazyLock<HashMap<SourceType, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (SourceType::Bool, "bit"),
        (SourceType::SqlBoolean, "bit"),
        (SourceType::Byte, "tinyint"),
        (SourceType::SqlByte, "tinyint"),
        (SourceType::Int16, "smallint"),
        (SourceType::SqlInt16, "smallint"),
        (SourceType::Int32, "int"),
        (SourceType::SqlInt32, "int"),
        (SourceType::Int64, "bigint"),
        (SourceType::SqlInt64, "bigint"),
        (SourceType::Single, "real"),
        (SourceType::SqlSingle, "real"),
        (SourceType::Double, "float"),
        (SourceType::SqlDouble, "float"),
        (SourceType::Decimal, "decimal"),
        (SourceType::SqlDecimal, "decimal"),
        (SourceType::DateTime, "datetime2"),
        (SourceType::DateTimeOffset, "datetimeoffset"),
        (SourceType::String, "nvarchar(max)"),
        (SourceType::SqlString, "nvarchar(max)"),
        (SourceType::SqlBinary, "varbinary(max)"),
    ])
});

/// Resolves the column type for a host value type
///
/// # Example
///
/// ```
/// use sqlclr_core::SourceType;
/// use sqlclr_ddl::resolve_column_type;
///
/// assert_eq!(resolve_column_type(&SourceType::SqlInt32).unwrap(), "int");
/// assert!(resolve_column_type(&SourceType::Guid).is_err());
/// ```
pub fn resolve_column_type(ty: &SourceType) -> ClrResult<&'static str> {
    TYPE_MAP
        .get(ty)
        .copied()
        .ok_or_else(|| ClrError::unsupported_type(ty))
}

/// Returns true when `ty` has a column type
pub fn is_supported_type(ty: &SourceType) -> bool {
    TYPE_MAP.contains_key(ty)
}

/// All mapped host types with their column types, in no particular order
pub fn supported_types() -> impl Iterator<Item = (&'static SourceType, &'static str)> {
    TYPE_MAP.iter().map(|(ty, sql)| (ty, *sql))
}
