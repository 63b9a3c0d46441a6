//! Host value types and permission levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value type as declared by the hosting runtime
///
/// Native value types come in pairs with their nullable database-adapter
/// counterparts (`Int32` / `SqlInt32`). Both members of a pair describe the
/// same column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// No value (return type of row-fill routines)
    Void,
    /// Boolean
    Bool,
    /// Nullable boolean
    SqlBoolean,
    /// Unsigned 8-bit integer
    Byte,
    /// Nullable unsigned 8-bit integer
    SqlByte,
    /// 16-bit signed integer
    Int16,
    /// Nullable 16-bit signed integer
    SqlInt16,
    /// 32-bit signed integer
    Int32,
    /// Nullable 32-bit signed integer
    SqlInt32,
    /// 64-bit signed integer
    Int64,
    /// Nullable 64-bit signed integer
    SqlInt64,
    /// 32-bit floating point
    Single,
    /// Nullable 32-bit floating point
    SqlSingle,
    /// 64-bit floating point
    Double,
    /// Nullable 64-bit floating point
    SqlDouble,
    /// Arbitrary precision decimal
    Decimal,
    /// Nullable arbitrary precision decimal
    SqlDecimal,
    /// Timestamp without zone
    DateTime,
    /// Timestamp with zone offset
    DateTimeOffset,
    /// Text
    String,
    /// Nullable text
    SqlString,
    /// Nullable binary blob
    SqlBinary,
    /// Single UTF-16 code unit
    Char,
    /// 128-bit identifier
    Guid,
    /// Untyped reference
    Object,
    /// Any other host type, by full name
    Named(std::string::String),
    /// Reference (out) parameter of the inner type
    ByRef(Box<SourceType>),
    /// Array of the inner type
    Array(Box<SourceType>),
}

impl SourceType {
    pub fn by_ref(inner: SourceType) -> Self {
        SourceType::ByRef(Box::new(inner))
    }

    pub fn array(inner: SourceType) -> Self {
        SourceType::Array(Box::new(inner))
    }

    /// Returns the type produced per element: the inner type of a container,
    /// or the type itself for plain value types.
    pub fn element_type(&self) -> &SourceType {
        match self {
            SourceType::ByRef(inner) | SourceType::Array(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Named(name) => f.write_str(name),
            SourceType::ByRef(inner) => write!(f, "{inner}&"),
            SourceType::Array(inner) => write!(f, "{inner}[]"),
            // Unit variants print as their variant name
            other => write!(f, "{other:?}"),
        }
    }
}

/// Code access level requested when a module is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSet {
    /// Leave the choice to the server (no clause is rendered)
    #[default]
    Default,
    Safe,
    ExternalAccess,
    Unsafe,
}

impl PermissionSet {
    /// Returns the `PERMISSION_SET` keyword, or `None` for `Default`
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            PermissionSet::Default => None,
            PermissionSet::Safe => Some("SAFE"),
            PermissionSet::ExternalAccess => Some("EXTERNAL_ACCESS"),
            PermissionSet::Unsafe => Some("UNSAFE"),
        }
    }

    /// Parses a permission set from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "default" => Some(PermissionSet::Default),
            "safe" => Some(PermissionSet::Safe),
            "external_access" | "externalaccess" => Some(PermissionSet::ExternalAccess),
            "unsafe" => Some(PermissionSet::Unsafe),
            _ => None,
        }
    }
}
