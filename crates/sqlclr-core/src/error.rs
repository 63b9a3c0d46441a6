//! Error types for SQLCLR statement generation

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for module description and statement generation
#[derive(Error, Debug)]
pub enum ClrError {
    /// A parameter, return or column type has no SQL counterpart
    #[error(
        "Unsupported type: {ty}{}",
        .context.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
    )]
    UnsupportedType { ty: String, context: Option<String> },

    /// A routine lacks the marker (or the row-fill routine) it needs
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Failed to read payload of module [{module}] from {}: {source}", .path.display())]
    PayloadRead {
        module: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClrError {
    /// Creates an `UnsupportedType` error without usage context
    pub fn unsupported_type(ty: impl ToString) -> Self {
        ClrError::UnsupportedType {
            ty: ty.to_string(),
            context: None,
        }
    }

    /// Attaches a usage description to an `UnsupportedType` error.
    /// Other variants are returned unchanged.
    pub fn in_context(self, context: impl Into<String>) -> Self {
        match self {
            ClrError::UnsupportedType { ty, .. } => ClrError::UnsupportedType {
                ty,
                context: Some(context.into()),
            },
            other => other,
        }
    }

    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, ClrError::UnsupportedType { .. })
    }

    pub fn is_missing_metadata(&self) -> bool {
        matches!(self, ClrError::MissingMetadata(_))
    }
}

/// Result type alias for SQLCLR operations
pub type ClrResult<T> = std::result::Result<T, ClrError>;
