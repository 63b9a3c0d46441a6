//! Deployment configuration
//!
//! Settings shared by every statement a [`crate::DeploymentGenerator`]
//! produces. Per-call arguments take precedence over these values.

use serde::{Deserialize, Serialize};
use std::path::Path;

use sqlclr_core::{ClrError, ClrResult, PermissionSet};

/// Batch separator understood by sqlcmd and SSMS
pub const DEFAULT_BATCH_SEPARATOR: &str = "GO";

fn default_batch_separator() -> String {
    DEFAULT_BATCH_SEPARATOR.to_string()
}

/// Configuration for statement generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Schema that qualifies routine names; unqualified when `None`
    #[serde(default)]
    pub schema: Option<String>,
    /// Permission set used when neither the call nor the module asks for one
    #[serde(default)]
    pub permission_set: PermissionSet,
    /// Line written after every statement in script output
    #[serde(default = "default_batch_separator")]
    pub batch_separator: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            schema: None,
            permission_set: PermissionSet::Default,
            batch_separator: default_batch_separator(),
        }
    }
}

impl DeployConfig {
    /// Creates a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_permission_set(mut self, permission_set: PermissionSet) -> Self {
        self.permission_set = permission_set;
        self
    }

    pub fn with_batch_separator(mut self, separator: impl Into<String>) -> Self {
        self.batch_separator = separator.into();
        self
    }

    /// Parses a config from TOML
    pub fn from_toml_str(s: &str) -> ClrResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ClrError::Manifest(e.to_string()))?;
        if config.batch_separator.trim().is_empty() {
            return Err(ClrError::Manifest(
                "batch_separator must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Reads a TOML config file
    pub fn load(path: impl AsRef<Path>) -> ClrResult<Self> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(config = %path.display(), "loaded deploy config");
        Ok(config)
    }
}
