//! Declarative module manifests
//!
//! A manifest describes a module in TOML or JSON instead of code:
//!
//! ```toml
//! name = "Shipwreck.Functions"
//! version = "1.0.0"
//! permission_set = "safe"
//! payload = { file = "Shipwreck.Functions.dll" }
//!
//! [[types]]
//! full_name = "Shipwreck.Functions.Text"
//!
//! [[types.methods]]
//! name = "Negate"
//! return_type = "bool"
//! parameters = [{ name = "value", type = "bool" }]
//! function = {}
//! ```
//!
//! Relative payload paths are resolved against the manifest's directory when
//! the manifest is read with [`ModuleManifest::load`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{ClrError, ClrResult, ExportedType, ModuleSource, PermissionSet};

/// Where a module's binary image comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Read from a file each time it is needed
    File(PathBuf),
    /// Held in memory
    Bytes(Vec<u8>),
}

/// A module described by data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub permission_set: PermissionSet,
    pub payload: Payload,
    #[serde(default)]
    pub types: Vec<ExportedType>,
}

impl ModuleManifest {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            version: None,
            permission_set: PermissionSet::Default,
            payload,
            types: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_permission_set(mut self, permission_set: PermissionSet) -> Self {
        self.permission_set = permission_set;
        self
    }

    pub fn with_type(mut self, exported_type: ExportedType) -> Self {
        self.types.push(exported_type);
        self
    }

    /// Parses a manifest from TOML
    pub fn from_toml_str(s: &str) -> ClrResult<Self> {
        toml::from_str(s).map_err(|e| ClrError::Manifest(e.to_string()))
    }

    /// Parses a manifest from JSON
    pub fn from_json_str(s: &str) -> ClrResult<Self> {
        serde_json::from_str(s).map_err(|e| ClrError::Manifest(e.to_string()))
    }

    /// Reads a manifest file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn load(path: impl AsRef<Path>) -> ClrResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut manifest = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&contents)?,
            _ => Self::from_toml_str(&contents)?,
        };

        if let (Payload::File(file), Some(dir)) = (&manifest.payload, path.parent()) {
            if file.is_relative() {
                manifest.payload = Payload::File(dir.join(file));
            }
        }

        tracing::debug!(
            module = %manifest.name,
            manifest = %path.display(),
            types = manifest.types.len(),
            "loaded module manifest"
        );
        Ok(manifest)
    }

    /// Serializes the manifest as TOML
    pub fn to_toml_string(&self) -> ClrResult<String> {
        toml::to_string(self).map_err(|e| ClrError::Manifest(e.to_string()))
    }
}

impl ModuleSource for ModuleManifest {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn permission_set(&self) -> PermissionSet {
        self.permission_set
    }

    fn exported_types(&self) -> &[ExportedType] {
        &self.types
    }

    fn read_payload(&self) -> ClrResult<Vec<u8>> {
        match &self.payload {
            Payload::Bytes(bytes) => Ok(bytes.clone()),
            Payload::File(path) => std::fs::read(path).map_err(|source| ClrError::PayloadRead {
                module: self.name.clone(),
                path: path.clone(),
                source,
            }),
        }
    }
}
