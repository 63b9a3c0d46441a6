//! SQLCLR Core - descriptors for externally hosted database routines
//!
//! This crate provides the data model that the statement generator in
//! `sqlclr-ddl` works from. It defines:
//!
//! - `ModuleSource` - Trait a hosting application implements to describe a compiled module
//! - `ModuleManifest` - TOML/JSON backed `ModuleSource` with a file or inline payload
//! - `ExportedType`, `MethodDescriptor`, `FunctionMarker` - Routine metadata
//! - `Routine` - A qualifying routine, enumerated in discovery order
//! - `SourceType`, `PermissionSet` - Host value types and sandboxing levels

mod error;
mod manifest;
mod module;
mod types;

#[cfg(test)]
mod manifest_tests;

pub use error::*;
pub use manifest::*;
pub use module::*;
pub use types::*;
