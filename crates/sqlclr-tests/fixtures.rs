//! Sample modules and helpers shared by the deployment tests.
//!
//! Modules are built in code with the `sqlclr-core` builders, or written to a
//! temporary directory as a TOML manifest plus payload file so the loading
//! path is exercised too.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlclr_tests::fixtures::{deploy, negate_module};
//! use sqlclr_ddl::DeploymentGenerator;
//!
//! let generator = DeploymentGenerator::new();
//! let catalog = deploy(&generator, &negate_module(), None).unwrap();
//! assert!(catalog.has_module("M"));
//! ```

use anyhow::{Context, Result};
use sqlclr_core::{
    ExportedType, FunctionMarker, MethodDescriptor, ModuleManifest, ModuleSource, Payload,
    PermissionSet, SourceType,
};
use sqlclr_ddl::DeploymentGenerator;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::catalog::SimulatedCatalog;

/// Image bytes of the sample module
pub const SAMPLE_PAYLOAD: &[u8] = &[0x4D, 0x5A, 0x90, 0x00, 0x03];

/// Module `M` with one routine, `M.Functions.Negate(bool) -> bool`
pub fn negate_module() -> ModuleManifest {
    ModuleManifest::new("M", Payload::Bytes(vec![0x0A, 0xFF])).with_type(
        ExportedType::new("M.Functions").with_method(
            MethodDescriptor::function("Negate", SourceType::Bool)
                .with_parameter("value", SourceType::Bool),
        ),
    )
}

/// Module with scalar and table-valued routines spread over two types,
/// plus methods that must not be picked up
pub fn sample_module() -> ModuleManifest {
    ModuleManifest::new("Sample.Functions", Payload::Bytes(SAMPLE_PAYLOAD.to_vec()))
        .with_version("1.0.0")
        .with_type(
            ExportedType::new("Sample.Functions.Math")
                .with_method(
                    MethodDescriptor::function("Add", SourceType::Int64)
                        .with_parameter("a", SourceType::Int64)
                        .with_parameter("b", SourceType::Int64),
                )
                .with_method(
                    MethodDescriptor::function("Round", SourceType::SqlDecimal)
                        .with_parameter("value", SourceType::SqlDecimal)
                        .with_marker(FunctionMarker::new().with_name("RoundHalfEven")),
                )
                .with_method(MethodDescriptor::function("Helper", SourceType::Int32).non_public()),
        )
        .with_type(
            ExportedType::new("Sample.Functions.Text")
                .with_method(
                    MethodDescriptor::new("Split", SourceType::Object)
                        .with_parameter("text", SourceType::SqlString)
                        .with_parameter("separator", SourceType::SqlString)
                        .with_marker(FunctionMarker::new().with_fill_row("FillPart")),
                )
                .with_method(
                    MethodDescriptor::new("FillPart", SourceType::Void)
                        .with_parameter("row", SourceType::Object)
                        .with_parameter("position", SourceType::by_ref(SourceType::Int32))
                        .with_parameter("part", SourceType::by_ref(SourceType::SqlString)),
                )
                .with_method(MethodDescriptor::function("Length", SourceType::Int32).instance()),
        )
}

/// Names of the routines [`sample_module`] exposes, in creation order
pub fn sample_routine_names() -> Vec<&'static str> {
    vec!["Add", "RoundHalfEven", "Split"]
}

/// A manifest and payload file written to a temporary directory
pub struct ManifestOnDisk {
    /// Keeps the directory alive for the fixture's lifetime
    pub dir: TempDir,
    /// Path of the manifest file
    pub manifest: PathBuf,
    /// Path of the payload file
    pub payload: PathBuf,
}

/// Writes [`sample_module`] as `sample.toml` with its payload in a separate
/// file referenced by relative path
pub fn sample_manifest_on_disk() -> Result<ManifestOnDisk> {
    let dir = tempfile::tempdir().context("Failed to create manifest directory")?;
    let payload = dir.path().join("Sample.Functions.dll");
    std::fs::write(&payload, SAMPLE_PAYLOAD).context("Failed to write payload")?;

    let mut manifest = sample_module();
    manifest.payload = Payload::File(PathBuf::from("Sample.Functions.dll"));
    let toml = manifest
        .to_toml_string()
        .context("Failed to serialize manifest")?;

    let manifest_path = dir.path().join("sample.toml");
    std::fs::write(&manifest_path, toml).context("Failed to write manifest")?;

    Ok(ManifestOnDisk {
        dir,
        manifest: manifest_path,
        payload,
    })
}

/// Runs the full create sequence against a fresh catalog with CLR enabled
pub fn deploy<M: ModuleSource + ?Sized>(
    generator: &DeploymentGenerator,
    module: &M,
    permission_set: Option<PermissionSet>,
) -> Result<SimulatedCatalog> {
    initialize_logging();

    let mut catalog = SimulatedCatalog::new();
    catalog
        .execute(generator.configure_clr(true).as_str())
        .context("Failed to enable clr")?;

    for statement in generator.create_all(module, permission_set) {
        let statement = statement.context("Failed to render create statement")?;
        catalog
            .execute(statement.as_str())
            .with_context(|| format!("Failed to execute:\n{statement}"))?;
    }
    Ok(catalog)
}

/// Initialize logging for tests if not already initialized
pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("sqlclr_ddl=debug".parse().unwrap())
                    .add_directive("sqlclr_tests=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
