//! Tests for module manifests

use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

const MANIFEST_TOML: &str = indoc! {r#"
    name = "Sample.Functions"
    version = "1.2.0"
    permission_set = "external_access"
    payload = { file = "Sample.Functions.dll" }

    [[types]]
    full_name = "Sample.Functions.Text"

    [[types.methods]]
    name = "Negate"
    return_type = "bool"
    parameters = [{ name = "value", type = "bool" }]
    function = {}

    [[types.methods]]
    name = "Split"
    return_type = "object"
    parameters = [{ name = "text", type = "sql_string" }]
    function = { fill_row_method = "FillRow" }

    [[types.methods]]
    name = "FillRow"
    parameters = [
        { name = "row", type = "object" },
        { name = "part", type = { by_ref = "sql_string" } },
    ]
"#};

#[test]
fn test_parse_toml_manifest() {
    let manifest = ModuleManifest::from_toml_str(MANIFEST_TOML).unwrap();

    assert_eq!(manifest.name(), "Sample.Functions");
    assert_eq!(manifest.version(), Some("1.2.0"));
    assert_eq!(manifest.permission_set(), PermissionSet::ExternalAccess);
    assert_eq!(
        manifest.payload,
        Payload::File(PathBuf::from("Sample.Functions.dll"))
    );

    let text = &manifest.exported_types()[0];
    assert_eq!(text.methods.len(), 3);
    assert_eq!(text.methods[2].return_type, SourceType::Void);
    assert_eq!(
        text.methods[2].parameters[1].ty,
        SourceType::by_ref(SourceType::SqlString)
    );

    let names: Vec<_> = routines(&manifest).map(|r| r.name()).collect();
    assert_eq!(names, vec!["Negate", "Split"]);
}

#[test]
fn test_parse_json_manifest_with_inline_payload() {
    let json = r#"{
        "name": "Inline",
        "payload": { "bytes": [10, 255] },
        "types": [{
            "full_name": "Inline.Math",
            "methods": [{ "name": "Twice", "return_type": "int32", "function": {} }]
        }]
    }"#;
    let manifest = ModuleManifest::from_json_str(json).unwrap();

    assert_eq!(manifest.permission_set(), PermissionSet::Default);
    assert_eq!(manifest.read_payload().unwrap(), vec![0x0A, 0xFF]);
    assert_eq!(routines(&manifest).count(), 1);
}

#[test]
fn test_invalid_manifest_is_manifest_error() {
    let err = ModuleManifest::from_toml_str("name = 1").unwrap_err();
    assert!(matches!(err, ClrError::Manifest(_)));
}

#[test]
fn test_load_resolves_payload_relative_to_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Sample.Functions.dll"), [0x4D, 0x5A, 0x90]).unwrap();
    let manifest_path = dir.path().join("module.toml");
    std::fs::write(&manifest_path, MANIFEST_TOML).unwrap();

    let manifest = ModuleManifest::load(&manifest_path).unwrap();

    assert_eq!(
        manifest.payload,
        Payload::File(dir.path().join("Sample.Functions.dll"))
    );
    assert_eq!(manifest.read_payload().unwrap(), vec![0x4D, 0x5A, 0x90]);
}

#[test]
fn test_missing_payload_file_is_payload_read_error() {
    let manifest = ModuleManifest::new(
        "Gone",
        Payload::File(PathBuf::from("/nonexistent/sqlclr/Gone.dll")),
    );
    let err = manifest.read_payload().unwrap_err();

    match &err {
        ClrError::PayloadRead { module, path, .. } => {
            assert_eq!(module, "Gone");
            assert_eq!(path, &PathBuf::from("/nonexistent/sqlclr/Gone.dll"));
        }
        other => panic!("expected PayloadRead, got {other:?}"),
    }
    assert!(err.to_string().contains("[Gone]"));
}

#[test]
fn test_load_missing_manifest_is_io_error() {
    let err = ModuleManifest::load("/nonexistent/sqlclr/module.toml").unwrap_err();
    assert!(matches!(err, ClrError::Io(_)));
}
