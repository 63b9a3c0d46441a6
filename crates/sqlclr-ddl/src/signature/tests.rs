//! Tests for signature projection

use super::*;
use pretty_assertions::assert_eq;
use sqlclr_core::{ExportedType, FunctionMarker, MethodDescriptor, Routine, SourceType};

fn project_method(ty: &ExportedType, method: &str) -> sqlclr_core::ClrResult<Signature> {
    let method = ty.method(method).unwrap();
    project(&Routine::new("Sample", ty, method))
}

#[test]
fn test_scalar_signature() {
    let ty = ExportedType::new("Sample.Scalars").with_method(
        MethodDescriptor::function("Negate", SourceType::Bool)
            .with_parameter("value", SourceType::Bool),
    );

    let signature = project_method(&ty, "Negate").unwrap();

    assert_eq!(signature.parameters, vec![SqlField::new("value", "bit")]);
    assert_eq!(signature.returns, ReturnShape::Scalar("bit"));
}

#[test]
fn test_parameter_order_is_preserved() {
    let ty = ExportedType::new("Sample.Scalars").with_method(
        MethodDescriptor::function("Mix", SourceType::SqlString)
            .with_parameter("z", SourceType::Int64)
            .with_parameter("a", SourceType::SqlDecimal)
            .with_parameter("m", SourceType::DateTimeOffset),
    );

    let signature = project_method(&ty, "Mix").unwrap();

    assert_eq!(
        signature.parameters,
        vec![
            SqlField::new("z", "bigint"),
            SqlField::new("a", "decimal"),
            SqlField::new("m", "datetimeoffset"),
        ]
    );
    assert_eq!(signature.returns, ReturnShape::Scalar("nvarchar(max)"));
}

#[test]
fn test_table_valued_signature_skips_first_fill_row_parameter() {
    let ty = ExportedType::new("Sample.Tables")
        .with_method(
            MethodDescriptor::new("Rows", SourceType::Object)
                .with_parameter("count", SourceType::Int32)
                .with_marker(FunctionMarker::new().with_fill_row("FillRow")),
        )
        .with_method(
            MethodDescriptor::new("FillRow", SourceType::Void)
                .with_parameter("ctx", SourceType::Object)
                .with_parameter("colA", SourceType::by_ref(SourceType::Int32))
                .with_parameter("colB", SourceType::by_ref(SourceType::String)),
        );

    let signature = project_method(&ty, "Rows").unwrap();

    assert_eq!(signature.parameters, vec![SqlField::new("count", "int")]);
    assert_eq!(
        signature.returns,
        ReturnShape::TableValued(vec![
            SqlField::new("colA", "int"),
            SqlField::new("colB", "nvarchar(max)"),
        ])
    );
    assert!(signature.returns.is_table_valued());
}

#[test]
fn test_table_valued_return_type_is_not_mapped() {
    // The enumerator type returned by a table-valued routine has no column type
    let ty = ExportedType::new("Sample.Tables")
        .with_method(
            MethodDescriptor::new(
                "Rows",
                SourceType::Named("System.Collections.IEnumerable".into()),
            )
                .with_marker(FunctionMarker::new().with_fill_row("FillRow")),
        )
        .with_method(
            MethodDescriptor::new("FillRow", SourceType::Void)
                .with_parameter("ctx", SourceType::Object)
                .with_parameter("n", SourceType::by_ref(SourceType::SqlInt64)),
        );

    let signature = project_method(&ty, "Rows").unwrap();
    assert_eq!(
        signature.returns,
        ReturnShape::TableValued(vec![SqlField::new("n", "bigint")])
    );
}

#[test]
fn test_unmarked_routine_is_missing_metadata() {
    let ty = ExportedType::new("Sample.Scalars")
        .with_method(MethodDescriptor::new("Helper", SourceType::Int32));

    let err = project_method(&ty, "Helper").unwrap_err();
    assert!(err.is_missing_metadata());
}

#[test]
fn test_unsupported_parameter_type_names_parameter() {
    let ty = ExportedType::new("Sample.Scalars").with_method(
        MethodDescriptor::function("Lookup", SourceType::Int32)
            .with_parameter("id", SourceType::Guid),
    );

    let err = project_method(&ty, "Lookup").unwrap_err();
    assert!(err.is_unsupported_type());
    let message = err.to_string();
    assert!(message.contains("Guid"), "{message}");
    assert!(message.contains("@id"), "{message}");
}

#[test]
fn test_unsupported_return_type() {
    let ty = ExportedType::new("Sample.Scalars")
        .with_method(MethodDescriptor::function("Letter", SourceType::Char));

    let err = project_method(&ty, "Letter").unwrap_err();
    assert!(err.is_unsupported_type());
    assert!(err.to_string().contains("return type"));
}

#[test]
fn test_unsupported_column_type() {
    let ty = ExportedType::new("Sample.Tables")
        .with_method(
            MethodDescriptor::new("Rows", SourceType::Object)
                .with_marker(FunctionMarker::new().with_fill_row("FillRow")),
        )
        .with_method(
            MethodDescriptor::new("FillRow", SourceType::Void)
                .with_parameter("ctx", SourceType::Object)
                .with_parameter("id", SourceType::by_ref(SourceType::Guid)),
        );

    let err = project_method(&ty, "Rows").unwrap_err();
    assert!(err.is_unsupported_type());
    assert!(err.to_string().contains("column id"));
}

#[test]
fn test_missing_fill_row_method() {
    let ty = ExportedType::new("Sample.Tables").with_method(
        MethodDescriptor::new("Rows", SourceType::Object)
            .with_marker(FunctionMarker::new().with_fill_row("FillRow")),
    );

    let err = project_method(&ty, "Rows").unwrap_err();
    assert!(err.is_missing_metadata());
}
