//! Routine signature projector

use sqlclr_core::{ClrResult, ParameterDescriptor, Routine};

use crate::type_map::resolve_column_type;

/// A name paired with its column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlField {
    pub name: String,
    pub sql_type: &'static str,
}

impl SqlField {
    pub fn new(name: impl Into<String>, sql_type: &'static str) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// What a routine returns to SQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// A single value of the given column type
    Scalar(&'static str),
    /// Rows with the given columns
    TableValued(Vec<SqlField>),
}

impl ReturnShape {
    pub fn is_table_valued(&self) -> bool {
        matches!(self, ReturnShape::TableValued(_))
    }
}

/// The SQL-visible signature of a routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub parameters: Vec<SqlField>,
    pub returns: ReturnShape,
}

/// Projects a routine onto its SQL signature.
///
/// Parameters keep their declared order. A routine whose marker names a
/// row-fill method is table-valued: its columns are the row-fill method's
/// parameters after the first, typed by their element type.
pub fn project(routine: &Routine<'_>) -> ClrResult<Signature> {
    routine.require_marker()?;

    let parameters = routine
        .parameters()
        .iter()
        .map(|p| {
            resolve_column_type(&p.ty)
                .map(|sql_type| SqlField::new(&p.name, sql_type))
                .map_err(|e| {
                    e.in_context(format!("parameter @{} of {}", p.name, describe(routine)))
                })
        })
        .collect::<ClrResult<Vec<_>>>()?;

    let returns = match routine.fill_row_method()? {
        Some(fill_row) => ReturnShape::TableValued(project_columns(
            routine,
            &fill_row.name,
            &fill_row.parameters,
        )?),
        None => ReturnShape::Scalar(
            resolve_column_type(routine.return_type())
                .map_err(|e| e.in_context(format!("return type of {}", describe(routine))))?,
        ),
    };

    Ok(Signature {
        parameters,
        returns,
    })
}

/// The first row-fill parameter receives the row object and is not a column
fn project_columns(
    routine: &Routine<'_>,
    fill_row_name: &str,
    fill_row_parameters: &[ParameterDescriptor],
) -> ClrResult<Vec<SqlField>> {
    fill_row_parameters
        .iter()
        .skip(1)
        .map(|p| {
            resolve_column_type(p.ty.element_type())
                .map(|sql_type| SqlField::new(&p.name, sql_type))
                .map_err(|e| {
                    e.in_context(format!(
                        "column {} of {} (row-fill method {})",
                        p.name,
                        describe(routine),
                        fill_row_name
                    ))
                })
        })
        .collect()
}

fn describe(routine: &Routine<'_>) -> String {
    format!(
        "{}.{}",
        routine.declaring_type().full_name,
        routine.member_name()
    )
}
