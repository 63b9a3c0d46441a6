//! Module descriptors and routine enumeration
//!
//! A hosting application describes a compiled module through [`ModuleSource`]:
//! its name, its binary payload, and the exported types whose public static
//! methods may be bound to SQL functions. [`routines`] walks that description
//! and yields every method carrying a [`FunctionMarker`], in type-discovery
//! order and then member-discovery order.

use serde::{Deserialize, Serialize};

use crate::{ClrError, ClrResult, PermissionSet, SourceType};

/// Description of a compiled module that can be registered with the server
pub trait ModuleSource {
    /// Module name, used as the assembly name in every statement
    fn name(&self) -> &str;

    /// Module version, informational only
    fn version(&self) -> Option<&str> {
        None
    }

    /// Permission set requested when the module does not get one per call
    fn permission_set(&self) -> PermissionSet {
        PermissionSet::Default
    }

    /// Exported types, in discovery order
    fn exported_types(&self) -> &[ExportedType];

    /// Reads the module's binary image.
    ///
    /// Called once per create-module statement, never cached.
    fn read_payload(&self) -> ClrResult<Vec<u8>>;
}

/// A named parameter of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SourceType,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, ty: SourceType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Marker that exposes a method as a SQL function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMarker {
    /// SQL-visible function name, when it differs from the method name
    #[serde(default)]
    pub name: Option<String>,
    /// Method on the declaring type that fills one output row.
    /// Its presence makes the function table-valued.
    #[serde(default)]
    pub fill_row_method: Option<String>,
}

impl FunctionMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fill_row(mut self, method: impl Into<String>) -> Self {
        self.fill_row_method = Some(method.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// A method of an exported type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default = "void_type")]
    pub return_type: SourceType,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub is_static: bool,
    #[serde(default)]
    pub function: Option<FunctionMarker>,
}

fn void_type() -> SourceType {
    SourceType::Void
}

impl MethodDescriptor {
    /// Creates a public static method without a function marker
    pub fn new(name: impl Into<String>, return_type: SourceType) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            is_public: true,
            is_static: true,
            function: None,
        }
    }

    /// Creates a public static method marked as a SQL function
    pub fn function(name: impl Into<String>, return_type: SourceType) -> Self {
        Self::new(name, return_type).with_marker(FunctionMarker::new())
    }

    pub fn with_parameter(mut self, name: impl Into<String>, ty: SourceType) -> Self {
        self.parameters.push(ParameterDescriptor::new(name, ty));
        self
    }

    pub fn with_marker(mut self, marker: FunctionMarker) -> Self {
        self.function = Some(marker);
        self
    }

    pub fn non_public(mut self) -> Self {
        self.is_public = false;
        self
    }

    pub fn instance(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Public, static and marked
    pub fn is_routine(&self) -> bool {
        self.is_public && self.is_static && self.function.is_some()
    }
}

/// An exported type and its methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedType {
    /// Namespace-qualified type name, as used in `EXTERNAL NAME`
    pub full_name: String,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ExportedType {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Looks up a method by name. The first declaration wins.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A marked method together with the type and module that declare it
#[derive(Debug, Clone, Copy)]
pub struct Routine<'a> {
    module_name: &'a str,
    declaring_type: &'a ExportedType,
    method: &'a MethodDescriptor,
}

impl<'a> Routine<'a> {
    /// Builds a routine view over any method, marked or not.
    ///
    /// Statement generation for an unmarked method fails with
    /// [`ClrError::MissingMetadata`].
    pub fn new(
        module_name: &'a str,
        declaring_type: &'a ExportedType,
        method: &'a MethodDescriptor,
    ) -> Self {
        Self {
            module_name,
            declaring_type,
            method,
        }
    }

    /// Looks up `type_name.method_name` in a module
    pub fn find<M: ModuleSource + ?Sized>(
        module: &'a M,
        type_name: &str,
        method_name: &str,
    ) -> Option<Self> {
        let declaring_type = module
            .exported_types()
            .iter()
            .find(|t| t.full_name == type_name)?;
        let method = declaring_type.method(method_name)?;
        Some(Self::new(module.name(), declaring_type, method))
    }

    pub fn module_name(&self) -> &'a str {
        self.module_name
    }

    pub fn declaring_type(&self) -> &'a ExportedType {
        self.declaring_type
    }

    pub fn method(&self) -> &'a MethodDescriptor {
        self.method
    }

    /// Name of the bound member
    pub fn member_name(&self) -> &'a str {
        &self.method.name
    }

    /// SQL-visible function name
    pub fn name(&self) -> &'a str {
        self.method
            .function
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or(&self.method.name)
    }

    pub fn parameters(&self) -> &'a [ParameterDescriptor] {
        &self.method.parameters
    }

    pub fn return_type(&self) -> &'a SourceType {
        &self.method.return_type
    }

    pub fn marker(&self) -> Option<&'a FunctionMarker> {
        self.method.function.as_ref()
    }

    /// Returns the marker or a `MissingMetadata` error naming the routine
    pub fn require_marker(&self) -> ClrResult<&'a FunctionMarker> {
        self.marker().ok_or_else(|| {
            ClrError::MissingMetadata(format!(
                "{}.{} carries no function marker",
                self.declaring_type.full_name, self.method.name
            ))
        })
    }

    /// Returns true when the marker names a row-fill method
    pub fn is_table_valued(&self) -> bool {
        self.marker().is_some_and(|m| m.fill_row_method.is_some())
    }

    /// Resolves the row-fill method named by the marker.
    ///
    /// Returns `Ok(None)` for scalar routines and `MissingMetadata` when the
    /// named method is not declared on the routine's type.
    pub fn fill_row_method(&self) -> ClrResult<Option<&'a MethodDescriptor>> {
        let marker = self.require_marker()?;
        let Some(fill_row) = marker.fill_row_method.as_deref() else {
            return Ok(None);
        };
        self.declaring_type
            .method(fill_row)
            .map(Some)
            .ok_or_else(|| {
                ClrError::MissingMetadata(format!(
                    "row-fill method {} not found on {} (referenced by {})",
                    fill_row, self.declaring_type.full_name, self.method.name
                ))
            })
    }
}

/// Enumerates the routines of a module: every public static method carrying
/// a function marker, in type order and then member order.
pub fn routines<M: ModuleSource + ?Sized>(module: &M) -> impl Iterator<Item = Routine<'_>> {
    let module_name = module.name();
    module.exported_types().iter().flat_map(move |ty| {
        ty.methods.iter().filter_map(move |method| {
            if method.is_routine() {
                Some(Routine::new(module_name, ty, method))
            } else {
                if method.function.is_some() {
                    tracing::debug!(
                        module = module_name,
                        type_name = %ty.full_name,
                        method = %method.name,
                        "skipping marked method that is not public static"
                    );
                }
                None
            }
        })
    })
}
