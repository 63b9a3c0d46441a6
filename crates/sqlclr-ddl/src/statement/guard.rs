//! Existence guards
//!
//! A guard is an `IF [NOT] EXISTS(...)` line tested against the server
//! catalog. It is never executed on its own: [`Guard::wrap`] puts it in front
//! of an indented action so both travel in one batch.

use super::ident::{qualified_name, quote_nstring};

/// `sys.objects.type` codes of CLR functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// `FS`
    ClrScalarFunction,
    /// `FT`
    ClrTableFunction,
}

impl ObjectKind {
    pub fn code(&self) -> &'static str {
        match self {
            ObjectKind::ClrScalarFunction => "FS",
            ObjectKind::ClrTableFunction => "FT",
        }
    }

    /// Both CLR function kinds
    pub fn clr_functions() -> Vec<ObjectKind> {
        vec![ObjectKind::ClrScalarFunction, ObjectKind::ClrTableFunction]
    }
}

/// A catalog lookup that a guard tests for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogPredicate {
    /// An object with this name, optionally restricted to some kinds
    RoutineExists {
        schema: Option<String>,
        name: String,
        kinds: Vec<ObjectKind>,
    },
    /// An assembly with this name
    ModuleExists { name: String },
    /// An assembly with this name whose stored image equals `payload`
    ModulePayloadMatches { name: String, payload: Vec<u8> },
}

impl CatalogPredicate {
    pub fn routine(schema: Option<&str>, name: &str, kinds: Vec<ObjectKind>) -> Self {
        CatalogPredicate::RoutineExists {
            schema: schema.map(str::to_string),
            name: name.to_string(),
            kinds,
        }
    }

    pub fn module(name: &str) -> Self {
        CatalogPredicate::ModuleExists {
            name: name.to_string(),
        }
    }

    pub fn module_payload(name: &str, payload: Vec<u8>) -> Self {
        CatalogPredicate::ModulePayloadMatches {
            name: name.to_string(),
            payload,
        }
    }

    /// Renders the `SELECT` inside `EXISTS(...)`
    pub fn to_sql(&self) -> String {
        match self {
            CatalogPredicate::RoutineExists { schema, name, kinds } => {
                let mut sql = format!(
                    "SELECT * FROM sys.objects WHERE object_id = OBJECT_ID({})",
                    quote_nstring(&qualified_name(schema.as_deref(), name))
                );
                if !kinds.is_empty() {
                    let codes: Vec<String> =
                        kinds.iter().map(|k| quote_nstring(k.code())).collect();
                    sql.push_str(" AND type IN (");
                    sql.push_str(&codes.join(", "));
                    sql.push(')');
                }
                sql
            }
            CatalogPredicate::ModuleExists { name } => {
                format!(
                    "SELECT * FROM sys.assemblies WHERE name = {}",
                    quote_nstring(name)
                )
            }
            CatalogPredicate::ModulePayloadMatches { name, payload } => {
                format!(
                    "SELECT * FROM sys.assemblies a \
                     INNER JOIN sys.assembly_files f ON f.assembly_id = a.assembly_id \
                     WHERE a.name = {} AND f.file_id = 1 AND f.content = 0x{}",
                    quote_nstring(name),
                    hex::encode_upper(payload)
                )
            }
        }
    }
}

/// One or more `[NOT] EXISTS` tests joined with `AND`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    terms: Vec<(bool, CatalogPredicate)>,
}

impl Guard {
    /// `IF EXISTS(predicate)`
    pub fn exists(predicate: CatalogPredicate) -> Self {
        Self {
            terms: vec![(true, predicate)],
        }
    }

    /// `IF NOT EXISTS(predicate)`
    pub fn not_exists(predicate: CatalogPredicate) -> Self {
        Self {
            terms: vec![(false, predicate)],
        }
    }

    pub fn and_exists(mut self, predicate: CatalogPredicate) -> Self {
        self.terms.push((true, predicate));
        self
    }

    pub fn and_not_exists(mut self, predicate: CatalogPredicate) -> Self {
        self.terms.push((false, predicate));
        self
    }

    /// Appends the guard line, terminated by a newline
    pub fn append_to(&self, buf: &mut String) {
        buf.push_str("IF ");
        for (i, (exists, predicate)) in self.terms.iter().enumerate() {
            if i > 0 {
                buf.push_str(" AND ");
            }
            if !exists {
                buf.push_str("NOT ");
            }
            buf.push_str("EXISTS(");
            buf.push_str(&predicate.to_sql());
            buf.push(')');
        }
        buf.push('\n');
    }

    /// Renders the guard line followed by `action`, every action line
    /// indented by four spaces
    pub fn wrap(&self, action: &str) -> String {
        let mut sql = String::new();
        self.append_to(&mut sql);
        for line in action.lines() {
            sql.push_str("    ");
            sql.push_str(line);
            sql.push('\n');
        }
        sql
    }
}

/// Appends `action` guarded by `guard`
pub fn append_guarded(buf: &mut String, guard: &Guard, action: &str) {
    buf.push_str(&guard.wrap(action));
}
