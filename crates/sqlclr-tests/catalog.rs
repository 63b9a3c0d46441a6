//! Simulated server catalog for deployment tests.
//!
//! [`SimulatedCatalog`] keeps the handful of catalog facts that the generated
//! statements touch: registered assemblies with their images and permission
//! sets, CLR functions with their kind and owning assembly, and the
//! `clr enabled` option. It understands exactly the statement shapes
//! `sqlclr-ddl` renders, including `IF [NOT] EXISTS(...)` guards, and rejects
//! everything else.
//!
//! Failures mirror the server's: creating an object twice, dropping a
//! missing object, binding a function to a missing assembly, and dropping an
//! assembly that functions still reference all fail.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlclr_tests::catalog::SimulatedCatalog;
//!
//! let mut catalog = SimulatedCatalog::new();
//! catalog.execute("CREATE ASSEMBLY [M] FROM 0x0AFF\n")?;
//! assert!(catalog.has_module("M"));
//! ```

use regex::Regex;
use sqlclr_core::PermissionSet;
use sqlclr_ddl::ObjectKind;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Schema that unqualified function names resolve to
pub const DEFAULT_SCHEMA: &str = "dbo";

const IDENT: &str = r"\[((?:[^\]]|\]\])*)\]";

static CREATE_ASSEMBLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^CREATE ASSEMBLY {IDENT} FROM 0x([0-9A-F]*)(?: WITH PERMISSION_SET = (SAFE|EXTERNAL_ACCESS|UNSAFE))?$"
    ))
    .expect("valid regex")
});
static CREATE_FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^CREATE FUNCTION (?:{IDENT}\.)?{IDENT}$")).expect("valid regex")
});
static EXTERNAL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^EXTERNAL NAME {IDENT}\.{IDENT}\.{IDENT}$")).expect("valid regex")
});
static DROP_FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^DROP FUNCTION (?:{IDENT}\.)?{IDENT}$")).expect("valid regex")
});
static DROP_ASSEMBLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^DROP ASSEMBLY {IDENT}$")).expect("valid regex")
});
static CONFIGURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^EXEC sp_configure 'clr enabled', ([01]);$").expect("valid regex")
});
static OBJECT_PREDICATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^SELECT \* FROM sys\.objects WHERE object_id = OBJECT_ID\(N'((?:[^']|'')*)'\)(?: AND type IN \(([^)]*)\))?$",
    )
    .expect("valid regex")
});
static ASSEMBLY_PREDICATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SELECT \* FROM sys\.assemblies WHERE name = N'((?:[^']|'')*)'$")
        .expect("valid regex")
});
static PAYLOAD_PREDICATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^SELECT \* FROM sys\.assemblies a INNER JOIN sys\.assembly_files f ON f\.assembly_id = a\.assembly_id WHERE a\.name = N'((?:[^']|'')*)' AND f\.file_id = 1 AND f\.content = 0x([0-9A-F]*)$",
    )
    .expect("valid regex")
});
static QUALIFIED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{IDENT}\.)?{IDENT}$")).expect("valid regex")
});

/// Errors raised while executing a batch
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The object to create is already registered
    #[error("object {0} already exists")]
    AlreadyExists(String),
    /// The object to drop or reference is not registered
    #[error("object {0} does not exist")]
    NotFound(String),
    /// An assembly cannot be dropped while functions reference it
    #[error("assembly {assembly} is referenced by {dependents:?}")]
    AssemblyInUse {
        /// Assembly being dropped
        assembly: String,
        /// Functions bound to it
        dependents: Vec<String>,
    },
    /// The batch is not a statement this catalog understands
    #[error("unrecognized batch: {0}")]
    Unrecognized(String),
}

/// A registered assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyEntry {
    /// Stored image
    pub content: Vec<u8>,
    /// Requested permission set
    pub permission_set: PermissionSet,
}

/// A registered CLR function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    /// Scalar or table-valued
    pub kind: ObjectKind,
    /// Assembly named in `EXTERNAL NAME`
    pub assembly: String,
    /// Type named in `EXTERNAL NAME`
    pub type_name: String,
    /// Member named in `EXTERNAL NAME`
    pub member: String,
}

/// In-memory catalog that executes generated batches
#[derive(Debug, Default)]
pub struct SimulatedCatalog {
    clr_enabled: bool,
    assemblies: BTreeMap<String, AssemblyEntry>,
    functions: BTreeMap<(String, String), FunctionEntry>,
    executed: usize,
}

impl SimulatedCatalog {
    /// Creates an empty catalog with CLR disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `clr enabled` is on
    pub fn clr_enabled(&self) -> bool {
        self.clr_enabled
    }

    /// Number of batches executed successfully
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Registered assembly by name
    pub fn module(&self, name: &str) -> Option<&AssemblyEntry> {
        self.assemblies.get(name)
    }

    /// Whether an assembly with this name is registered
    pub fn has_module(&self, name: &str) -> bool {
        self.assemblies.contains_key(name)
    }

    /// Registered function by schema and name; `None` means the default schema
    pub fn function(&self, schema: Option<&str>, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(&function_key(schema, name))
    }

    /// Names of all registered functions as `schema.name`
    pub fn function_names(&self) -> Vec<String> {
        self.functions
            .keys()
            .map(|(schema, name)| format!("{schema}.{name}"))
            .collect()
    }

    /// True when no assembly or function is registered
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty() && self.functions.is_empty()
    }

    /// Executes one batch
    pub fn execute(&mut self, batch: &str) -> Result<(), CatalogError> {
        let batch = batch.trim_end();
        let result = match batch.strip_prefix("IF ") {
            Some(rest) => self.execute_guarded(rest),
            None => self.execute_action(batch),
        };
        if result.is_ok() {
            self.executed += 1;
        }
        result
    }

    /// Splits a script on separator lines and executes each batch in order,
    /// stopping at the first failure
    pub fn execute_script(&mut self, script: &str, separator: &str) -> Result<(), CatalogError> {
        let mut batch = String::new();
        for line in script.lines() {
            if line.trim() == separator {
                if !batch.trim().is_empty() {
                    self.execute(&batch)?;
                }
                batch.clear();
            } else {
                batch.push_str(line);
                batch.push('\n');
            }
        }
        if !batch.trim().is_empty() {
            self.execute(&batch)?;
        }
        Ok(())
    }

    fn execute_guarded(&mut self, rest: &str) -> Result<(), CatalogError> {
        let (condition, action) = rest
            .split_once('\n')
            .ok_or_else(|| CatalogError::Unrecognized(rest.to_string()))?;

        if !self.evaluate_condition(condition)? {
            tracing::debug!(condition, "guard short-circuited");
            return Ok(());
        }

        let action: Vec<&str> = action
            .lines()
            .map(|line| line.strip_prefix("    ").unwrap_or(line))
            .collect();
        self.execute_action(&action.join("\n"))
    }

    fn execute_action(&mut self, batch: &str) -> Result<(), CatalogError> {
        let first_line = batch.lines().next().unwrap_or_default();

        if let Some(caps) = CREATE_ASSEMBLY_RE.captures(batch) {
            let name = unescape_ident(&caps[1]);
            if self.assemblies.contains_key(&name) {
                return Err(CatalogError::AlreadyExists(name));
            }
            let content = hex::decode(&caps[2])
                .map_err(|_| CatalogError::Unrecognized(first_line.to_string()))?;
            let permission_set = caps
                .get(3)
                .and_then(|m| PermissionSet::parse(m.as_str()))
                .unwrap_or_default();
            self.assemblies.insert(
                name,
                AssemblyEntry {
                    content,
                    permission_set,
                },
            );
            return Ok(());
        }

        if let Some(caps) = CREATE_FUNCTION_RE.captures(first_line) {
            let key = function_key(
                caps.get(1).map(|m| unescape_ident(m.as_str())).as_deref(),
                &unescape_ident(&caps[2]),
            );
            return self.create_function(key, batch);
        }

        if let Some(caps) = DROP_FUNCTION_RE.captures(batch) {
            let key = function_key(
                caps.get(1).map(|m| unescape_ident(m.as_str())).as_deref(),
                &unescape_ident(&caps[2]),
            );
            return match self.functions.remove(&key) {
                Some(_) => Ok(()),
                None => Err(CatalogError::NotFound(format!("{}.{}", key.0, key.1))),
            };
        }

        if let Some(caps) = DROP_ASSEMBLY_RE.captures(batch) {
            let name = unescape_ident(&caps[1]);
            if !self.assemblies.contains_key(&name) {
                return Err(CatalogError::NotFound(name));
            }
            let dependents: Vec<String> = self
                .functions
                .iter()
                .filter(|(_, f)| f.assembly == name)
                .map(|((schema, function), _)| format!("{schema}.{function}"))
                .collect();
            if !dependents.is_empty() {
                return Err(CatalogError::AssemblyInUse {
                    assembly: name,
                    dependents,
                });
            }
            self.assemblies.remove(&name);
            return Ok(());
        }

        if let Some(caps) = CONFIGURE_RE.captures(first_line) {
            let enabled = &caps[1] == "1";
            if batch.lines().nth(1) != Some("RECONFIGURE;") {
                return Err(CatalogError::Unrecognized(batch.to_string()));
            }
            self.clr_enabled = enabled;
            return Ok(());
        }

        Err(CatalogError::Unrecognized(batch.to_string()))
    }

    fn create_function(
        &mut self,
        key: (String, String),
        batch: &str,
    ) -> Result<(), CatalogError> {
        if self.functions.contains_key(&key) {
            return Err(CatalogError::AlreadyExists(format!("{}.{}", key.0, key.1)));
        }

        let external = batch
            .lines()
            .find_map(|line| EXTERNAL_NAME_RE.captures(line))
            .ok_or_else(|| CatalogError::Unrecognized(batch.to_string()))?;
        let assembly = unescape_ident(&external[1]);
        if !self.assemblies.contains_key(&assembly) {
            return Err(CatalogError::NotFound(assembly));
        }

        let kind = if batch.lines().any(|line| line == "RETURNS TABLE") {
            ObjectKind::ClrTableFunction
        } else {
            ObjectKind::ClrScalarFunction
        };

        self.functions.insert(
            key,
            FunctionEntry {
                kind,
                assembly,
                type_name: unescape_ident(&external[2]),
                member: unescape_ident(&external[3]),
            },
        );
        Ok(())
    }

    fn evaluate_condition(&self, condition: &str) -> Result<bool, CatalogError> {
        let mut rest = condition;
        let mut holds = true;

        loop {
            let negated = match rest.strip_prefix("NOT ") {
                Some(r) => {
                    rest = r;
                    true
                }
                None => false,
            };
            let body = rest
                .strip_prefix("EXISTS(")
                .ok_or_else(|| CatalogError::Unrecognized(condition.to_string()))?;
            let close = closing_paren(body)
                .ok_or_else(|| CatalogError::Unrecognized(condition.to_string()))?;

            let found = self.evaluate_predicate(&body[..close])?;
            holds &= found != negated;

            rest = &body[close + 1..];
            match rest.strip_prefix(" AND ") {
                Some(r) => rest = r,
                None if rest.is_empty() => return Ok(holds),
                None => return Err(CatalogError::Unrecognized(condition.to_string())),
            }
        }
    }

    fn evaluate_predicate(&self, select: &str) -> Result<bool, CatalogError> {
        if let Some(caps) = OBJECT_PREDICATE_RE.captures(select) {
            let qualified = caps[1].replace("''", "'");
            let name = QUALIFIED_NAME_RE
                .captures(&qualified)
                .ok_or_else(|| CatalogError::Unrecognized(select.to_string()))?;
            let key = function_key(
                name.get(1).map(|m| unescape_ident(m.as_str())).as_deref(),
                &unescape_ident(&name[2]),
            );
            let kinds: Vec<&str> = caps
                .get(2)
                .map(|m| {
                    m.as_str()
                        .split(", ")
                        .map(|code| code.trim_start_matches("N'").trim_end_matches('\''))
                        .collect()
                })
                .unwrap_or_default();
            return Ok(self
                .functions
                .get(&key)
                .is_some_and(|f| kinds.is_empty() || kinds.contains(&f.kind.code())));
        }

        if let Some(caps) = ASSEMBLY_PREDICATE_RE.captures(select) {
            return Ok(self.assemblies.contains_key(&caps[1].replace("''", "'")));
        }

        if let Some(caps) = PAYLOAD_PREDICATE_RE.captures(select) {
            let content = hex::decode(&caps[2])
                .map_err(|_| CatalogError::Unrecognized(select.to_string()))?;
            return Ok(self
                .assemblies
                .get(&caps[1].replace("''", "'"))
                .is_some_and(|a| a.content == content));
        }

        Err(CatalogError::Unrecognized(select.to_string()))
    }
}

fn function_key(schema: Option<&str>, name: &str) -> (String, String) {
    (
        schema.unwrap_or(DEFAULT_SCHEMA).to_string(),
        name.to_string(),
    )
}

fn unescape_ident(ident: &str) -> String {
    ident.replace("]]", "]")
}

/// Index of the parenthesis closing an already opened one, skipping string
/// literals
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}
