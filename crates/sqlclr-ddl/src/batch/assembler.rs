//! Deployment generator implementation
//!
//! Generates the statement sequences that register and unregister a module
//! and its routines.

use sqlclr_core::{ClrResult, ModuleSource, PermissionSet, Routine, routines};

use crate::config::DeployConfig;
use crate::statement::{
    CatalogPredicate, Guard, ObjectKind, Statement, StatementKind, append_configure_clr,
    append_create_module, append_create_module_from_bytes, append_create_routine,
    append_drop_module, append_drop_routine,
};

/// Generator for module create/drop statements
#[derive(Debug, Default)]
pub struct DeploymentGenerator {
    config: DeployConfig,
}

impl DeploymentGenerator {
    /// Creates a new generator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new generator with the given configuration
    pub fn with_config(config: DeployConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    fn schema<'a>(&'a self, schema: Option<&'a str>) -> Option<&'a str> {
        schema.or(self.config.schema.as_deref())
    }

    /// Picks the permission set for a module: the requested one, then the
    /// module's own (unless `Default`), then the configured one
    pub fn effective_permission_set<M: ModuleSource + ?Sized>(
        &self,
        module: &M,
        requested: Option<PermissionSet>,
    ) -> PermissionSet {
        requested
            .or_else(|| Some(module.permission_set()).filter(|p| *p != PermissionSet::Default))
            .unwrap_or(self.config.permission_set)
    }

    // Module statements

    /// `CREATE ASSEMBLY` for the module
    pub fn create_module<M: ModuleSource + ?Sized>(
        &self,
        module: &M,
        permission_set: Option<PermissionSet>,
    ) -> ClrResult<Statement> {
        let permission_set = self.effective_permission_set(module, permission_set);
        let mut sql = String::new();
        append_create_module(&mut sql, module, permission_set)?;
        Ok(logged(
            Statement::new(StatementKind::CreateModule, sql),
            module.name(),
        ))
    }

    /// `CREATE ASSEMBLY` guarded by the absence of an assembly with the
    /// module's name
    pub fn create_module_if_absent<M: ModuleSource + ?Sized>(
        &self,
        module: &M,
        permission_set: Option<PermissionSet>,
    ) -> ClrResult<Statement> {
        let action = self.create_module(module, permission_set)?;
        let guard = Guard::not_exists(CatalogPredicate::module(module.name()));
        Ok(logged(
            Statement::guarded(StatementKind::CreateModule, guard.wrap(action.as_str())),
            module.name(),
        ))
    }

    /// `CREATE ASSEMBLY` guarded by [`module_changed_guard`](Self::module_changed_guard).
    ///
    /// The payload is read once and used for both the guard and the action.
    /// An assembly still registered under the same name with an older image
    /// makes the create fail; drop it first.
    pub fn create_module_if_changed<M: ModuleSource + ?Sized>(
        &self,
        module: &M,
        permission_set: Option<PermissionSet>,
    ) -> ClrResult<Statement> {
        let permission_set = self.effective_permission_set(module, permission_set);
        let payload = module.read_payload()?;

        let mut action = String::new();
        append_create_module_from_bytes(&mut action, module.name(), &payload, permission_set);
        let guard = Guard::not_exists(CatalogPredicate::module_payload(module.name(), payload));

        Ok(logged(
            Statement::guarded(StatementKind::CreateModule, guard.wrap(&action)),
            module.name(),
        ))
    }

    /// Guard that holds while the registered assembly's image differs from
    /// the module's payload (or no such assembly exists)
    pub fn module_changed_guard<M: ModuleSource + ?Sized>(&self, module: &M) -> ClrResult<Guard> {
        let payload = module.read_payload()?;
        Ok(Guard::not_exists(CatalogPredicate::module_payload(
            module.name(),
            payload,
        )))
    }

    /// Guard that holds while the registered assembly's image equals the
    /// module's payload
    pub fn module_unchanged_guard<M: ModuleSource + ?Sized>(
        &self,
        module: &M,
    ) -> ClrResult<Guard> {
        let payload = module.read_payload()?;
        Ok(Guard::exists(CatalogPredicate::module_payload(
            module.name(),
            payload,
        )))
    }

    /// `DROP ASSEMBLY` for the module
    pub fn drop_module<M: ModuleSource + ?Sized>(&self, module: &M) -> Statement {
        self.drop_module_named(module.name())
    }

    /// `DROP ASSEMBLY` by name, without loading the module
    pub fn drop_module_named(&self, name: &str) -> Statement {
        let mut sql = String::new();
        append_drop_module(&mut sql, name);
        logged(Statement::new(StatementKind::DropModule, sql), name)
    }

    /// `DROP ASSEMBLY` that is skipped when no assembly has this name
    pub fn drop_module_if_exists(&self, name: &str) -> Statement {
        let action = self.drop_module_named(name);
        let guard = Guard::exists(CatalogPredicate::module(name));
        logged(
            Statement::guarded(StatementKind::DropModule, guard.wrap(action.as_str())),
            name,
        )
    }

    // Routine statements

    /// `CREATE FUNCTION` for one routine. `schema` falls back to the
    /// configured schema; `name` overrides the routine's SQL name.
    pub fn create_routine(
        &self,
        routine: &Routine<'_>,
        schema: Option<&str>,
        name: Option<&str>,
    ) -> ClrResult<Statement> {
        let mut sql = String::new();
        append_create_routine(&mut sql, routine, self.schema(schema), name)?;
        Ok(logged(
            Statement::new(StatementKind::CreateRoutine, sql),
            routine.module_name(),
        ))
    }

    /// `DROP FUNCTION` for one routine
    pub fn drop_routine(&self, routine: &Routine<'_>, schema: Option<&str>) -> Statement {
        self.drop_routine_named(routine.name(), schema)
    }

    /// `DROP FUNCTION` by name, without loading the module
    pub fn drop_routine_named(&self, name: &str, schema: Option<&str>) -> Statement {
        let mut sql = String::new();
        append_drop_routine(&mut sql, self.schema(schema), name);
        logged(Statement::new(StatementKind::DropRoutine, sql), name)
    }

    /// `DROP FUNCTION` that is skipped when no CLR function has this name
    pub fn drop_routine_if_exists(&self, name: &str, schema: Option<&str>) -> Statement {
        self.guarded_drop_routine(name, schema, ObjectKind::clr_functions())
    }

    fn guarded_drop_routine(
        &self,
        name: &str,
        schema: Option<&str>,
        kinds: Vec<ObjectKind>,
    ) -> Statement {
        let schema = self.schema(schema);
        let action = self.drop_routine_named(name, schema);
        let guard = Guard::exists(CatalogPredicate::routine(schema, name, kinds));
        logged(
            Statement::guarded(StatementKind::DropRoutine, guard.wrap(action.as_str())),
            name,
        )
    }

    /// Enables or disables CLR execution server-wide
    pub fn configure_clr(&self, enabled: bool) -> Statement {
        let mut sql = String::new();
        append_configure_clr(&mut sql, enabled);
        tracing::debug!(enabled, "rendered clr enabled configuration");
        Statement::new(StatementKind::ConfigureClr, sql)
    }

    // Sequences

    /// The module followed by each of its routines.
    ///
    /// Statements are rendered lazily; a routine that fails yields an error
    /// and the sequence carries on with the next routine.
    pub fn create_all<'a, M: ModuleSource + ?Sized>(
        &'a self,
        module: &'a M,
        permission_set: Option<PermissionSet>,
    ) -> impl Iterator<Item = ClrResult<Statement>> + 'a {
        std::iter::once_with(move || self.create_module(module, permission_set))
            .chain(routines(module).map(move |r| self.create_routine(&r, None, None)))
    }

    /// Each routine in creation order, then the module
    pub fn drop_all<'a, M: ModuleSource + ?Sized>(
        &'a self,
        module: &'a M,
    ) -> impl Iterator<Item = Statement> + 'a {
        routines(module)
            .map(move |r| self.drop_routine(&r, None))
            .chain(std::iter::once_with(move || self.drop_module(module)))
    }

    /// Like [`drop_all`](Self::drop_all), with every statement guarded so the
    /// sequence can run against a partially deployed module
    pub fn drop_all_if_exists<'a, M: ModuleSource + ?Sized>(
        &'a self,
        module: &'a M,
    ) -> impl Iterator<Item = Statement> + 'a {
        routines(module)
            .map(move |r| {
                let kind = if r.is_table_valued() {
                    ObjectKind::ClrTableFunction
                } else {
                    ObjectKind::ClrScalarFunction
                };
                self.guarded_drop_routine(r.name(), None, vec![kind])
            })
            .chain(std::iter::once_with(move || {
                self.drop_module_if_exists(module.name())
            }))
    }

    // Scripts

    /// [`create_all`](Self::create_all) as one script; the first error aborts
    #[tracing::instrument(skip(self, module), fields(module = %module.name()))]
    pub fn create_all_script<M: ModuleSource + ?Sized>(
        &self,
        module: &M,
        permission_set: Option<PermissionSet>,
    ) -> ClrResult<String> {
        let statements = self
            .create_all(module, permission_set)
            .collect::<ClrResult<Vec<_>>>()?;
        Ok(self.to_script(statements))
    }

    /// [`drop_all`](Self::drop_all) as one script
    #[tracing::instrument(skip(self, module), fields(module = %module.name()))]
    pub fn drop_all_script<M: ModuleSource + ?Sized>(&self, module: &M) -> String {
        self.to_script(self.drop_all(module))
    }

    /// [`drop_all_if_exists`](Self::drop_all_if_exists) as one script
    #[tracing::instrument(skip(self, module), fields(module = %module.name()))]
    pub fn drop_all_if_exists_script<M: ModuleSource + ?Sized>(&self, module: &M) -> String {
        self.to_script(self.drop_all_if_exists(module))
    }

    /// Joins statements, writing the batch separator line after each one
    pub fn to_script<I>(&self, statements: I) -> String
    where
        I: IntoIterator<Item = Statement>,
    {
        let mut script = String::new();
        for statement in statements {
            script.push_str(statement.as_str());
            if !script.ends_with('\n') {
                script.push('\n');
            }
            script.push_str(&self.config.batch_separator);
            script.push('\n');
        }
        script
    }
}

fn logged(statement: Statement, object: &str) -> Statement {
    tracing::debug!(
        object,
        kind = ?statement.kind(),
        guarded = statement.is_guarded(),
        bytes = statement.as_str().len(),
        "rendered statement"
    );
    statement
}
