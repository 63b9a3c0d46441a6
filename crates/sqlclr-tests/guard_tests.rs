//! Guarded statement tests
//!
//! Guarded drops and creates must be safe to run repeatedly and against a
//! partially deployed module; their unguarded counterparts must not be.

#[cfg(test)]
mod tests {
    use crate::catalog::{CatalogError, SimulatedCatalog};
    use crate::fixtures::{deploy, negate_module, sample_module};
    use anyhow::{Context, Result};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sqlclr_core::{ModuleManifest, Payload, PermissionSet};
    use sqlclr_ddl::{CatalogPredicate, DeployConfig, DeploymentGenerator, Guard, ObjectKind};

    #[rstest]
    #[case::unqualified(None)]
    #[case::dbo(Some("dbo"))]
    fn test_drop_routine_if_exists_is_repeatable(#[case] schema: Option<&str>) -> Result<()> {
        let generator = DeploymentGenerator::new();
        let mut catalog = deploy(&generator, &negate_module(), None)?;

        let guarded = generator.drop_routine_if_exists("Negate", schema);
        catalog.execute(guarded.as_str())?;
        catalog.execute(guarded.as_str())?;
        assert!(catalog.function(None, "Negate").is_none());

        let unguarded = generator.drop_routine_named("Negate", schema);
        assert!(matches!(
            catalog.execute(unguarded.as_str()),
            Err(CatalogError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_combined_guard_checks_module_and_routine() -> Result<()> {
        let generator = DeploymentGenerator::new();
        let mut catalog = deploy(&generator, &negate_module(), None)?;

        let guard = |kind: ObjectKind| {
            Guard::exists(CatalogPredicate::module("M"))
                .and_exists(CatalogPredicate::routine(None, "Negate", vec![kind]))
                .wrap(generator.drop_routine_named("Negate", None).as_str())
        };

        catalog.execute(&guard(ObjectKind::ClrTableFunction))?;
        assert!(catalog.function(None, "Negate").is_some());

        catalog.execute(&guard(ObjectKind::ClrScalarFunction))?;
        assert!(catalog.function(None, "Negate").is_none());
        Ok(())
    }

    #[test]
    fn test_drop_module_if_exists_is_repeatable() -> Result<()> {
        let generator = DeploymentGenerator::new();
        let mut catalog = SimulatedCatalog::new();
        catalog.execute(generator.create_module(&negate_module(), None)?.as_str())?;

        let guarded = generator.drop_module_if_exists("M");
        catalog.execute(guarded.as_str())?;
        catalog.execute(guarded.as_str())?;
        assert!(catalog.is_empty());

        assert!(catalog
            .execute(generator.drop_module_named("M").as_str())
            .is_err());
        Ok(())
    }

    #[rstest]
    fn test_drop_all_if_exists_runs_twice(
        #[values(None, Some("clr"))] schema: Option<&str>,
    ) -> Result<()> {
        let config = match schema {
            Some(schema) => DeployConfig::new().with_schema(schema),
            None => DeployConfig::new(),
        };
        let generator = DeploymentGenerator::with_config(config);
        let module = sample_module();
        let mut catalog = deploy(&generator, &module, None)?;

        let script = generator.drop_all_if_exists_script(&module);
        catalog.execute_script(&script, "GO")?;
        assert!(catalog.is_empty());
        catalog.execute_script(&script, "GO")?;
        assert!(catalog.is_empty());
        Ok(())
    }

    #[test]
    fn test_drop_all_if_exists_on_partial_deployment() -> Result<()> {
        let generator = DeploymentGenerator::new();
        let module = sample_module();
        let mut catalog = SimulatedCatalog::new();

        // module and first routine only
        for statement in generator.create_all(&module, None).take(2) {
            catalog.execute(statement?.as_str())?;
        }
        assert_eq!(catalog.function_names(), vec!["dbo.Add"]);

        for statement in generator.drop_all_if_exists(&module) {
            catalog
                .execute(statement.as_str())
                .with_context(|| format!("Failed to execute:\n{statement}"))?;
        }
        assert!(catalog.is_empty());

        assert!(generator
            .drop_all(&module)
            .any(|statement| catalog.execute(statement.as_str()).is_err()));
        Ok(())
    }

    #[test]
    fn test_kind_restricted_guard_skips_other_kind() -> Result<()> {
        let generator = DeploymentGenerator::new();
        let module = sample_module();
        let mut catalog = deploy(&generator, &module, None)?;

        // drop_all_if_exists guards Split as table-valued; recreate it scalar
        catalog.execute(generator.drop_routine_named("Split", None).as_str())?;
        catalog.execute(
            "CREATE FUNCTION [Split]\n(\n)\nRETURNS int\nAS\nEXTERNAL NAME [Sample.Functions].[Sample.Functions.Text].[Split]\n",
        )?;

        let statements: Vec<_> = generator.drop_all_if_exists(&module).collect();
        let drop_split = statements
            .iter()
            .find(|s| s.as_str().contains("DROP FUNCTION [Split]"))
            .context("no guarded drop for Split")?;
        catalog.execute(drop_split.as_str())?;
        assert!(catalog.function(None, "Split").is_some());
        Ok(())
    }

    #[rstest]
    #[case::safe(PermissionSet::Safe)]
    #[case::unsafe_code(PermissionSet::Unsafe)]
    fn test_create_module_if_absent_is_repeatable(
        #[case] permission_set: PermissionSet,
    ) -> Result<()> {
        let generator = DeploymentGenerator::new();
        let module = negate_module();
        let mut catalog = SimulatedCatalog::new();

        let guarded = generator.create_module_if_absent(&module, Some(permission_set))?;
        catalog.execute(guarded.as_str())?;
        catalog.execute(guarded.as_str())?;

        assert_eq!(
            catalog.module("M").map(|m| m.permission_set),
            Some(permission_set)
        );
        assert_eq!(catalog.executed(), 2);
        Ok(())
    }

    #[test]
    fn test_create_module_if_changed_skips_identical_image() -> Result<()> {
        let generator = DeploymentGenerator::new();
        let module = negate_module();
        let mut catalog = SimulatedCatalog::new();

        let statement = generator.create_module_if_changed(&module, None)?;
        catalog.execute(statement.as_str())?;
        catalog.execute(statement.as_str())?;
        assert_eq!(
            catalog.module("M").map(|m| m.content.clone()),
            Some(vec![0x0A, 0xFF])
        );

        // a different image under the same name still collides
        let rebuilt = ModuleManifest::new("M", Payload::Bytes(vec![0x0B]));
        let err = catalog
            .execute(generator.create_module_if_changed(&rebuilt, None)?.as_str())
            .unwrap_err();
        assert_eq!(err, CatalogError::AlreadyExists("M".to_string()));
        Ok(())
    }

    #[test]
    fn test_payload_guards_track_module_image() -> Result<()> {
        let generator = DeploymentGenerator::new();
        let module = negate_module();
        let mut catalog = SimulatedCatalog::new();
        catalog.execute(generator.create_module(&module, None)?.as_str())?;

        let rebuilt = ModuleManifest::new("M", Payload::Bytes(vec![0x0B]));

        let drop_if_changed =
            |generator: &DeploymentGenerator, module: &ModuleManifest| -> Result<String> {
                Ok(generator
                    .module_changed_guard(module)?
                    .wrap(generator.drop_module_named("M").as_str()))
            };

        // same image: nothing to replace
        catalog.execute(&drop_if_changed(&generator, &module)?)?;
        assert!(catalog.has_module("M"));

        let mut unchanged = String::new();
        generator
            .module_unchanged_guard(&module)?
            .append_to(&mut unchanged);
        assert!(unchanged.starts_with("IF EXISTS("));

        // new image: the stale assembly goes
        catalog.execute(&drop_if_changed(&generator, &rebuilt)?)?;
        assert!(!catalog.has_module("M"));
        Ok(())
    }
}
