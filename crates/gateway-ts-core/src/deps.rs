//! Pass 2: turning each file's recorded external type names into a minimal,
//! deduplicated list of resolved import dependencies.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::data::{module_name, ts_file_name, well_known_type, Dependency, File};
use crate::error::{AnalysisError, Result};
use crate::paths;
use crate::registry::Registry;

impl Registry {
    /// Resolves every file's external references against the now-complete
    /// registry. At most one dependency is produced per (package, file)
    /// pair, no matter how many of its types are used.
    pub(crate) fn resolve_dependencies(&self, files: &mut BTreeMap<String, File>) -> Result<()> {
        for file_data in files.values_mut() {
            debug!(file = %file_data.ts_file_name, "collecting dependencies");
            let mut dependencies: BTreeMap<String, Dependency> = BTreeMap::new();

            for type_name in &file_data.external_types {
                let info = self.lookup(type_name)?;
                if well_known_type(type_name).is_some() {
                    // well-known wrappers map to native types; nothing to import
                    continue;
                }

                let identifier = format!("{}|{}", info.package, info.file);
                if dependencies.contains_key(&identifier) {
                    continue;
                }

                let source_file = self.import_source_file(&file_data.ts_file_name, &info.file)?;
                dependencies.insert(
                    identifier,
                    Dependency {
                        module_identifier: module_name(&info.package, &info.file),
                        source_file,
                    },
                );
            }

            file_data.dependencies = dependencies.into_values().collect();
            file_data
                .dependencies
                .sort_by(|a, b| a.module_identifier.cmp(&b.module_identifier));
        }

        Ok(())
    }

    /// Import path for one target proto file as seen from `base`, trying the
    /// package override table, then the configured import roots (with alias
    /// substitution), then a relative path.
    fn import_source_file(&self, base: &str, target_proto: &str) -> Result<String> {
        let target_ts = ts_file_name(target_proto);

        if let Some(pkg) = self.options.ts_package_overrides.get(&target_ts) {
            debug!(target = %target_ts, package = %pkg, "package import override found");
            return Ok(pkg.clone());
        }

        // first root that actually contains the target proto file wins
        let found = self
            .ts_import_roots
            .iter()
            .position(|root| root.join(target_proto).exists());

        let (target, root, alias) = match found {
            Some(i) => (
                self.ts_import_roots[i].join(&target_ts),
                Some(self.ts_import_roots[i].as_path()),
                self.ts_import_root_aliases[i].as_str(),
            ),
            None => (PathBuf::from(&target_ts), None, ""),
        };

        let resolved = self.source_path(base, &target, root, alias)?;
        Ok(paths::strip_ts_suffix(&resolved))
    }

    /// Alias-substituted absolute path when an alias is configured for the
    /// matched root, otherwise a `./`-prefixed relative path from the
    /// consuming file's directory.
    fn source_path(
        &self,
        base: &str,
        target: &Path,
        root: Option<&Path>,
        alias: &str,
    ) -> Result<String> {
        let path_error = |cause: std::io::Error| AnalysisError::PathResolution {
            source_file: base.to_string(),
            target_file: target.display().to_string(),
            cause,
        };

        let abs_target = paths::absolute(target).map_err(path_error)?;

        if let (Some(root), false) = (root, alias.is_empty()) {
            let abs_root = paths::absolute(root).map_err(path_error)?;
            let substituted = paths::to_slash(&abs_target).replace(&paths::to_slash(&abs_root), alias);
            debug!(alias = %alias, target = %target.display(), result = %substituted, "replaced import root with alias");
            return Ok(substituted);
        }

        debug!(target = %target.display(), "no root alias, using relative path");
        let abs_base = paths::absolute(base.as_ref()).map_err(path_error)?;
        let base_dir = abs_base.parent().unwrap_or(Path::new("/"));
        let rel = paths::relative(base_dir, &abs_target).ok_or_else(|| {
            path_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "cannot compute relative path",
            ))
        })?;

        let slash_path = paths::to_slash(&rel);
        // imports from a subdirectory carry no ./ prefix by construction
        if slash_path.starts_with("../") {
            Ok(slash_path)
        } else {
            Ok(format!("./{slash_path}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::registry::{TypeInfo, TypeKind};

    fn registry_with(options: Options, types: &[(&str, &str, &str)]) -> Registry {
        let mut reg = Registry::new(options).unwrap();
        for (fq, package, file) in types {
            reg.register(TypeInfo {
                fq_name: fq.to_string(),
                package: package.to_string(),
                file: file.to_string(),
                package_identifier: fq.rsplit('.').next().unwrap().to_string(),
                local_identifier: fq.rsplit('.').next().unwrap().to_string(),
                kind: TypeKind::Message,
            });
        }
        reg
    }

    fn file_with_externals(name: &str, package: &str, externals: &[&str]) -> File {
        let mut file = File::new(name, package);
        file.external_types = externals.iter().map(|s| s.to_string()).collect();
        file
    }

    fn resolve(reg: &Registry, file: File) -> File {
        let mut files = BTreeMap::new();
        files.insert(file.name.clone(), file);
        reg.resolve_dependencies(&mut files).unwrap();
        files.into_values().next().unwrap()
    }

    #[test]
    fn types_from_one_file_dedupe_into_one_dependency() {
        let reg = registry_with(
            Options::default(),
            &[
                (".other.A", "other", "other/types.proto"),
                (".other.B", "other", "other/types.proto"),
                (".other.C", "other", "other/types.proto"),
            ],
        );
        let file = file_with_externals(
            "svc.proto",
            "pkg",
            &[".other.A", ".other.B", ".other.C", ".other.A"],
        );

        let resolved = resolve(&reg, file);
        assert_eq!(resolved.dependencies.len(), 1);
        let dep = &resolved.dependencies[0];
        assert_eq!(dep.module_identifier, "OtherTypes");
        assert_eq!(dep.source_file, "./other/types.pb");
    }

    #[test]
    fn well_known_wrappers_are_never_imported() {
        let reg = registry_with(
            Options::default(),
            &[(
                ".google.protobuf.StringValue",
                "google.protobuf",
                "google/protobuf/wrappers.proto",
            )],
        );
        let file = file_with_externals("svc.proto", "pkg", &[".google.protobuf.StringValue"]);

        let resolved = resolve(&reg, file);
        assert!(resolved.dependencies.is_empty());
    }

    #[test]
    fn unresolvable_type_aborts_resolution() {
        let reg = registry_with(Options::default(), &[]);
        let mut files = BTreeMap::new();
        files.insert(
            "svc.proto".to_string(),
            file_with_externals("svc.proto", "pkg", &[".ghost.Type"]),
        );
        let err = reg.resolve_dependencies(&mut files).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownType { fq_name } if fq_name == ".ghost.Type"));
    }

    #[test]
    fn package_override_beats_path_resolution() {
        let mut options = Options::default();
        options
            .ts_package_overrides
            .insert("other/types.pb.ts".to_string(), "@acme/protos".to_string());
        let reg = registry_with(options, &[(".other.A", "other", "other/types.proto")]);
        let file = file_with_externals("svc.proto", "pkg", &[".other.A"]);

        let resolved = resolve(&reg, file);
        assert_eq!(resolved.dependencies[0].source_file, "@acme/protos");
    }

    #[test]
    fn aliased_root_substitutes_instead_of_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let root_a = dir.path().join("a");
        let root_b = dir.path().join("b");
        std::fs::create_dir_all(root_b.join("other")).unwrap();
        std::fs::create_dir_all(&root_a).unwrap();
        std::fs::write(root_b.join("other/types.proto"), "").unwrap();

        let options = Options {
            ts_import_roots: format!("{};{}", root_a.display(), root_b.display()),
            ts_import_root_aliases: ";@alias".to_string(),
            ..Options::default()
        };
        let reg = registry_with(options, &[(".other.A", "other", "other/types.proto")]);
        let file = file_with_externals("svc.proto", "pkg", &[".other.A"]);

        let resolved = resolve(&reg, file);
        assert_eq!(resolved.dependencies[0].source_file, "@alias/other/types.pb");
    }

    #[test]
    fn unmatched_target_falls_back_to_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            ts_import_roots: dir.path().display().to_string(),
            ts_import_root_aliases: "@alias".to_string(),
            ..Options::default()
        };
        let reg = registry_with(options, &[(".other.A", "other", "other/types.proto")]);
        let file = file_with_externals("api/svc.proto", "pkg", &[".other.A"]);

        let resolved = resolve(&reg, file);
        assert_eq!(resolved.dependencies[0].source_file, "../other/types.pb");
    }
}
