//! The process-scoped type catalog and the analysis driver.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use tracing::debug;

use crate::data::{File, TypeReference};
use crate::descriptor::CodeGeneratorRequest;
use crate::error::{AnalysisError, Result};
use crate::options::{Options, IMPORT_ROOT_SEPARATOR};
use crate::paths;

/// Shape discriminator of a registered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
    Service,
    /// Synthesized key/value pair message of a `map<K, V>` field, with the
    /// resolved key and value references.
    MapEntry {
        key: TypeReference,
        value: TypeReference,
    },
}

/// Location and shape of one named type. Created once when first encountered
/// during pass 1 and immutable afterwards; owned by the registry and looked
/// up by fully qualified name everywhere else.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    /// Canonical dotted name with a leading separator: `.pkg.Outer.Inner`.
    pub fq_name: String,
    pub package: String,
    /// Proto file the type is defined in; in TypeScript the generated module
    /// for that file is the namespace the type lives in.
    pub file: String,
    /// Identifier inside the owning package with the nested path flattened:
    /// `OuterInner`.
    pub package_identifier: String,
    /// Identifier in the type's local scope.
    pub local_identifier: String,
    pub kind: TypeKind,
}

impl TypeInfo {
    pub fn is_map_entry(&self) -> bool {
        matches!(self.kind, TypeKind::MapEntry { .. })
    }
}

/// Catalog of every named type in the request plus the knobs that influence
/// analysis. Populated during pass 1, read-only from then on.
pub struct Registry {
    pub options: Options,
    types: HashMap<String, TypeInfo>,
    files_to_generate: HashSet<String>,
    /// Import roots from `ts_import_roots`, absolutized, in configured order.
    pub(crate) ts_import_roots: Vec<PathBuf>,
    /// Parallel aliases, padded with empty entries to the root count.
    pub(crate) ts_import_root_aliases: Vec<String>,
}

impl Registry {
    pub fn new(options: Options) -> Result<Registry> {
        let (roots, aliases) = import_root_information(&options)?;
        debug!(roots = ?roots, aliases = ?aliases, "configured ts import roots");

        Ok(Registry {
            options,
            types: HashMap::new(),
            files_to_generate: HashSet::new(),
            ts_import_roots: roots,
            ts_import_root_aliases: aliases,
        })
    }

    /// Inserts a type, keeping the existing entry when the name was already
    /// registered (first write wins; re-registration is a no-op).
    pub fn register(&mut self, info: TypeInfo) {
        self.types.entry(info.fq_name.clone()).or_insert(info);
    }

    /// Looks up a fully qualified name. By pass 2 every referenced type must
    /// have been registered, so a miss is a schema inconsistency and fatal.
    pub fn lookup(&self, fq_name: &str) -> Result<&TypeInfo> {
        self.types.get(fq_name).ok_or_else(|| AnalysisError::UnknownType {
            fq_name: fq_name.to_string(),
        })
    }

    pub fn is_file_to_generate(&self, name: &str) -> bool {
        self.files_to_generate.contains(name)
    }

    /// Runs the full two-pass analysis over a plugin request and returns the
    /// resolved model, keyed by proto file name in request order.
    pub fn analyse(&mut self, req: &CodeGeneratorRequest) -> Result<BTreeMap<String, File>> {
        self.files_to_generate = req.file_to_generate.iter().cloned().collect();

        debug!(count = req.proto_file.len(), "analysing request files");
        let mut files = BTreeMap::new();
        for file in &req.proto_file {
            let file_data = self.analyse_file(file)?;
            files.insert(file_data.name.clone(), file_data);
        }

        // The registry is complete now, so every recorded external reference
        // can be resolved to a defining file and turned into an import.
        self.resolve_dependencies(&mut files)?;

        Ok(files)
    }

    /// Canonical fully qualified name: leading separator, then package, then
    /// the nested-type path, then the name itself.
    pub(crate) fn fq_name(package: &str, parents: &[String], name: &str) -> String {
        let mut parts = Vec::with_capacity(parents.len() + 2);
        if !package.is_empty() {
            parts.push(package.to_string());
        }
        parts.extend(parents.iter().cloned());
        parts.push(name.to_string());
        format!(".{}", parts.join("."))
    }

    /// Package-level identifier of a possibly nested declaration.
    pub(crate) fn package_identifier(parents: &[String], name: &str) -> String {
        let mut out = parents.concat();
        out.push_str(name);
        out
    }

    /// A reference is external iff it names a concrete proto type (leading
    /// separator present) and does not live under the current package.
    pub(crate) fn is_external_reference(fq_type_name: &str, package: &str) -> bool {
        fq_type_name.starts_with('.') && !fq_type_name.starts_with(&format!(".{package}"))
    }
}

/// Splits the configured import roots and aliases. Roots are made absolute;
/// extra aliases beyond the root count are dropped, missing ones padded.
fn import_root_information(options: &Options) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let roots_value = if options.ts_import_roots.is_empty() {
        "."
    } else {
        &options.ts_import_roots
    };

    let mut roots = Vec::new();
    for root in roots_value.split(IMPORT_ROOT_SEPARATOR) {
        let abs = paths::absolute(root.as_ref()).map_err(|cause| AnalysisError::PathResolution {
            source_file: root.to_string(),
            target_file: String::new(),
            cause,
        })?;
        roots.push(abs);
    }

    let mut aliases = vec![String::new(); roots.len()];
    for (i, alias) in options
        .ts_import_root_aliases
        .split(IMPORT_ROOT_SEPARATOR)
        .enumerate()
    {
        if i >= roots.len() {
            break;
        }
        aliases[i] = alias.to_string();
    }

    Ok((roots, aliases))
}
