//! Generator configuration, decoded from the plugin parameter string.

use std::collections::HashMap;

use crate::casing::json_camel_case;
use crate::data::Field;

/// Separates entries inside `ts_import_roots` and `ts_import_root_aliases`.
pub const IMPORT_ROOT_SEPARATOR: char = ';';

#[derive(Clone, Debug)]
pub struct Options {
    /// Keep raw proto field names instead of camelCasing them.
    pub use_proto_names: bool,
    /// Prefer an explicit `json_name` override when present and distinct.
    pub use_json_name: bool,
    /// Emit `ServiceName.MethodName` static classes (legacy shape). When
    /// false, a client class plus free functions are emitted instead.
    pub use_static_classes: bool,
    /// The gateway sends zero values over the wire, so scalar fields are
    /// always present and only messages/lists may be null.
    pub emit_unpopulated: bool,
    /// Emit lintable output instead of the eslint-disable/ts-nocheck header.
    pub enable_styling_check: bool,
    /// Semicolon-separated list of directories that imports are resolved
    /// against, in order. Defaults to the working directory.
    pub ts_import_roots: String,
    /// Parallel semicolon-separated alias list; a non-empty entry replaces
    /// the matching root's prefix in resolved import paths.
    pub ts_import_root_aliases: String,
    /// Directory the shared fetch module is written to.
    pub fetch_module_directory: String,
    /// File name of the shared fetch module.
    pub fetch_module_filename: String,
    /// Per-target-file import override: maps a generated `.pb.ts` file name
    /// to a package specifier to import it from instead of a resolved path.
    pub ts_package_overrides: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            use_proto_names: false,
            use_json_name: false,
            use_static_classes: true,
            emit_unpopulated: false,
            enable_styling_check: false,
            ts_import_roots: String::new(),
            ts_import_root_aliases: String::new(),
            fetch_module_directory: ".".to_string(),
            fetch_module_filename: "fetch.pb.ts".to_string(),
            ts_package_overrides: HashMap::new(),
        }
    }
}

impl Options {
    /// Builds options from a parsed parameter map. Unknown keys are left for
    /// the caller (the plugin binary consumes `logtostderr`/`loglevel` from
    /// the same map).
    pub fn from_params(params: &HashMap<String, String>) -> Options {
        let mut opts = Options::default();
        if let Some(v) = params.get("use_proto_names") {
            opts.use_proto_names = param_bool(v);
        }
        if let Some(v) = params.get("use_json_name") {
            opts.use_json_name = param_bool(v);
        }
        if let Some(v) = params.get("use_static_classes") {
            opts.use_static_classes = param_bool(v);
        }
        if let Some(v) = params.get("emit_unpopulated") {
            opts.emit_unpopulated = param_bool(v);
        }
        if let Some(v) = params.get("enable_styling_check") {
            opts.enable_styling_check = param_bool(v);
        }
        if let Some(v) = params.get("ts_import_roots") {
            opts.ts_import_roots = v.clone();
        }
        if let Some(v) = params.get("ts_import_root_aliases") {
            opts.ts_import_root_aliases = v.clone();
        }
        if let Some(v) = params.get("fetch_module_directory") {
            opts.fetch_module_directory = v.clone();
        }
        if let Some(v) = params.get("fetch_module_filename") {
            opts.fetch_module_filename = v.clone();
        }
        opts
    }

    /// Applies the field-name policy: raw proto names under
    /// `use_proto_names`, protobuf-JSON camelCase otherwise.
    pub fn field_name(&self, name: &str) -> String {
        if self.use_proto_names {
            name.to_string()
        } else {
            json_camel_case(name)
        }
    }

    /// The object key a field is written under in the generated shape,
    /// honoring `use_json_name`.
    pub fn field_key(&self, field: &Field) -> String {
        let name = self.field_name(&field.name);
        if self.use_json_name && !field.json_name.is_empty() && field.json_name != field.name {
            return field.json_name.clone();
        }
        name
    }
}

/// Splits protoc's comma-separated `key=value` parameter string. A bare key
/// maps to the empty string.
pub fn parse_parameter(parameter: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in parameter.split(',') {
        match pair.split_once('=') {
            Some((k, v)) => params.insert(k.to_string(), v.to_string()),
            None => params.insert(pair.to_string(), String::new()),
        };
    }
    params
}

/// A present key counts as true unless explicitly disabled.
fn param_bool(value: &str) -> bool {
    !matches!(value, "false" | "0")
}
