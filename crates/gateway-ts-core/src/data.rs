//! The resolved per-file model handed to the emitter.
//!
//! Everything in here is plain data: analysis fills it in, the emitter only
//! reads it. Type references are kept as leading-dot fully qualified names
//! and resolved through the [`Registry`](crate::registry::Registry) rather
//! than copied around.

use std::collections::BTreeMap;

use crate::casing::{title_case, upper_first};
use crate::descriptor::field_descriptor_proto::Type as WireType;

/// The closed scalar vocabulary a field can map to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Bool,
    Bytes,
    Float,
    Double,
    Int32,
    Sint32,
    Uint32,
    Fixed32,
    Sfixed32,
    Int64,
    Sint64,
    Uint64,
    Fixed64,
    Sfixed64,
}

impl ScalarKind {
    /// Maps a descriptor wire type to a scalar kind. Message, enum and group
    /// fields are not scalars and return `None`; the caller classifies those
    /// by their fully qualified type name instead.
    pub fn from_wire_type(wire: WireType) -> Option<ScalarKind> {
        match wire {
            WireType::String => Some(ScalarKind::String),
            WireType::Bool => Some(ScalarKind::Bool),
            WireType::Bytes => Some(ScalarKind::Bytes),
            WireType::Float => Some(ScalarKind::Float),
            WireType::Double => Some(ScalarKind::Double),
            WireType::Int32 => Some(ScalarKind::Int32),
            WireType::Sint32 => Some(ScalarKind::Sint32),
            WireType::Uint32 => Some(ScalarKind::Uint32),
            WireType::Fixed32 => Some(ScalarKind::Fixed32),
            WireType::Sfixed32 => Some(ScalarKind::Sfixed32),
            WireType::Int64 => Some(ScalarKind::Int64),
            WireType::Sint64 => Some(ScalarKind::Sint64),
            WireType::Uint64 => Some(ScalarKind::Uint64),
            WireType::Fixed64 => Some(ScalarKind::Fixed64),
            WireType::Sfixed64 => Some(ScalarKind::Sfixed64),
            WireType::Message | WireType::Enum | WireType::Group => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Int32 => "int32",
            ScalarKind::Sint32 => "sint32",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Fixed32 => "fixed32",
            ScalarKind::Sfixed32 => "sfixed32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Sint64 => "sint64",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Fixed64 => "fixed64",
            ScalarKind::Sfixed64 => "sfixed64",
        }
    }
}

/// The classified type of a field: either a scalar or a reference to a named
/// type, deferred for resolution through the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Leading-dot fully qualified name of a message, enum or group type.
    Named(String),
}

impl FieldKind {
    pub fn fq_name(&self) -> Option<&str> {
        match self {
            FieldKind::Named(name) => Some(name),
            FieldKind::Scalar(_) => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldKind::Scalar(_))
    }
}

/// One use of a type: the classified kind plus cardinality and whether the
/// reference crosses the current package boundary. Shared by fields, method
/// arguments and map entry key/value slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeReference {
    pub kind: FieldKind,
    pub repeated: bool,
    pub external: bool,
}

impl TypeReference {
    pub fn singular(kind: FieldKind, external: bool) -> TypeReference {
        TypeReference {
            kind,
            repeated: false,
            external,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub type_ref: TypeReference,
    /// True when the descriptor carries a oneof index, including the
    /// synthetic oneof that models proto3 `optional`.
    pub is_oneof: bool,
    /// Group index, present only for membership in a real oneof group.
    pub oneof_index: Option<i32>,
    /// proto3 explicit `optional`, modeled internally as a singleton oneof
    /// but kept apart from real oneof grouping.
    pub is_optional: bool,
    pub is_deprecated: bool,
    /// Wire JSON name from the descriptor, used when `use_json_name` is set.
    pub json_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct Message {
    /// Package-level identifier, nested path concatenated: `OuterInner`.
    pub name: String,
    pub fields: Vec<Field>,
    /// Real oneof groups, keyed by group index, holding positions into
    /// `fields`. Created lazily the first time an index is seen.
    pub oneof_groups: BTreeMap<i32, Vec<usize>>,
}

impl Message {
    pub fn new(name: String) -> Message {
        Message {
            name,
            ..Message::default()
        }
    }

    /// Fields outside any oneof. Proto3 optional fields are excluded too,
    /// since the descriptor models them as singleton oneofs; they surface
    /// through `optional_fields` instead.
    pub fn non_oneof_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_oneof)
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_optional)
    }

    pub fn oneof_group_fields(&self, index: i32) -> impl Iterator<Item = &Field> {
        self.oneof_groups
            .get(&index)
            .into_iter()
            .flatten()
            .map(|&i| &self.fields[i])
    }
}

#[derive(Clone, Debug)]
pub struct Enum {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }

    /// `GET` -> `Get`, for deriving client method names.
    pub fn title(&self) -> String {
        title_case(self.as_str())
    }

    /// GET and DELETE requests carry no body; remaining request fields go
    /// into the query string instead.
    pub fn query_based(&self) -> bool {
        matches!(self, HttpVerb::Get | HttpVerb::Delete)
    }
}

#[derive(Clone, Debug)]
pub struct MethodArgument {
    pub type_ref: TypeReference,
}

/// One HTTP binding of an RPC. An RPC with additional bindings produces one
/// `Method` per binding; `binding_index` 0 is the primary one.
#[derive(Clone, Debug)]
pub struct Method {
    pub name: String,
    pub url: String,
    pub input: MethodArgument,
    pub output: MethodArgument,
    pub server_streaming: bool,
    pub http_verb: HttpVerb,
    /// `None` means the legacy whole-request body; `Some("")` no body;
    /// `Some("*")` whole request; anything else a field selector.
    pub http_request_body: Option<String>,
    pub binding_index: usize,
    /// Collision-resolved client-facing method name. Equals `name` for the
    /// primary binding.
    pub client_method_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct Service {
    pub name: String,
    pub methods: Vec<Method>,
}

/// One import statement of a generated file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    /// Identifier the import is bound to: `import * as <module> from ...`.
    pub module_identifier: String,
    /// Resolved, extension-stripped import path.
    pub source_file: String,
}

#[derive(Clone, Debug, Default)]
pub struct File {
    /// Proto file name as it appears in the request, e.g. `a/b/c.proto`.
    pub name: String,
    /// Output file name, `a/b/c.pb.ts`.
    pub ts_file_name: String,
    pub package: String,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub services: Vec<Service>,
    /// Fully qualified names of types referenced from other packages,
    /// accumulated during pass 1 and resolved into `dependencies` in pass 2.
    pub external_types: Vec<String>,
    pub dependencies: Vec<Dependency>,
}

impl File {
    pub fn new(name: &str, package: &str) -> File {
        File {
            name: name.to_string(),
            ts_file_name: ts_file_name(name),
            package: package.to_string(),
            ..File::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.enums.is_empty() && self.services.is_empty()
    }

    /// True when the emitter must also produce the shared fetch runtime
    /// module for this file's services.
    pub fn requires_fetch_module(&self) -> bool {
        self.services.iter().any(|s| !s.methods.is_empty())
    }
}

/// `a/b/foo.proto` -> `a/b/foo.pb.ts`.
pub fn ts_file_name(proto_file_name: &str) -> String {
    let stem = proto_file_name
        .strip_suffix(".proto")
        .unwrap_or(proto_file_name);
    format!("{stem}.pb.ts")
}

/// Derives the module identifier for an import out of the owning package and
/// file: package `one.two` + file `a/foo_bar.proto` -> `OneTwoFooBar`.
pub fn module_name(package: &str, file_name: &str) -> String {
    let mut out = String::new();
    for part in package.split('.').filter(|p| !p.is_empty()) {
        out.push_str(&upper_first(part));
    }
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    let base = base.strip_suffix(".proto").unwrap_or(base);
    for part in base.split(['_', '-', '.']).filter(|p| !p.is_empty()) {
        out.push_str(&upper_first(part));
    }
    out
}

/// Maps well-known wrapper types to native TypeScript equivalents. Types in
/// this table are never imported: the dependency resolver skips them and the
/// emitter substitutes the mapped representation in place.
pub fn well_known_type(fq_name: &str) -> Option<&'static str> {
    match fq_name {
        ".google.protobuf.BoolValue" => Some("boolean | null"),
        ".google.protobuf.StringValue" => Some("string | null"),
        ".google.protobuf.DoubleValue"
        | ".google.protobuf.FloatValue"
        | ".google.protobuf.Int32Value"
        | ".google.protobuf.Int64Value"
        | ".google.protobuf.UInt32Value"
        | ".google.protobuf.UInt64Value" => Some("number | null"),
        ".google.protobuf.ListValue" => Some("StructPBValue[]"),
        ".google.protobuf.Struct" => Some("{ [key: string]: StructPBValue }"),
        _ => None,
    }
}
