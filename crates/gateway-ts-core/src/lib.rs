//! Schema analysis and type resolution for the gateway TypeScript generator.
//!
//! This crate is the analysis half of a protoc plugin: it walks an
//! already-decoded `CodeGeneratorRequest`, builds a registry of every named
//! type (messages, enums, map entries, services), classifies every field,
//! extracts HTTP bindings from `google.api.http` method options, and resolves
//! cross-file imports into a fully materialized per-file model. Rendering the
//! model into TypeScript source lives in `gateway-ts-codegen`; this crate
//! never produces target syntax beyond the URL/body expressions that are part
//! of the binding policy itself.
//!
//! Analysis is a two-pass batch transform:
//!
//! 1. every file in the request is walked once, populating the registry and
//!    accumulating unresolved external type names per file;
//! 2. once the registry is complete, each file's external references are
//!    resolved into a deduplicated list of import dependencies.
//!
//! The registry is mutated only during pass 1 and read-only afterwards.

pub mod casing;
pub mod data;
pub mod descriptor;
pub mod error;
pub mod options;
pub mod paths;
pub mod registry;
pub mod url;

mod deps;
mod field;
mod message;
mod service;

pub use error::{AnalysisError, Result};
pub use options::Options;
pub use registry::{Registry, TypeInfo, TypeKind};
