//! Analysis failures.
//!
//! Every variant is fatal: the transform is deterministic and offline, so
//! there is no retry or partial-output path. The plugin binary surfaces a
//! propagated error through the response's error field.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A type name recorded during pass 1 has no registry entry by pass 2.
    /// The schema references a type that was never seen, which would
    /// otherwise surface as a broken import in the generated code.
    #[error("cannot find type info for {fq_name}")]
    UnknownType { fq_name: String },

    /// An `google.api.http` rule carries none of the recognized
    /// GET/POST/PUT/PATCH/DELETE patterns.
    #[error("method {method} has an http rule without a supported method pattern")]
    MalformedBinding { method: String },

    /// A field descriptor carries a wire kind outside the closed scalar
    /// vocabulary and is not a message/enum/group reference.
    #[error("field {field} has unsupported wire type {kind}")]
    UnsupportedFieldKind { field: String, kind: i32 },

    /// Filesystem path normalization failed while resolving an import.
    #[error("error resolving import path from {source_file} to {target_file}")]
    PathResolution {
        source_file: String,
        target_file: String,
        #[source]
        cause: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
