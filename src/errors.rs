//! Error types for schema compilation and value conversion.
//!
//! All failures are fail-fast: the first error aborts the operation and no
//! partial result is produced. There is no per-field error aggregation and
//! no retry; conversion is a pure function of (input, schema).

use thiserror::Error;

/// Result type for schema compilation
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while compiling a raw schema tree or gating its version
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// Root schema version rejected by the version gate
    #[error("Schema version '{0}' is not supported")]
    Version(String),

    /// Declared type name outside the closed type set
    #[error("Unknown schema type '{0}'")]
    UnknownType(String),

    /// Malformed pattern text in patternProperties
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Hook name not present in the registry
    #[error("Unknown {phase} hook '{name}'")]
    UnknownHook { phase: &'static str, name: String },

    /// Encoding name the string converter cannot decode
    #[error("Unsupported encoding '{0}'")]
    UnsupportedEncoding(String),

    /// A recognized schema key has the wrong shape
    #[error("Malformed schema: {0}")]
    Malformed(String),
}

/// Result type for conversions
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors raised while converting a value through a compiled schema
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// Compilation or version-gate failure surfaced through the converter
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A required named, pattern, or typeOf lookup found nothing
    #[error("Field '{field}' is missing in {section}")]
    FieldMiss {
        field: String,
        section: &'static str,
    },

    /// A primitive converter rejected the input value
    #[error("Cannot convert {kind} value '{detail}' to {target}")]
    FieldType {
        target: &'static str,
        kind: &'static str,
        detail: String,
    },

    /// Byte decoding failed under the strict policy
    #[error("Invalid {encoding} byte sequence at offset {offset}")]
    Decode {
        encoding: &'static str,
        offset: usize,
    },
}
