//! Error types for type derivation.

use keel_types::TypeError;

/// Errors returned while deriving a type descriptor from a native shape.
///
/// All of these describe a problem with the native type being derived and
/// are safe to report to a caller. Broken custom hooks are not errors; they
/// panic (see [`CustomType`](crate::CustomType)).
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    /// The native kind has no keel counterpart.
    #[error("Type is not supported, kind: {kind}, type: {type_name}")]
    Unsupported { kind: String, type_name: String },

    /// A keel collection or ref was used without concrete parameters.
    #[error("Cannot marshal type {type_name}, it requires type parameters")]
    RequiresTypeParameters { type_name: String },

    /// A field is marked as an embedded (flattened) struct.
    #[error("Embedded structs are not supported, type: {type_name}")]
    EmbeddedStruct { type_name: String },

    /// A private field without the `"-"` skip tag.
    #[error("Non exported fields are not supported, type: {type_name}")]
    NonExportedField { type_name: String, field: String },

    /// A tag option other than `omitempty`, `set` or `original`.
    #[error("Unrecognized tag: {0}")]
    UnrecognizedTag(String),

    /// Two fields resolve to the same keel field name.
    #[error("Duplicate struct field name: {field}, type: {type_name}")]
    DuplicateField { type_name: String, field: String },

    /// Shape nesting went past [`DeriveConfig::max_depth`](crate::DeriveConfig::max_depth).
    #[error("Type nesting exceeds the maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },

    /// Invalid struct or field names.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Error returned by a custom derivation hook, passed through unchanged.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl DeriveError {
    /// Wrap an error from a custom derivation hook.
    pub fn custom(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Custom(err.into())
    }
}

/// Convenience alias for derivation results.
pub type DeriveResult<T> = Result<T, DeriveError>;
