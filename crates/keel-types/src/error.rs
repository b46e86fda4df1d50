use thiserror::Error;

/// Errors produced while building type descriptors.
///
/// The panicking constructors ([`Type::structure`](crate::Type::structure),
/// [`Struct::new`](crate::Struct::new)) treat these as invariant violations.
/// The `try_` variants return them so that callers validating external input
/// (such as the derivation engine) can report them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Name does not match `[a-zA-Z][a-zA-Z0-9_]*`.
    #[error("Invalid struct field name: {0}")]
    InvalidFieldName(String),

    /// Non-empty struct name that fails the field-name grammar.
    #[error("Invalid struct name: {0}")]
    InvalidStructName(String),

    /// Field list not strictly increasing by name.
    #[error("Field names must be unique and ordered alphabetically: {previous:?} then {next:?}")]
    FieldsOutOfOrder { previous: String, next: String },
}

/// Convenience alias for type-construction results.
pub type TypeResult<T> = Result<T, TypeError>;
