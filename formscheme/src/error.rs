//! Error types for the two failure tiers.
//!
//! Construction-time errors ([`SchemeError`]) are fatal schema misuse — no
//! scheme is produced. Runtime errors ([`ContextError`]) cover programmer
//! misuse of a context and snapshot refusal. Ordinary invalid user input is
//! never an error: it is returned as per-field message lists.

use thiserror::Error;

/// Result type for scheme construction.
pub type SchemeResult<T> = std::result::Result<T, SchemeError>;

/// Result type for context operations.
pub type ContextResult<T> = std::result::Result<T, ContextError>;

/// Errors raised while defining a scheme.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemeError {
    /// The same field name was registered twice at one level.
    #[error("duplicate field name: {name}")]
    DuplicateField { name: String },

    /// A config option was applied to a field kind that doesn't carry it.
    #[error("option '{option}' is not supported by field '{field}'")]
    IncompatibleOption { field: String, option: &'static str },
}

/// Errors raised while operating on a validation context.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContextError {
    /// The field path does not exist in the bound scheme.
    #[error("unknown field path: {path}")]
    UnknownField { path: String },

    /// The operation requires a leaf field but the path names a nested object.
    #[error("field path is not a leaf: {path}")]
    NotALeaf { path: String },

    /// Snapshot refused while one or more fields are invalid.
    #[error("cannot assemble model, invalid fields: {}", invalid.join(", "))]
    IncompleteModel { invalid: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_display() {
        let err = SchemeError::DuplicateField {
            name: "firstName".into(),
        };
        assert_eq!(err.to_string(), "duplicate field name: firstName");
    }

    #[test]
    fn incomplete_model_lists_fields() {
        let err = ContextError::IncompleteModel {
            invalid: vec!["firstName".into(), "birthDate".into()],
        };
        assert!(err.to_string().contains("firstName, birthDate"));
    }
}
