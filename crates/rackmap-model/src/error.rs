//! Validation errors raised by the domain model.

use thiserror::Error;

/// Structured validation failures surfaced to forms and API callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A context document was not a JSON object.
    #[error("invalid value for '{field}': JSON data must be in object form")]
    NotAnObject {
        /// Field that held the malformed document.
        field: &'static str,
    },
    /// A context weight fell outside the persistable range.
    #[error("invalid value for 'weight': must be between 0 and 32767")]
    WeightOutOfRange {
        /// Offending weight value.
        value: i32,
    },
    /// A context name was empty.
    #[error("invalid value for 'name': must not be empty")]
    NameEmpty,
    /// An organisational entity kind label was not recognised.
    #[error("'{value}' is not a known entity kind")]
    UnknownEntityKind {
        /// Label provided by the caller.
        value: String,
    },
}

impl ModelError {
    /// Name of the field the error should be attached to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NotAnObject { field } => field,
            Self::WeightOutOfRange { .. } => "weight",
            Self::NameEmpty => "name",
            Self::UnknownEntityKind { .. } => "kind",
        }
    }
}
