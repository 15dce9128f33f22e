use thiserror::Error;

use crate::support::{constraint::ConstraintError, dictionary::DictionaryError, units::Dimensions};

/// Errors raised while reading coefficients and mode switches.
///
/// A failed read never changes the configuration a model is running with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A mode switch holds a value outside its allow-list.
    #[error("unknown value '{value}' for '{key}', expected one of {allowed:?}")]
    UnknownSwitch {
        key: String,
        value: String,
        allowed: &'static [&'static str],
    },

    /// A dimensioned coefficient carries the wrong dimensions.
    #[error("dimensions of '{key}' are {found}, expected {expected}")]
    DimensionMismatch {
        key: String,
        expected: Dimensions,
        found: Dimensions,
    },

    /// An entry has the wrong kind, e.g. a word where a number belongs.
    #[error("entry '{key}' is a {found}, expected a {expected}")]
    WrongKind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A coefficient violates its numeric constraint.
    #[error("invalid value for '{key}'")]
    InvalidValue {
        key: String,
        #[source]
        source: ConstraintError,
    },

    /// The dictionary collaborator failed.
    #[error("coefficient dictionary unavailable")]
    Dictionary(#[from] DictionaryError),
}
