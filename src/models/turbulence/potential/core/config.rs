//! Coefficients and mode switches read from the model's dictionary.
//!
//! Every entry is optional; an absent key takes its default. A present key
//! must be well formed: numbers may be plain or carry exactly the expected
//! dimensions, and switches must name a value from their allow-list. Reading
//! is all or nothing, so a caller either gets a complete [`Config`] or an
//! error naming the offending entry.

mod coefficients;
mod error;
mod switches;

pub use coefficients::Coefficients;
pub use error::ConfigError;
pub use switches::{
    Cep2Variant, EpsHatVariant, Keyword, Production, PsiProduction, SigmaBlend, Switches,
    TimeScale, TimeScaleLimiter,
};

use crate::support::{
    dictionary::{Dictionary, Entry},
    units::Dimensions,
};

/// The complete configuration of a turbulent-potential model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Config {
    pub coefficients: Coefficients,
    pub switches: Switches,
}

impl Config {
    /// Reads coefficients and switches from a coefficient dictionary.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for the first malformed entry.
    pub fn from_dictionary(dict: &Dictionary) -> Result<Self, ConfigError> {
        Ok(Self {
            coefficients: Coefficients::from_dictionary(dict)?,
            switches: Switches::from_dictionary(dict)?,
        })
    }
}

/// Looks up a number, checking its dimensions if it carries any.
fn scalar(
    dict: &Dictionary,
    key: &str,
    expected: Dimensions,
    default: f64,
) -> Result<f64, ConfigError> {
    match dict.get(key) {
        None => Ok(default),
        Some(Entry::Scalar(value)) => Ok(*value),
        Some(Entry::Dimensioned(d)) if d.dimensions == expected => Ok(d.value),
        Some(Entry::Dimensioned(d)) => Err(ConfigError::DimensionMismatch {
            key: key.to_owned(),
            expected,
            found: d.dimensions,
        }),
        Some(other) => Err(ConfigError::WrongKind {
            key: key.to_owned(),
            expected: "scalar",
            found: other.kind(),
        }),
    }
}

/// Looks up a keyword.
fn word<'a>(dict: &'a Dictionary, key: &str) -> Result<Option<&'a str>, ConfigError> {
    match dict.get(key) {
        None => Ok(None),
        Some(Entry::Word(word)) => Ok(Some(word)),
        Some(other) => Err(ConfigError::WrongKind {
            key: key.to_owned(),
            expected: "word",
            found: other.kind(),
        }),
    }
}
