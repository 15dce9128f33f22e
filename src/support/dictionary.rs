//! Keyword dictionaries supplying model coefficients and mode switches.
//!
//! The on-disk format belongs to the host. A host parses whatever it reads
//! into a [`Dictionary`] (it implements [`serde::Deserialize`]) and hands it
//! to a model through [`DictionarySource`].
//!
//! ```
//! use twine_turbulence::support::dictionary::{Dictionary, DictionarySource, Entry};
//!
//! let ras: Dictionary = serde_json::from_str(r#"{
//!     "turbulentPotentialCoeffs": {
//!         "cMu": 0.21,
//!         "kMin": { "dimensions": [0, 2, -2, 0, 0, 0, 0], "value": 1e-10 },
//!         "tslimiter": "kolmogorov"
//!     }
//! }"#).unwrap();
//!
//! let coeffs = ras.coeffs("turbulentPotential").unwrap();
//! assert_eq!(coeffs.get("cMu"), Some(&Entry::Scalar(0.21)));
//! assert_eq!(coeffs.get("tslimiter"), Some(&Entry::Word("kolmogorov".into())));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::support::units::Dimensions;

/// A single dictionary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// A bare number; its dimensions are whatever the reader expects.
    Scalar(f64),
    /// A number tagged with explicit dimensions.
    Dimensioned(DimensionedScalar),
    /// A keyword, used for mode switches.
    Word(String),
    /// A nested dictionary.
    Dict(Dictionary),
}

impl Entry {
    /// Describes the entry kind for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Scalar(_) => "scalar",
            Entry::Dimensioned(_) => "dimensioned scalar",
            Entry::Word(_) => "word",
            Entry::Dict(_) => "dictionary",
        }
    }
}

/// A number with its dimension tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionedScalar {
    pub dimensions: Dimensions,
    pub value: f64,
}

impl DimensionedScalar {
    #[must_use]
    pub fn new(dimensions: Dimensions, value: f64) -> Self {
        Self { dimensions, value }
    }
}

impl From<f64> for Entry {
    fn from(value: f64) -> Self {
        Entry::Scalar(value)
    }
}

impl From<DimensionedScalar> for Entry {
    fn from(value: DimensionedScalar) -> Self {
        Entry::Dimensioned(value)
    }
}

impl From<&str> for Entry {
    fn from(word: &str) -> Self {
        Entry::Word(word.to_owned())
    }
}

impl From<String> for Entry {
    fn from(word: String) -> Self {
        Entry::Word(word)
    }
}

impl From<Dictionary> for Entry {
    fn from(dict: Dictionary) -> Self {
        Entry::Dict(dict)
    }
}

/// An ordered keyword-to-entry map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary {
    entries: BTreeMap<String, Entry>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dictionary with `key` set to `entry`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.insert(key, entry);
        self
    }

    /// Sets `key` to `entry`, returning the previous entry if any.
    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(key.into(), entry.into())
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Looks up a nested dictionary.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::NotADictionary`] if the key holds another kind of entry.
    pub fn sub_dict(&self, key: &str) -> Result<Option<&Dictionary>, DictionaryError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Dict(dict)) => Ok(Some(dict)),
            Some(other) => Err(DictionaryError::NotADictionary {
                key: key.to_owned(),
                found: other.kind(),
            }),
        }
    }

    /// Iterates over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors raised by a dictionary collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DictionaryError {
    /// A key expected to hold a nested dictionary holds something else.
    #[error("entry '{key}' is a {found}, expected a dictionary")]
    NotADictionary { key: String, found: &'static str },

    /// The source could not produce a dictionary at all.
    #[error("dictionary unavailable: {context}")]
    Unavailable { context: String },
}

/// Supplies the coefficient dictionary for a named model.
///
/// A model calls this once at construction and again on every reload, so an
/// implementation may re-read its backing store each time.
pub trait DictionarySource {
    /// Returns the coefficient dictionary for `model_name`.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError`] if the dictionary cannot be produced.
    fn coeffs(&self, model_name: &str) -> Result<Dictionary, DictionaryError>;
}

/// A properties dictionary holding one `<modelName>Coeffs` sub-dictionary per model.
///
/// A missing sub-dictionary yields an empty one, so every entry takes its default.
impl DictionarySource for Dictionary {
    fn coeffs(&self, model_name: &str) -> Result<Dictionary, DictionaryError> {
        let key = format!("{model_name}Coeffs");
        Ok(self.sub_dict(&key)?.cloned().unwrap_or_default())
    }
}
