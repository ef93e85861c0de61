//! Tracking number normalization
//!
//! Every carrier matches against the normalized form: all whitespace removed,
//! letters uppercased. Normalizing twice yields the same string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize a raw tracking number (strip whitespace, uppercase)
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A normalized tracking number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Normalize `raw` into a tracking number
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    /// The normalized number
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the normalized number
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether nothing survived normalization
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for TrackingNumber {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for TrackingNumber {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<TrackingNumber> for String {
    fn from(number: TrackingNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
