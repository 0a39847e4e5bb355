//! Persistent world object identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of an object in the persistent world graph.
///
/// Written in scripts as `#` followed by up to 16 hex digits (`#1f`).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Maximum number of hex digits in a written object id.
    pub const MAX_DIGITS: usize = 16;

    /// Creates an object id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Parses the hex digits of an object id (without the leading `#`).
    ///
    /// Returns `None` for empty input, non-hex characters, or more than
    /// [`Self::MAX_DIGITS`] digits.
    #[must_use]
    pub fn from_hex(digits: &str) -> Option<Self> {
        if digits.is_empty()
            || digits.len() > Self::MAX_DIGITS
            || !digits.chars().all(|c| c.is_ascii_hexdigit())
        {
            return None;
        }
        u64::from_str_radix(digits, 16).ok().map(Self)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(#{:x})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}
