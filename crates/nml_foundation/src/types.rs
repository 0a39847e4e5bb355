//! Type tags for runtime values.
//!
//! The operator compatibility table is indexed by these tags.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The dynamic type of a [`crate::Value`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    /// The null type (only value: null).
    Null,
    /// Boolean type.
    Bool,
    /// The single numeric type.
    Number,
    /// String type.
    String,
    /// Array of values.
    Array,
    /// Reference to a world object.
    Object,
}

impl ValueType {
    /// Returns the name scripts and error messages use for this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
