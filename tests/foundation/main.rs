//! Integration tests for Layer 0: Foundation
//!
//! Tests for values, object ids, and the error families.

mod errors;
mod values;
