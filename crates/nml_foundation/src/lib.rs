//! Core values, object identifiers, and error types for NML.
//!
//! This crate provides:
//! - [`Value`] - The runtime value type manipulated by NML scripts
//! - [`ObjectId`] - Identifiers of persistent world objects
//! - [`ValueType`] - Type tags used by the operator compatibility table
//! - [`SyntaxError`], [`RuntimeError`], [`Error`] - Error families

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod object;
pub mod types;
pub mod value;

pub use error::{Error, Result, RuntimeError, SyntaxError};
pub use object::ObjectId;
pub use types::ValueType;
pub use value::Value;
