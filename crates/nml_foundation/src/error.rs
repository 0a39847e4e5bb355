//! Error types for the NML system.
//!
//! Uses `thiserror` for ergonomic error definition. There are two families:
//! [`SyntaxError`] for rejected compiles and [`RuntimeError`] for failures
//! surfaced by the interpreter or its storage collaborator. [`Error`] wraps
//! both for the outer layers.

use thiserror::Error;

use crate::object::ObjectId;
use crate::types::ValueType;

/// A compile-time error from the lexer, grouper, or statement assembler.
///
/// Always carries the 1-based line number of the offending source line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    /// 1-based line number.
    pub line: usize,
    /// Description of the problem.
    pub message: String,
}

impl SyntaxError {
    /// Creates a syntax error for the given line.
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Errors raised while executing a script.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RuntimeError {
    /// The script has no further statements. Not a failure.
    #[error("end of script")]
    EndOfScript,

    /// Operator applied to incompatible operand types.
    #[error("type {right} cannot be opped {op} with {left}")]
    TypeMismatch {
        /// The operator symbol.
        op: String,
        /// Type of the left operand.
        left: ValueType,
        /// Type of the right operand.
        right: ValueType,
    },

    /// An index was applied to a value that is not an array.
    #[error("cannot index into a value of type {0}")]
    NonIndexable(ValueType),

    /// An array index was outside the array.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The length of the array.
        length: usize,
    },

    /// A property does not exist on the object or its ancestors.
    #[error("property not found: {0}")]
    PropNotFound(String),

    /// No object in the inheritance chain defines the verb.
    #[error("verb not found: {0}")]
    VerbNotFound(String),

    /// The referenced object does not exist.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object-id alias (`##NAME`) is not registered.
    #[error("unknown object alias: ##{0}")]
    UnknownAlias(String),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An expression could not be reduced to a single value.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// A verb's source failed to compile when it was called.
    #[error("verb failed to compile: {0}")]
    Compile(SyntaxError),

    /// Verb delegation nested deeper than the configured limit.
    #[error("call depth exceeded ({0})")]
    CallDepthExceeded(usize),

    /// A task ran out of ticks before its script ended.
    #[error("tick limit exceeded ({0})")]
    TickLimitExceeded(u64),

    /// The collaborator answered a request with the wrong kind of reply.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl RuntimeError {
    /// Returns true for the normal end-of-script signal.
    #[must_use]
    pub const fn is_end_of_script(&self) -> bool {
        matches!(self, Self::EndOfScript)
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(op: impl Into<String>, left: ValueType, right: ValueType) -> Self {
        Self::TypeMismatch {
            op: op.into(),
            left,
            right,
        }
    }
}

impl From<SyntaxError> for RuntimeError {
    fn from(err: SyntaxError) -> Self {
        Self::Compile(err)
    }
}

/// The main error type for operations that span layers.
#[derive(Debug, Error)]
pub enum Error {
    /// A rejected compile.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A runtime failure.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// I/O failure (files, terminal).
    #[error("I/O error: {0}")]
    Io(String),

    /// Snapshot encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for cross-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_names_line() {
        let err = SyntaxError::new(3, "no blocks to end");
        assert_eq!(err.to_string(), "line 3: no blocks to end");
    }

    #[test]
    fn type_mismatch_names_both_types_and_operator() {
        let err = RuntimeError::type_mismatch("-", ValueType::String, ValueType::Number);
        let msg = err.to_string();
        assert!(msg.contains("string"));
        assert!(msg.contains("number"));
        assert!(msg.contains('-'));
    }

    #[test]
    fn end_of_script_is_distinguished() {
        assert!(RuntimeError::EndOfScript.is_end_of_script());
        assert!(!RuntimeError::DivisionByZero.is_end_of_script());
    }

    #[test]
    fn error_wraps_families() {
        let err: Error = SyntaxError::new(1, "bad").into();
        assert!(matches!(err, Error::Syntax(_)));
        let err: Error = RuntimeError::VerbNotFound("look".into()).into();
        assert!(err.to_string().contains("look"));
    }
}
