//! REPL, CLI, and sessions for NML.
//!
//! This crate provides:
//! - [`Session`] - A world, a session object, and the native verbs scripts
//!   can call
//! - [`Repl`] - The line-buffered interactive loop
//! - [`LineEditor`] - The editor seam, with a rustyline implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod highlight;
pub mod repl;
pub mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use highlight::NmlHighlighter;
pub use repl::{Outcome, Repl};
pub use session::{NATIVE_VERBS, Session, SessionConfig, SessionStore};
