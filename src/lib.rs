//! NML - a resumable scripting language for verbs on persistent world objects
//!
//! This crate re-exports all layers of the NML system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: nml_runtime     - REPL, CLI
//! Layer 2: nml_world       - Object store capability, task driver, tracing
//! Layer 1: nml_language    - Lexer, grouper, statement assembler, VM
//! Layer 0: nml_foundation  - Core types (Value, ObjectId, errors)
//! ```

pub use nml_foundation as foundation;
pub use nml_language as language;
pub use nml_runtime as runtime;
pub use nml_world as world;
