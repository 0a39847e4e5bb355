//! Worlds for NML scripts to run in.
//!
//! This crate provides:
//! - [`ObjectStore`] - The async collaborator a running script talks to
//! - [`MemoryStore`] - An in-memory world of objects, properties, and verbs
//! - [`Task`] - Drives a [`Vm`](nml_language::Vm) to completion against a store
//! - [`trace`] - Ring-buffered tracing of task execution
//! - [`serialize`] - `MessagePack` snapshots of a world

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod memory;
pub mod serialize;
pub mod store;
pub mod task;
pub mod trace;

pub use memory::{MObject, MemoryStore};
pub use serialize::{Snapshot, from_bytes, load_from_file, save_to_file, to_bytes};
pub use store::{ObjectStore, serve};
pub use task::{Task, TaskConfig, Tick};
pub use trace::{HumanFormatter, TraceBuffer, TraceEvent, TraceRecord, Tracer, TracerConfig};
