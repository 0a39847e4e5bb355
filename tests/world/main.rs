//! Integration tests for Layer 2: World
//!
//! Tests for the in-memory store, tasks driving scripts against it, and
//! world snapshots.

mod persistence;
mod store;
mod task;
