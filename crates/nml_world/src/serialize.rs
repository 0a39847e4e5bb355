//! World snapshots in `MessagePack`.
//!
//! A [`Snapshot`] holds every object, every alias, and the position of the
//! id generator, so a reloaded world keeps handing out the same ids the
//! saved one would have.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nml_foundation::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::memory::{MemoryStore, World};

/// Serializable state of a [`MemoryStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub(crate) seed: u64,
    pub(crate) word_pos: u64,
    pub(crate) world: World,
}

/// Serializes a store to bytes, keeping struct field names.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails.
pub fn to_bytes(store: &MemoryStore) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(&store.snapshot()).map_err(|e| Error::Serialization(e.to_string()))
}

/// Rebuilds a store from bytes written by [`to_bytes`].
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the bytes are not a snapshot.
pub fn from_bytes(bytes: &[u8]) -> Result<MemoryStore> {
    let snapshot: Snapshot =
        rmp_serde::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(MemoryStore::from_snapshot(snapshot))
}

/// Saves a store to a file, replacing any existing file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written and
/// [`Error::Serialization`] if encoding fails.
pub fn save_to_file<P: AsRef<Path>>(store: &MemoryStore, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(store)?;
    let file = File::create(path)
        .map_err(|e| Error::Io(format!("failed to create file '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| Error::Io(format!("failed to write file '{}': {e}", path.display())))
}

/// Loads a store saved with [`save_to_file`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::Serialization`] if it does not hold a snapshot.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<MemoryStore> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::Io(format!("failed to open file '{}': {e}", path.display())))?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Io(format!("failed to read file '{}': {e}", path.display())))?;

    from_bytes(&bytes)
}
