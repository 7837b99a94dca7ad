//! JSON directory snapshots.
//!
//! A snapshot is an export of directory entries the scan runs against
//! offline:
//!
//! ```json
//! {
//!   "entries": [
//!     {
//!       "path": "GC://dc.example.com/CN=Sales,OU=Groups,DC=example,DC=com",
//!       "properties": {
//!         "distinguishedName": ["CN=Sales,OU=Groups,DC=example,DC=com"],
//!         "objectSid": [{ "sid": "S-1-5-21-111111111-222222222-333333333-1105" }],
//!         "groupType": [-2147483646]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Every attribute maps to a list of values. A value is a string, an
//! integer, an array of bytes, or `{ "sid": "S-1-..." }` for a SID stored in
//! its binary form.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::{MemoryDirectory, PropertyValue, SearchEntry};
use crate::DecodedSid;

/// A snapshot could not be loaded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The file could not be read.
    #[error("failed to read snapshot")]
    Io(#[from] std::io::Error),
    /// The file is not a valid snapshot document.
    #[error("invalid snapshot document")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotEntry {
    path: String,
    #[serde(default)]
    properties: BTreeMap<String, Vec<SnapshotValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotValue {
    Text(String),
    Integer(i64),
    Bytes(Vec<u8>),
    Sid { sid: DecodedSid },
}

impl From<SnapshotValue> for PropertyValue {
    fn from(value: SnapshotValue) -> Self {
        match value {
            SnapshotValue::Text(text) => Self::Text(text),
            SnapshotValue::Integer(value) => Self::Integer(value),
            SnapshotValue::Bytes(bytes) => Self::Binary(bytes),
            SnapshotValue::Sid { sid } => Self::Binary(sid.to_binary()),
        }
    }
}

impl From<SnapshotEntry> for SearchEntry {
    fn from(entry: SnapshotEntry) -> Self {
        let mut result = Self::new(entry.path);
        for (name, values) in entry.properties {
            result
                .properties
                .insert(&name, values.into_iter().map(PropertyValue::from).collect());
        }
        result
    }
}

/// Reads a snapshot document.
///
/// # Errors
/// [`SnapshotError`] on I/O failure or malformed JSON.
#[inline]
pub fn from_reader<R: Read>(reader: R) -> Result<MemoryDirectory, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    Ok(snapshot
        .entries
        .into_iter()
        .map(SearchEntry::from)
        .collect())
}

/// Loads a snapshot file.
///
/// # Errors
/// [`SnapshotError`] if the file cannot be opened or parsed.
#[inline]
pub fn load(path: &Path) -> Result<MemoryDirectory, SnapshotError> {
    let directory = from_reader(BufReader::new(File::open(path)?))?;
    info!(path = %path.display(), entries = directory.len(), "loaded directory snapshot");
    Ok(directory)
}
