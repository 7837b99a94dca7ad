//! Errors that end a diagnostic run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::directory::snapshot::SnapshotError;

/// Errors that end a run.
///
/// Per-entry problems (illegal characters, malformed group SIDs, a member
/// page failing mid-scan) are logged or reported as findings and never
/// surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// The directory search provider could not be obtained.
    #[error("no directory search provider: failed to load {}", path.display())]
    NoSearchProvider {
        /// Snapshot that failed to load.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: SnapshotError,
    },

    /// No group matched the requested name in the requested domain.
    ///
    /// Not a failure of the tool: the message is shown and the run ends.
    #[error("Couldn't find group: {group} in domain: {domain}, please validate your inputs.")]
    NoGroupMatch {
        /// Domain substring the group paths were filtered with.
        domain: String,
        /// Group name searched for.
        group: String,
    },

    /// The group search failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Reading the prompts or writing the report failed.
    #[error("console I/O failed")]
    Io(#[from] io::Error),
}

impl Error {
    /// `true` for outcomes that end the run without being a failure.
    #[must_use]
    #[inline]
    pub const fn is_graceful(&self) -> bool {
        matches!(self, Self::NoGroupMatch { .. })
    }
}

/// Result alias of this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
