//! Command line configuration.

use core::num::NonZeroUsize;
use core::time::Duration;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::resolver::GROUP_SEARCH_TIMEOUT;
use crate::scanner::{DEFAULT_PAGE_SIZE, DEFAULT_PROGRESS_INTERVAL};

/// Scan the members of a directory group for property values holding
/// characters that are not valid in XML.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "find-invalid-chars", author, version, about, long_about = None)]
pub struct ScanConfig {
    /// JSON directory snapshot to search.
    #[arg(long, value_name = "PATH")]
    pub snapshot: PathBuf,

    /// Domain the groups must belong to (substring of the group path).
    /// Prompted for when absent.
    #[arg(long)]
    pub domain: Option<String>,

    /// Group name to search for. Prompted for when absent.
    #[arg(long)]
    pub group: Option<String>,

    /// Entries per directory result page.
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub page_size: u32,

    /// Report progress every N scanned members, 0 to disable.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PROGRESS_INTERVAL.get())]
    pub progress_every: usize,

    /// Client timeout of the group search, in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = GROUP_SEARCH_TIMEOUT.as_secs())]
    pub search_timeout_secs: u64,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    /// `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ScanConfig {
    /// A configuration with every default, reading `snapshot`.
    #[must_use]
    #[inline]
    pub fn new(snapshot: impl Into<PathBuf>) -> Self {
        Self {
            snapshot: snapshot.into(),
            domain: None,
            group: None,
            page_size: DEFAULT_PAGE_SIZE,
            progress_every: DEFAULT_PROGRESS_INTERVAL.get(),
            search_timeout_secs: GROUP_SEARCH_TIMEOUT.as_secs(),
            verbose: 0,
        }
    }

    /// Progress interval of member scans, `None` when disabled.
    #[must_use]
    #[inline]
    pub const fn progress_interval(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.progress_every)
    }

    /// Client timeout of the group search.
    #[must_use]
    #[inline]
    pub const fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Default log directive for the verbosity level.
    #[must_use]
    #[inline]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
