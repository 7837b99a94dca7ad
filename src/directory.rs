//! Directory query collaborator.
//!
//! The scan never talks to a directory server itself. It builds
//! [`SearchRequest`]s and consumes paged [`SearchEntry`] results from any
//! [`DirectorySearcher`]. Pages are pulled one at a time through a
//! [`PageCursor`] so large groups are never held in memory at once.

mod memory;
pub mod snapshot;

pub use memory::{MemoryCursor, MemoryDirectory};

use core::fmt::{self, Display};
use core::time::Duration;
use std::collections::BTreeMap;

use thiserror::Error;

/// Search depth below the search base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Only the base entry.
    Base,
    /// Direct children of the base entry.
    OneLevel,
    /// The base entry and everything below it.
    #[default]
    Subtree,
}

/// The directory filters the scan issues.
///
/// `Display` renders the LDAP filter literal.
///
/// ```rust
/// # use ad_invalid_chars::directory::Filter;
/// assert_eq!(Filter::Anr("Sales".into()).to_string(), "(anr=Sales)");
/// assert_eq!(Filter::PrimaryGroupId(1105).to_string(), "(PrimaryGroupID=1105)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Ambiguous name resolution: entries where any naming field contains the text.
    Anr(String),
    /// Entries whose primary group has the given RID.
    PrimaryGroupId(u32),
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anr(name) => write!(f, "(anr={name})"),
            Self::PrimaryGroupId(rid) => write!(f, "(PrimaryGroupID={rid})"),
        }
    }
}

/// One directory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// What to match.
    pub filter: Filter,
    /// How deep to search.
    pub scope: SearchScope,
    /// Entries per page.
    pub page_size: u32,
    /// Client-side limit on the whole search, if any.
    pub timeout: Option<Duration>,
    /// Attributes to return. Empty means all of them.
    pub properties_to_load: Vec<String>,
}

impl SearchRequest {
    /// A subtree search with no timeout and no attribute selection.
    #[must_use]
    #[inline]
    pub const fn new(filter: Filter, page_size: u32) -> Self {
        Self {
            filter,
            scope: SearchScope::Subtree,
            page_size,
            timeout: None,
            properties_to_load: Vec::new(),
        }
    }

    /// Sets the client-side timeout.
    #[must_use]
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Restricts the returned attributes.
    #[must_use]
    #[inline]
    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties_to_load = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// String syntax attribute.
    Text(String),
    /// Integer syntax attribute such as `groupType`.
    Integer(i64),
    /// Octet-string attribute such as `objectSid`.
    Binary(Vec<u8>),
}

impl PropertyValue {
    /// The text, if this is a string value.
    #[must_use]
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Integer(_) | Self::Binary(_) => None,
        }
    }

    /// The raw bytes, if this is a binary value.
    #[must_use]
    #[inline]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            Self::Text(_) | Self::Integer(_) => None,
        }
    }
}

/// Attribute bag of one entry.
///
/// Attribute names are case-insensitive and stored lower-cased, the way
/// directory result sets report them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyBag {
    values: BTreeMap<String, Vec<PropertyValue>>,
}

impl PropertyBag {
    /// An empty bag.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Sets all values of `name`, replacing previous ones.
    #[inline]
    pub fn insert(&mut self, name: &str, values: Vec<PropertyValue>) {
        self.values.insert(name.to_ascii_lowercase(), values);
    }

    /// Appends one value to `name`.
    #[inline]
    pub fn push(&mut self, name: &str, value: PropertyValue) {
        self.values
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value);
    }

    /// All values of `name`.
    #[must_use]
    #[inline]
    pub fn get(&self, name: &str) -> Option<&[PropertyValue]> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// First value of `name`.
    #[must_use]
    #[inline]
    pub fn first(&self, name: &str) -> Option<&PropertyValue> {
        self.get(name).and_then(<[PropertyValue]>::first)
    }

    /// First value of `name` when it is text.
    #[must_use]
    #[inline]
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(PropertyValue::as_text)
    }

    /// First value of `name` when it is binary.
    #[must_use]
    #[inline]
    pub fn first_binary(&self, name: &str) -> Option<&[u8]> {
        self.first(name).and_then(PropertyValue::as_binary)
    }

    /// Attribute names with their values, ordered by lower-cased name.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PropertyValue])> {
        self.values
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Keeps only the attributes listed in `names`.
    #[must_use]
    #[inline]
    pub fn project(&self, names: &[String]) -> Self {
        let values = names
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .filter_map(|name| {
                let values = self.values.get(&name)?.clone();
                Some((name, values))
            })
            .collect();
        Self { values }
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    /// Path of the entry, e.g. `GC://dc.example.com/CN=Sales,DC=example,DC=com`.
    pub path: String,
    /// Loaded attributes.
    pub properties: PropertyBag,
}

impl SearchEntry {
    /// An entry with no attributes.
    #[must_use]
    #[inline]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            properties: PropertyBag::new(),
        }
    }

    /// Builder-style [`PropertyBag::push`].
    #[must_use]
    #[inline]
    pub fn with(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.push(name, value);
        self
    }

    /// Builder-style text attribute.
    #[must_use]
    #[inline]
    pub fn with_text(self, name: &str, value: impl Into<String>) -> Self {
        self.with(name, PropertyValue::Text(value.into()))
    }
}

/// A search result scanned for invalid characters.
pub type MemberRecord = SearchEntry;

/// Failures reported by a directory provider.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The search did not complete within its client timeout.
    #[error("search {filter} timed out after {timeout:?}")]
    Timeout {
        /// Filter of the search.
        filter: String,
        /// Configured limit.
        timeout: Duration,
    },
    /// The provider rejected the request.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
    /// The provider failed while serving a page.
    #[error("directory search failed: {0}")]
    Failed(String),
}

/// Forward-only source of result pages for one search.
pub trait PageCursor {
    /// Fetches the next page, or `None` once the search is exhausted.
    ///
    /// # Errors
    /// Any [`DirectoryError`] raised while fetching the page.
    fn next_page(&mut self) -> Result<Option<Vec<SearchEntry>>, DirectoryError>;
}

/// A directory that can run paged searches.
pub trait DirectorySearcher {
    /// Cursor over the pages of one search.
    type Cursor<'a>: PageCursor
    where
        Self: 'a;

    /// Starts a search.
    ///
    /// # Errors
    /// [`DirectoryError`] if the search cannot be started.
    fn search(&self, request: &SearchRequest) -> Result<Self::Cursor<'_>, DirectoryError>;

    /// Starts a search and flattens its pages into single entries.
    ///
    /// # Errors
    /// [`DirectoryError`] if the search cannot be started.
    #[inline]
    fn find_all(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResults<Self::Cursor<'_>>, DirectoryError> {
        self.search(request).map(SearchResults::new)
    }
}

/// Lazily flattened search results. One page is buffered at a time.
///
/// A page error is yielded once, then iteration ends.
#[derive(Debug)]
pub struct SearchResults<C> {
    cursor: C,
    page: std::vec::IntoIter<SearchEntry>,
    done: bool,
}

impl<C: PageCursor> SearchResults<C> {
    /// Wraps a cursor.
    #[inline]
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            page: Vec::new().into_iter(),
            done: false,
        }
    }
}

impl<C: PageCursor> Iterator for SearchResults<C> {
    type Item = Result<SearchEntry, DirectoryError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.page.next() {
                return Some(Ok(entry));
            }
            if self.done {
                return None;
            }
            match self.cursor.next_page() {
                Ok(Some(page)) => self.page = page.into_iter(),
                Ok(None) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
