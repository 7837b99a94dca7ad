//! In-memory directory provider.

use std::time::Instant;

use tracing::debug;

use super::{
    DirectoryError, DirectorySearcher, Filter, PageCursor, PropertyValue, SearchEntry,
    SearchRequest,
};
use crate::well_known::PRIMARY_GROUP_ID;

/// A [`DirectorySearcher`] over entries held in memory.
///
/// Filters are evaluated locally:
/// - [`Filter::Anr`] matches when any text value contains the query,
///   ignoring case;
/// - [`Filter::PrimaryGroupId`] matches on `primaryGroupID`, stored as an
///   integer or as decimal text.
///
/// Every search is a subtree search of the whole entry list. Pages are
/// assembled on demand, and the request timeout is checked before each page.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    entries: Vec<SearchEntry>,
}

impl MemoryDirectory {
    /// A directory holding `entries`, searched in this order.
    #[must_use]
    #[inline]
    pub const fn new(entries: Vec<SearchEntry>) -> Self {
        Self { entries }
    }

    /// The entries, in search order.
    #[must_use]
    #[inline]
    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the directory holds no entry.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SearchEntry> for MemoryDirectory {
    #[inline]
    fn from_iter<T: IntoIterator<Item = SearchEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn matches(filter: &Filter, entry: &SearchEntry) -> bool {
    match filter {
        Filter::Anr(query) => {
            let query = query.to_lowercase();
            entry
                .properties
                .iter()
                .flat_map(|(_, values)| values)
                .filter_map(PropertyValue::as_text)
                .any(|text| text.to_lowercase().contains(&query))
        }
        Filter::PrimaryGroupId(rid) => match entry.properties.first(PRIMARY_GROUP_ID) {
            Some(PropertyValue::Integer(value)) => *value == i64::from(*rid),
            Some(PropertyValue::Text(value)) => value.trim().parse::<u32>() == Ok(*rid),
            Some(PropertyValue::Binary(_)) | None => false,
        },
    }
}

/// Page cursor of a [`MemoryDirectory`] search.
#[derive(Debug)]
pub struct MemoryCursor<'a> {
    remaining: core::slice::Iter<'a, SearchEntry>,
    request: SearchRequest,
    deadline: Option<Instant>,
}

impl PageCursor for MemoryCursor<'_> {
    fn next_page(&mut self) -> Result<Option<Vec<SearchEntry>>, DirectoryError> {
        if let (Some(deadline), Some(timeout)) = (self.deadline, self.request.timeout) {
            if Instant::now() > deadline {
                return Err(DirectoryError::Timeout {
                    filter: self.request.filter.to_string(),
                    timeout,
                });
            }
        }

        let page_size = usize::try_from(self.request.page_size).unwrap_or(usize::MAX);
        let filter = &self.request.filter;
        let properties = &self.request.properties_to_load;
        let page: Vec<SearchEntry> = self
            .remaining
            .by_ref()
            .filter(|entry| matches(filter, entry))
            .take(page_size)
            .map(|entry| {
                if properties.is_empty() {
                    entry.clone()
                } else {
                    SearchEntry {
                        path: entry.path.clone(),
                        properties: entry.properties.project(properties),
                    }
                }
            })
            .collect();

        if page.is_empty() {
            return Ok(None);
        }
        debug!(filter = %filter, entries = page.len(), "served page");
        Ok(Some(page))
    }
}

impl DirectorySearcher for MemoryDirectory {
    type Cursor<'a> = MemoryCursor<'a>;

    fn search(&self, request: &SearchRequest) -> Result<Self::Cursor<'_>, DirectoryError> {
        if request.page_size == 0 {
            return Err(DirectoryError::InvalidRequest(
                "page size must be at least 1".to_owned(),
            ));
        }
        Ok(MemoryCursor {
            remaining: self.entries.iter(),
            request: request.clone(),
            // A timeout too large to represent as an instant never expires.
            deadline: request
                .timeout
                .and_then(|timeout| Instant::now().checked_add(timeout)),
        })
    }
}
