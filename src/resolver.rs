//! Resolution of a group name to the RIDs and paths of matching groups.

use core::fmt;
use core::time::Duration;
use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use crate::DecodedSid;
use crate::directory::{DirectoryError, DirectorySearcher, Filter, SearchRequest};
use crate::scanner::DEFAULT_PAGE_SIZE;
use crate::well_known::{DISTINGUISHED_NAME, OBJECT_SID};

/// Client timeout of the group search.
pub const GROUP_SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Attributes requested for every group.
pub const GROUP_PROPERTIES: [&str; 2] = [DISTINGUISHED_NAME, OBJECT_SID];

/// Group RID to group path.
///
/// Groups whose SID carries no RID all land on key `0`; the last one wins.
pub type GroupMap = BTreeMap<u32, String>;

/// Called with the path of every accepted group.
pub type MatchCallback<'a> = Box<dyn FnMut(&str) + 'a>;

/// Finds the groups to scan.
///
/// ```rust
/// # use ad_invalid_chars::GroupResolver;
/// # use ad_invalid_chars::directory::{MemoryDirectory, PropertyValue, SearchEntry};
/// let directory: MemoryDirectory = [SearchEntry::new("GC://dc/CN=Sales,DC=example,DC=com")
///     .with_text("sAMAccountName", "Sales")
///     .with("objectSid", PropertyValue::Binary(
///         "S-1-5-21-1-2-3-1105".parse::<ad_invalid_chars::DecodedSid>().unwrap().to_binary(),
///     ))]
///     .into_iter()
///     .collect();
/// let groups = GroupResolver::new().resolve_groups(&directory, "DC=example", "Sales").unwrap();
/// assert_eq!(groups[&1105], "GC://dc/CN=Sales,DC=example,DC=com");
/// ```
pub struct GroupResolver<'a> {
    page_size: u32,
    timeout: Duration,
    on_match: Option<MatchCallback<'a>>,
}

impl Default for GroupResolver<'_> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GroupResolver<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupResolver")
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .field("on_match", &self.on_match.is_some())
            .finish()
    }
}

impl<'a> GroupResolver<'a> {
    /// A resolver with the default page size and a 60 second timeout.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timeout: GROUP_SEARCH_TIMEOUT,
            on_match: None,
        }
    }

    /// Sets the page size of the group search.
    #[must_use]
    #[inline]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the client timeout of the group search.
    #[must_use]
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers a callback run for every accepted group.
    #[must_use]
    #[inline]
    pub fn on_match(mut self, callback: impl FnMut(&str) + 'a) -> Self {
        self.on_match = Some(Box::new(callback));
        self
    }

    /// The group search for `group_name`.
    #[must_use]
    #[inline]
    pub fn request(&self, group_name: &str) -> SearchRequest {
        SearchRequest::new(Filter::Anr(group_name.to_owned()), self.page_size)
            .with_timeout(self.timeout)
            .with_properties(GROUP_PROPERTIES)
    }

    /// Searches groups matching `group_name` whose path contains
    /// `domain_filter`, keyed by RID.
    ///
    /// The domain check is a plain substring match on the path. A group
    /// without a decodable `objectSid` is skipped with a warning. An empty
    /// map means nothing matched.
    ///
    /// # Errors
    /// [`DirectoryError`] if the search cannot start or a page fails.
    #[instrument(level = "debug", skip(self, searcher))]
    pub fn resolve_groups<S>(
        &mut self,
        searcher: &S,
        domain_filter: &str,
        group_name: &str,
    ) -> Result<GroupMap, DirectoryError>
    where
        S: DirectorySearcher + ?Sized,
    {
        let request = self.request(group_name);
        let mut groups = GroupMap::new();
        for entry in searcher.find_all(&request)? {
            let entry = entry?;
            if entry.path.is_empty() || !entry.path.contains(domain_filter) {
                debug!(path = %entry.path, "group outside of the domain");
                continue;
            }
            info!(path = %entry.path, domain = domain_filter, "found matching group");
            if let Some(callback) = self.on_match.as_mut() {
                callback(&entry.path);
            }

            let Some(binary) = entry.properties.first_binary(OBJECT_SID) else {
                warn!(path = %entry.path, "group has no binary objectSid, skipping");
                continue;
            };
            let rid = match DecodedSid::decode(binary) {
                Ok(sid) => sid.rid(),
                Err(err) => {
                    warn!(path = %entry.path, %err, "group SID is malformed, skipping");
                    continue;
                }
            };
            if let Some(previous) = groups.insert(rid, entry.path) {
                warn!(rid, %previous, "groups share a RID, keeping the last one");
            }
        }
        Ok(groups)
    }
}

/// [`GroupResolver::resolve_groups`] with default settings.
///
/// # Errors
/// [`DirectoryError`] if the search cannot start or a page fails.
#[inline]
pub fn resolve_groups<S>(
    searcher: &S,
    domain_filter: &str,
    group_name: &str,
) -> Result<GroupMap, DirectoryError>
where
    S: DirectorySearcher + ?Sized,
{
    GroupResolver::new().resolve_groups(searcher, domain_filter, group_name)
}

#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::directory::{MemoryDirectory, PageCursor, PropertyValue, SearchEntry};

    fn group(path: &str, name: &str, sid: &str) -> SearchEntry {
        let sid: DecodedSid = sid.parse().unwrap();
        SearchEntry::new(path)
            .with_text("sAMAccountName", name)
            .with(OBJECT_SID, PropertyValue::Binary(sid.to_binary()))
    }

    fn directory() -> MemoryDirectory {
        [
            group(
                "GC://dc/CN=Sales,OU=Groups,DC=emea,DC=example,DC=com",
                "Sales",
                "S-1-5-21-111111111-222222222-333333333-1105",
            ),
            group(
                "GC://dc/CN=Sales,OU=Groups,DC=apac,DC=example,DC=com",
                "Sales",
                "S-1-5-21-444444444-555555555-666666666-2201",
            ),
            group(
                "GC://dc/CN=Sales Admins,OU=Groups,DC=emea,DC=example,DC=com",
                "Sales Admins",
                "S-1-5-21-111111111-222222222-333333333-1290",
            ),
            group(
                "GC://dc/CN=Marketing,OU=Groups,DC=emea,DC=example,DC=com",
                "Marketing",
                "S-1-5-21-111111111-222222222-333333333-1300",
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn filters_by_domain_substring() {
        let groups = resolve_groups(&directory(), "DC=emea", "sales").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[&1105],
            "GC://dc/CN=Sales,OU=Groups,DC=emea,DC=example,DC=com"
        );
        assert_eq!(
            groups[&1290],
            "GC://dc/CN=Sales Admins,OU=Groups,DC=emea,DC=example,DC=com"
        );
    }

    #[test]
    fn no_accepted_group_is_empty() {
        assert!(resolve_groups(&directory(), "DC=amer", "Sales")
            .unwrap()
            .is_empty());
        assert!(resolve_groups(&directory(), "DC=emea", "Finance")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn non_domain_sids_share_key_zero() {
        let directory: MemoryDirectory = [
            group("GC://dc/CN=Admins,CN=Builtin,DC=x", "Admins", "S-1-5-32-544"),
            group("GC://dc/CN=Admins Other,CN=Builtin,DC=x", "Admins Other", "S-1-16-12288"),
        ]
        .into_iter()
        .collect();
        let groups = resolve_groups(&directory, "DC=x", "Admins").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&0], "GC://dc/CN=Admins Other,CN=Builtin,DC=x");
    }

    #[test]
    fn malformed_or_missing_sid_skips_only_that_group() {
        let directory: MemoryDirectory = [
            SearchEntry::new("GC://dc/CN=Broken,DC=x")
                .with_text("sAMAccountName", "Team Broken")
                .with(OBJECT_SID, PropertyValue::Binary(vec![1, 5, 0, 0, 0, 0, 0, 5, 21])),
            SearchEntry::new("GC://dc/CN=NoSid,DC=x").with_text("sAMAccountName", "Team NoSid"),
            group("GC://dc/CN=Fine,DC=x", "Team Fine", "S-1-5-21-1-2-3-4000"),
        ]
        .into_iter()
        .collect();
        let groups = resolve_groups(&directory, "DC=x", "Team").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&4000], "GC://dc/CN=Fine,DC=x");
    }

    #[test]
    fn match_callback_sees_every_accepted_group() {
        let seen = RefCell::new(Vec::new());
        let mut resolver =
            GroupResolver::new().on_match(|path| seen.borrow_mut().push(path.to_owned()));
        let groups = resolver.resolve_groups(&directory(), "DC=apac", "Sales").unwrap();
        drop(resolver);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            seen.into_inner(),
            ["GC://dc/CN=Sales,OU=Groups,DC=apac,DC=example,DC=com"]
        );
    }

    #[test]
    fn request_shape() {
        let request = GroupResolver::new().request("Sales");
        assert_eq!(request.filter.to_string(), "(anr=Sales)");
        assert_eq!(request.page_size, 200);
        assert_eq!(request.timeout, Some(Duration::from_secs(60)));
        assert_eq!(request.properties_to_load, ["distinguishedName", "objectSid"]);
    }

    struct Unreachable;

    struct NeverCursor;

    impl PageCursor for NeverCursor {
        fn next_page(&mut self) -> Result<Option<Vec<SearchEntry>>, DirectoryError> {
            Ok(None)
        }
    }

    impl DirectorySearcher for Unreachable {
        type Cursor<'a> = NeverCursor;

        fn search(&self, request: &SearchRequest) -> Result<Self::Cursor<'_>, DirectoryError> {
            Err(DirectoryError::Timeout {
                filter: request.filter.to_string(),
                timeout: request.timeout.unwrap_or_default(),
            })
        }
    }

    #[test]
    fn search_failure_propagates() {
        assert!(matches!(
            resolve_groups(&Unreachable, "DC=x", "Sales"),
            Err(DirectoryError::Timeout { .. })
        ));
    }
}
