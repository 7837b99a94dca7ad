//! Scanning of group members for property values that are not valid XML.

use core::fmt::{self, Display};
use core::num::NonZeroUsize;

use tracing::{debug, info};

use crate::directory::{Filter, MemberRecord, SearchRequest};
use crate::well_known::{DISTINGUISHED_NAME, OBJECT_SID};
use crate::xml_chars::{IllegalCharacterError, validate_str};

/// Attributes requested for every member and checked, in this order.
pub const MEMBER_PROPERTIES: [&str; 8] = [
    DISTINGUISHED_NAME,
    OBJECT_SID,
    "MailAddress",
    "mail",
    "displayName",
    "description",
    "groupType",
    "sAMAccountName",
];

/// Records between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(interval) => interval,
    None => unreachable!(),
};

/// Members are fetched in pages of this many entries.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Called with the number of records scanned so far.
pub type ProgressCallback<'a> = Box<dyn FnMut(usize) + 'a>;

/// A member property whose value holds a character that is not valid in XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Distinguished name of the member, or its path when it has none.
    pub entry_identifier: String,
    /// Lower-cased attribute name.
    pub property_name: String,
    /// Full, unsanitised value.
    pub property_value: String,
}

impl Display for Finding {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found invalid characters for Member DN:{}, property:{}, value:{}",
            self.entry_identifier, self.property_name, self.property_value
        )
    }
}

/// The search returning every member whose primary group has RID `rid`.
///
/// ```rust
/// # use ad_invalid_chars::scanner::member_search;
/// let request = member_search(1105, 200);
/// assert_eq!(request.filter.to_string(), "(PrimaryGroupID=1105)");
/// assert!(request.timeout.is_none());
/// ```
#[must_use]
#[inline]
pub fn member_search(rid: u32, page_size: u32) -> SearchRequest {
    SearchRequest::new(Filter::PrimaryGroupId(rid), page_size).with_properties(MEMBER_PROPERTIES)
}

/// Checks the [`MEMBER_PROPERTIES`] of one record.
///
/// Only the first value of each attribute is checked. Missing, empty and
/// non-text values are skipped. CR and LF are accepted since multi-line
/// descriptions are legitimate.
#[must_use]
#[inline]
pub fn scan_record(record: &MemberRecord) -> Vec<Finding> {
    let entry_identifier = record
        .properties
        .first_text(DISTINGUISHED_NAME)
        .unwrap_or_else(|| {
            debug!(path = %record.path, "member has no distinguished name");
            record.path.as_str()
        });

    MEMBER_PROPERTIES
        .iter()
        .filter_map(|&name| {
            let value = record
                .properties
                .first_text(name)
                .filter(|value| !value.is_empty())?;
            match validate_str(value, true) {
                Ok(()) => None,
                Err(IllegalCharacterError) => Some(Finding {
                    entry_identifier: entry_identifier.to_owned(),
                    property_name: name.to_ascii_lowercase(),
                    property_value: value.to_owned(),
                }),
            }
        })
        .collect()
}

/// Drives the scan of a group's members.
///
/// ```rust
/// # use ad_invalid_chars::{GroupMemberScanner, directory::SearchEntry};
/// let member = SearchEntry::new("GC://dc/CN=X")
///     .with_text("distinguishedName", "CN=X")
///     .with_text("description", "hello\u{7}world");
/// let findings: Vec<_> = GroupMemberScanner::new().scan([member]).collect();
/// assert_eq!(findings.len(), 1);
/// assert_eq!(findings[0].property_name, "description");
/// ```
pub struct GroupMemberScanner<'a> {
    progress_interval: Option<NonZeroUsize>,
    on_progress: Option<ProgressCallback<'a>>,
}

impl Default for GroupMemberScanner<'_> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GroupMemberScanner<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupMemberScanner")
            .field("progress_interval", &self.progress_interval)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl<'a> GroupMemberScanner<'a> {
    /// A scanner reporting progress every [`DEFAULT_PROGRESS_INTERVAL`] records.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            progress_interval: Some(DEFAULT_PROGRESS_INTERVAL),
            on_progress: None,
        }
    }

    /// Sets the progress interval. `None` disables progress reports.
    #[must_use]
    #[inline]
    pub fn with_progress_interval(mut self, interval: Option<NonZeroUsize>) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Registers a callback run at each progress report.
    #[must_use]
    #[inline]
    pub fn on_progress(mut self, callback: impl FnMut(usize) + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Scans `records` lazily: a record is pulled only once the findings of
    /// the previous one have been consumed.
    #[inline]
    pub fn scan<I>(self, records: I) -> Scan<'a, I::IntoIter>
    where
        I: IntoIterator<Item = MemberRecord>,
    {
        Scan {
            records: records.into_iter(),
            scanned: 0,
            pending: Vec::new().into_iter(),
            progress_due: None,
            progress_interval: self.progress_interval,
            on_progress: self.on_progress,
        }
    }
}

/// Iterator of [`Finding`]s returned by [`GroupMemberScanner::scan`].
pub struct Scan<'a, I> {
    records: I,
    scanned: usize,
    pending: std::vec::IntoIter<Finding>,
    progress_due: Option<usize>,
    progress_interval: Option<NonZeroUsize>,
    on_progress: Option<ProgressCallback<'a>>,
}

impl<I> Scan<'_, I> {
    /// Records pulled so far.
    #[must_use]
    #[inline]
    pub const fn scanned(&self) -> usize {
        self.scanned
    }

    fn report_progress(&mut self) {
        if let Some(scanned) = self.progress_due.take() {
            info!(scanned, "scan progress");
            if let Some(callback) = self.on_progress.as_mut() {
                callback(scanned);
            }
        }
    }
}

impl<I> Iterator for Scan<'_, I>
where
    I: Iterator<Item = MemberRecord>,
{
    type Item = Finding;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(finding) = self.pending.next() {
                return Some(finding);
            }
            // Progress for a record is reported after its findings.
            self.report_progress();
            let record = self.records.next()?;
            self.scanned += 1;
            self.pending = scan_record(&record).into_iter();
            if self
                .progress_interval
                .is_some_and(|interval| self.scanned % interval == 0)
            {
                self.progress_due = Some(self.scanned);
            }
        }
    }
}

#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[cfg(test)]
mod tests {
    use core::cell::{Cell, RefCell};

    use super::*;
    use crate::directory::{PropertyValue, SearchEntry};

    fn member(dn: &str) -> SearchEntry {
        SearchEntry::new(format!("GC://dc/{dn}")).with_text(DISTINGUISHED_NAME, dn)
    }

    #[test]
    fn one_finding_per_offending_property() {
        let record = member("CN=X").with_text("description", "hello\u{7}world");
        let findings: Vec<_> = GroupMemberScanner::new().scan([record]).collect();
        assert_eq!(
            findings,
            [Finding {
                entry_identifier: "CN=X".into(),
                property_name: "description".into(),
                property_value: "hello\u{7}world".into(),
            }]
        );
    }

    #[test]
    fn several_illegal_characters_give_one_finding() {
        let record = member("CN=X").with_text("displayName", "\u{1}\u{2}\u{3}");
        assert_eq!(scan_record(&record).len(), 1);
    }

    #[test]
    fn properties_are_reported_in_list_order() {
        let record = member("CN=X")
            .with_text("sAMAccountName", "x\u{200b}")
            .with_text("mail", "x\u{0}@example.com")
            .with_text("description", "line one\r\nline two");
        let names: Vec<_> = scan_record(&record)
            .into_iter()
            .map(|finding| finding.property_name)
            .collect();
        assert_eq!(names, ["mail", "samaccountname"]);
    }

    #[test]
    fn skips_empty_non_text_and_unlisted_values() {
        let record = member("CN=X")
            .with_text("description", "")
            .with("objectSid", PropertyValue::Binary(vec![1, 0, 0, 0, 0, 0, 0, 0x7]))
            .with("groupType", PropertyValue::Integer(7))
            .with_text("info", "bell\u{7}");
        assert!(scan_record(&record).is_empty());
    }

    #[test]
    fn only_first_value_is_checked() {
        let record = member("CN=X")
            .with_text("mail", "ok@example.com")
            .with_text("mail", "bad\u{1}@example.com");
        assert!(scan_record(&record).is_empty());
    }

    #[test]
    fn distinguished_name_itself_is_checked() {
        let record = member("CN=bad\u{1}");
        let findings = scan_record(&record);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].property_name, "distinguishedname");
        assert_eq!(findings[0].entry_identifier, "CN=bad\u{1}");
    }

    #[test]
    fn path_identifies_entries_without_distinguished_name() {
        let record = SearchEntry::new("GC://dc/CN=Y").with_text("mail", "y\u{1}");
        let findings = scan_record(&record);
        assert_eq!(findings[0].entry_identifier, "GC://dc/CN=Y");
    }

    #[test]
    fn finding_line() {
        let finding = Finding {
            entry_identifier: "CN=X".into(),
            property_name: "description".into(),
            property_value: "v".into(),
        };
        assert_eq!(
            finding.to_string(),
            "Found invalid characters for Member DN:CN=X, property:description, value:v"
        );
    }

    #[test]
    fn records_are_pulled_lazily() {
        let pulled = Cell::new(0usize);
        let records = (0..10).map(|i| {
            pulled.set(pulled.get() + 1);
            member(&format!("CN=u{i}")).with_text("description", "\u{1}")
        });
        let mut scan = GroupMemberScanner::new().scan(records);
        assert!(scan.next().is_some());
        assert_eq!(pulled.get(), 1);
        assert!(scan.next().is_some());
        assert_eq!(pulled.get(), 2);
        assert_eq!(scan.scanned(), 2);
    }

    #[test]
    fn progress_every_interval() {
        let reports = RefCell::new(Vec::new());
        let records = (0..2500).map(|i| member(&format!("CN=u{i}")));
        let findings = GroupMemberScanner::new()
            .on_progress(|count| reports.borrow_mut().push(count))
            .scan(records)
            .count();
        assert_eq!(findings, 0);
        assert_eq!(*reports.borrow(), [1000, 2000]);
    }

    #[test]
    fn progress_follows_the_record_findings() {
        let events = RefCell::new(Vec::new());
        let records = (1..=4).map(|i| member(&format!("CN=u{i}")).with_text("mail", "\u{1}"));
        let scan = GroupMemberScanner::new()
            .with_progress_interval(NonZeroUsize::new(2))
            .on_progress(|count| events.borrow_mut().push(format!("progress {count}")));
        for finding in scan.scan(records) {
            events.borrow_mut().push(finding.entry_identifier);
        }
        assert_eq!(
            *events.borrow(),
            ["CN=u1", "CN=u2", "progress 2", "CN=u3", "CN=u4", "progress 4"]
        );
    }

    #[test]
    fn progress_can_be_disabled() {
        let reports = Cell::new(0usize);
        let records = (0..3000).map(|i| member(&format!("CN=u{i}")));
        let _ = GroupMemberScanner::new()
            .with_progress_interval(None)
            .on_progress(|_| reports.set(reports.get() + 1))
            .scan(records)
            .count();
        assert_eq!(reports.get(), 0);
    }

    #[test]
    fn repeated_scans_are_identical() {
        let records: Vec<_> = (0..50)
            .map(|i| {
                member(&format!("CN=u{i}"))
                    .with_text("description", if i % 3 == 0 { "a\u{1}" } else { "a" })
                    .with_text("mail", if i % 5 == 0 { "\u{2028}" } else { "m" })
            })
            .collect();
        let first: Vec<_> = GroupMemberScanner::new().scan(records.clone()).collect();
        let second: Vec<_> = GroupMemberScanner::new().scan(records).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 17 + 10);
    }
}
