//! # Active Directory invalid character finder
//!
//! Finds group members whose directory properties carry characters that
//! cannot be represented in an XML 1.0 document. Such values break XML
//! based exports and synchronisation of the directory.
//!
//! The crate provides:
//! - [`DecodedSid`]: a Security Identifier decoded from its binary
//!   `objectSid` form, with [`extract_rid`] for domain-relative RIDs.
//! - [`is_illegal`], [`validate_str`] and [`validate_chars`]: the XML
//!   character checks, based on Unicode general categories.
//! - [`GroupResolver`]: resolves a group name, within a domain, to the
//!   groups to scan keyed by RID.
//! - [`GroupMemberScanner`]: checks every member record and reports a
//!   [`Finding`] per offending property value.
//! - [`directory`]: the paged search abstraction both of them run on, with
//!   an in-memory provider loaded from JSON snapshots.
//!
//! ## Examples
//! ### Decode a SID and get its RID
//! ```rust
//! use ad_invalid_chars::{DecodedSid, extract_rid};
//!
//! let bytes = [
//!     1, 5, 0, 0, 0, 0, 0, 5, // revision, count, authority
//!     21, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0x51, 0x04, 0, 0,
//! ];
//! let sid = DecodedSid::decode(&bytes).unwrap();
//! assert_eq!(sid.to_string(), "S-1-5-21-1-2-3-1105");
//! assert_eq!(extract_rid(&sid), 1105);
//! ```
//!
//! ### Check a property value
//! ```rust
//! use ad_invalid_chars::validate_str;
//!
//! assert!(validate_str("Jane Doe", false).is_ok());
//! assert!(validate_str("Jane\u{0}Doe", false).is_err());
//! ```
//!
//! ### Scan a group against an in-memory directory
//! ```rust
//! use ad_invalid_chars::directory::{
//!     DirectorySearcher, MemoryDirectory, PropertyValue, SearchEntry,
//! };
//! use ad_invalid_chars::scanner::member_search;
//! use ad_invalid_chars::{DecodedSid, GroupMemberScanner, resolve_groups};
//!
//! let sid: DecodedSid = "S-1-5-21-1-2-3-1105".parse().unwrap();
//! let directory: MemoryDirectory = [
//!     SearchEntry::new("GC://dc/CN=Sales,DC=example,DC=com")
//!         .with_text("sAMAccountName", "Sales")
//!         .with("objectSid", PropertyValue::Binary(sid.to_binary())),
//!     SearchEntry::new("GC://dc/CN=Jane,DC=example,DC=com")
//!         .with_text("distinguishedName", "CN=Jane,DC=example,DC=com")
//!         .with_text("displayName", "Jane\u{b}Doe")
//!         .with("PrimaryGroupID", PropertyValue::Integer(1105)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let groups = resolve_groups(&directory, "DC=example", "Sales").unwrap();
//! let (&rid, _) = groups.iter().next().unwrap();
//! let members = directory.find_all(&member_search(rid, 200)).unwrap();
//! let findings: Vec<_> = GroupMemberScanner::new()
//!     .scan(members.map_while(Result::ok))
//!     .collect();
//! assert_eq!(findings.len(), 1);
//! assert_eq!(findings[0].property_name, "displayname");
//! ```

#![warn(missing_docs)]

mod app;
mod config;
pub mod directory;
mod error;
pub mod logging;
mod resolver;
mod rid;
pub mod scanner;
mod serde_impl;
mod sid;
pub mod well_known;
mod xml_chars;

pub use app::{RunSummary, prompt_non_empty, run};
pub use config::ScanConfig;
pub use error::{Error, Result};
pub use resolver::{
    GROUP_PROPERTIES, GROUP_SEARCH_TIMEOUT, GroupMap, GroupResolver, MatchCallback, resolve_groups,
};
pub use rid::extract_rid;
pub use scanner::{Finding, GroupMemberScanner};
pub use sid::{DecodedSid, MalformedSid, decode};
pub use xml_chars::{IllegalCharacterError, is_illegal, validate_chars, validate_str};
