//! Relative identifier (RID) extraction.

use crate::DecodedSid;
use crate::well_known::{DOMAIN_ACCOUNT_SUB_AUTHORITY_COUNT, NT_AUTHORITY, RID_NOT_APPLICABLE};

/// Returns the RID of a domain account SID.
///
/// Only `S-1-5` SIDs with exactly five sub-authorities carry a RID; it is the
/// last one. Every other SID yields [`RID_NOT_APPLICABLE`] (`0`), which callers
/// treat as "skip", not as an error.
///
/// # Examples
/// ```rust
/// # use ad_invalid_chars::{DecodedSid, extract_rid};
/// let sid: DecodedSid = "S-1-5-21-111111111-222222222-333333333-1105".parse().unwrap();
/// assert_eq!(extract_rid(&sid), 1105);
///
/// let builtin: DecodedSid = "S-1-5-32-544".parse().unwrap();
/// assert_eq!(extract_rid(&builtin), 0);
/// ```
#[must_use]
#[inline]
pub fn extract_rid(sid: &DecodedSid) -> u32 {
    if sid.authority != NT_AUTHORITY
        || sid.sub_authorities.len() != DOMAIN_ACCOUNT_SUB_AUTHORITY_COUNT
    {
        return RID_NOT_APPLICABLE;
    }
    sid.sub_authorities
        .last()
        .copied()
        .unwrap_or(RID_NOT_APPLICABLE)
}
