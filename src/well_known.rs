//! Well-known identifier authorities and directory constants.
//!
//! Source: https://learn.microsoft.com/windows/win32/secauthz/well-known-sids

/// Identifier authority of Windows domain accounts (`S-1-5`).
pub const NT_AUTHORITY: u64 = 5;

/// Sub-authority count of a domain account SID: `21`, three domain
/// identifiers, then the RID (`S-1-5-21-x-y-z-RID`).
pub const DOMAIN_ACCOUNT_SUB_AUTHORITY_COUNT: usize = 5;

/// RID returned when a SID carries no meaningful relative identifier.
pub const RID_NOT_APPLICABLE: u32 = 0;

/// Attribute holding an entry's distinguished name.
pub const DISTINGUISHED_NAME: &str = "distinguishedName";

/// Attribute holding an entry's binary SID.
pub const OBJECT_SID: &str = "objectSid";

/// Attribute holding the RID of a user's primary group.
pub const PRIMARY_GROUP_ID: &str = "PrimaryGroupID";
