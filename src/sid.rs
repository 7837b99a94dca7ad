//! Decoding of binary Security Identifiers as returned in `objectSid`.
//!
//! Binary layout:
//! - byte 0: revision,
//! - byte 1: sub-authority count `N`,
//! - bytes 2..8: 48-bit identifier authority, big-endian,
//! - then `N` sub-authorities, each a little-endian `u32`.
//!
//! The directory is trusted to hand out well-formed values, but a buffer
//! shorter than its declared count is rejected with [`MalformedSid`] rather
//! than read out of bounds. Trailing bytes past `8 + 4N` are ignored.

use core::fmt::{self, Display};
use core::str::FromStr;

use parsing::{InvalidSidFormat, SID_HEADER_LEN, SidComponents};
use thiserror::Error;

use crate::rid;

/// Size of one encoded sub-authority.
const SUB_AUTHORITY_LEN: usize = size_of::<u32>();

/// A binary SID buffer too short for its declared sub-authority count.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("malformed SID: expected at least {expected} bytes, got {actual}")]
pub struct MalformedSid {
    /// Bytes required by the header and declared sub-authority count.
    pub expected: usize,
    /// Bytes actually available.
    pub actual: usize,
}

/// A SID split into its parts.
///
/// # Examples
/// ```rust
/// # use ad_invalid_chars::DecodedSid;
/// let sid = DecodedSid::decode(&[1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 32, 2, 0, 0]).unwrap();
/// assert_eq!(sid.revision, 1);
/// assert_eq!(sid.authority, 5);
/// assert_eq!(sid.sub_authorities, [32, 544]);
/// assert_eq!(sid.to_string(), "S-1-5-32-544");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedSid {
    /// The SID revision value, generally 1.
    pub revision: u8,
    /// The 48-bit identifier authority.
    pub authority: u64,
    /// The sub-authorities in encoded order.
    pub sub_authorities: Vec<u32>,
}

/// Decodes a binary SID.
///
/// # Errors
/// [`MalformedSid`] if `bytes` is shorter than the header or than the
/// declared sub-authority count requires.
#[inline]
pub fn decode(bytes: &[u8]) -> Result<DecodedSid, MalformedSid> {
    let Some((header, tail)) = bytes.split_first_chunk::<SID_HEADER_LEN>() else {
        return Err(MalformedSid {
            expected: SID_HEADER_LEN,
            actual: bytes.len(),
        });
    };
    let [revision, count, a0, a1, a2, a3, a4, a5] = *header;
    let expected = SID_HEADER_LEN + SUB_AUTHORITY_LEN * usize::from(count);
    if bytes.len() < expected {
        return Err(MalformedSid {
            expected,
            actual: bytes.len(),
        });
    }

    let authority = u64::from_be_bytes([0, 0, a0, a1, a2, a3, a4, a5]);
    let sub_authorities = tail
        .chunks_exact(SUB_AUTHORITY_LEN)
        .take(usize::from(count))
        .map(|chunk| {
            let mut le = [0u8; SUB_AUTHORITY_LEN];
            le.copy_from_slice(chunk);
            u32::from_le_bytes(le)
        })
        .collect();

    Ok(DecodedSid {
        revision,
        authority,
        sub_authorities,
    })
}

impl DecodedSid {
    /// Decodes a binary SID. See [`decode`].
    ///
    /// # Errors
    /// [`MalformedSid`] when the buffer is truncated.
    #[inline]
    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedSid> {
        decode(bytes)
    }

    /// The relative identifier, or `0` when not applicable.
    /// See [`extract_rid`](crate::extract_rid).
    #[must_use]
    #[inline]
    pub fn rid(&self) -> u32 {
        rid::extract_rid(self)
    }

    /// Re-encodes this SID in its binary layout.
    ///
    /// The count byte and authority are truncated to 8 and 48 bits.
    #[must_use]
    #[inline]
    pub fn to_binary(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(SID_HEADER_LEN + SUB_AUTHORITY_LEN * self.sub_authorities.len());
        out.push(self.revision);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the binary layout stores the count on one byte"
        )]
        out.push(self.sub_authorities.len() as u8);
        if let Some(authority) = self.authority.to_be_bytes().get(2..) {
            out.extend_from_slice(authority);
        }
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }
}

impl From<SidComponents> for DecodedSid {
    #[inline]
    fn from(value: SidComponents) -> Self {
        Self {
            revision: value.revision,
            authority: value.authority(),
            sub_authorities: value.sub_authority.to_vec(),
        }
    }
}

impl FromStr for DecodedSid {
    type Err = InvalidSidFormat;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SidComponents>().map(Self::from)
    }
}

impl Display for DecodedSid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.revision)?;

        // Identifier Authority: print as decimal if fits in u32, else as hex
        if self.authority <= 0xFFFF_FFFF {
            write!(f, "-{}", self.authority)?;
        } else {
            write!(f, "-0x{:X}", self.authority)?;
        }

        for &sub_auth in &self.sub_authorities {
            write!(f, "-{sub_auth}")?;
        }
        Ok(())
    }
}
