//! String-form SID parsing shared by `ad-invalid-chars` and its proc macro.
//!
//! Do not depend on this crate directly, go through `ad-invalid-chars`.
#![cfg_attr(not(feature = "std"), no_std)]

use core::str::FromStr;

use arrayvec::ArrayVec;
use thiserror::Error;

/// Maximum number of sub-authorities a string-form SID may carry.
pub const MAX_SUBAUTHORITY_COUNT: u8 = 15;
/// Minimum number of sub-authorities a string-form SID may carry.
pub const MIN_SUBAUTHORITY_COUNT: u8 = 1;
/// Size of the fixed SID header: revision, count and 6-byte authority.
pub const SID_HEADER_LEN: usize = 8;
/// Largest binary SID [`SidComponents::to_binary`] can produce.
pub const MAX_BINARY_LEN: usize = SID_HEADER_LEN + 4 * MAX_SUBAUTHORITY_COUNT as usize;

/// Largest identifier authority value (48 bits).
const MAX_AUTHORITY: u64 = 0xFFFF_FFFF_FFFF;

/// The parts of a string-form SID such as `S-1-5-21-1-2-3-1105`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidComponents {
    /// The SID revision value, generally 1.
    pub revision: u8,
    /// The SID identifier authority value, big-endian.
    pub identifier_authority: [u8; 6],
    /// The SID sub-authority values.
    pub sub_authority: ArrayVec<u32, 15>,
}

/// Error type returned when parsing a SID string fails due to an invalid format.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Invalid format for Sid")]
pub struct InvalidSidFormat;

impl SidComponents {
    /// Identifier authority as an integer.
    #[must_use]
    #[inline]
    pub const fn authority(&self) -> u64 {
        let a = self.identifier_authority;
        u64::from_be_bytes([0, 0, a[0], a[1], a[2], a[3], a[4], a[5]])
    }

    /// Encodes the SID in its binary layout: revision, count, big-endian
    /// authority, then little-endian sub-authorities.
    #[must_use]
    #[inline]
    pub fn to_binary(&self) -> ArrayVec<u8, MAX_BINARY_LEN> {
        let mut out = ArrayVec::new();
        out.push(self.revision);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "sub_authority capacity is 15"
        )]
        out.push(self.sub_authority.len() as u8);
        out.extend(self.identifier_authority);
        for sub in &self.sub_authority {
            out.extend(sub.to_le_bytes());
        }
        out
    }
}

fn parse_authority(s: &str) -> Result<[u8; 6], InvalidSidFormat> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|_| InvalidSidFormat)?;
    if value > MAX_AUTHORITY {
        return Err(InvalidSidFormat);
    }
    let [_, _, a0, a1, a2, a3, a4, a5] = value.to_be_bytes();
    Ok([a0, a1, a2, a3, a4, a5])
}

impl FromStr for SidComponents {
    type Err = InvalidSidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut s_cmp = s.split('-');
        if !s_cmp
            .next()
            .is_some_and(|head| head.eq_ignore_ascii_case("s"))
        {
            return Err(InvalidSidFormat);
        }
        let revision = s_cmp
            .next()
            .ok_or(InvalidSidFormat)?
            .parse::<u8>()
            .map_err(|_| InvalidSidFormat)?;

        let identifier_authority = s_cmp
            .next()
            .ok_or(InvalidSidFormat)
            .and_then(parse_authority)?;
        let mut sub_authority = ArrayVec::<u32, 15>::new();
        for item in s_cmp {
            let item = item.parse::<u32>().map_err(|_| InvalidSidFormat)?;
            sub_authority.try_push(item).map_err(|_| InvalidSidFormat)?;
        }
        if sub_authority.len() < MIN_SUBAUTHORITY_COUNT as usize {
            return Err(InvalidSidFormat);
        }

        Ok(Self {
            revision,
            identifier_authority,
            sub_authority,
        })
    }
}

#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_builtin_administrators() {
        let sid: SidComponents = "S-1-5-32-544".parse().unwrap();
        assert_eq!(sid.revision, 1);
        assert_eq!(sid.authority(), 5);
        assert_eq!(sid.sub_authority.as_slice(), &[32, 544]);
        assert_eq!(
            sid.to_binary().as_slice(),
            &[1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 32, 2, 0, 0]
        );
    }

    #[test]
    fn lower_case_prefix_and_hex_authority() {
        let sid: SidComponents = "s-1-0x1A2B3C4D5E6F-7".parse().unwrap();
        assert_eq!(sid.identifier_authority, [0x1A, 0x2B, 0x3C, 0x4D, 0x5E, 0x6F]);
        assert_eq!(sid.authority(), 0x1A2B_3C4D_5E6F);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "",
            "X-1-5-32",
            "S-1",
            "S-1-5",
            "S-256-5-1",
            "S-1-five-1",
            "S-1-5-1--2",
            "S-1-281474976710656-1",
            "S-1-5-1-2-3-4-5-6-7-8-9-10-11-12-13-14-15-16",
        ] {
            assert_eq!(bad.parse::<SidComponents>(), Err(InvalidSidFormat), "{bad}");
        }
    }

    #[test]
    fn max_authority_is_accepted() {
        let sid: SidComponents = "S-1-281474976710655-1".parse().unwrap();
        assert_eq!(sid.identifier_authority, [0xFF; 6]);
    }
}
