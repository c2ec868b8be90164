//! Netlink attribute (nlattr) handling.
//!
//! nl80211 replies are attribute trees, so unlike a best-effort dump parser
//! the iterator here is strict: a header whose length runs past the buffer
//! is reported as an error instead of silently ending iteration.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type, possibly carrying NLA_F_* flags.
    pub nla_type: u16,
}

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Whether the sender marked this attribute as nested.
    pub fn is_nested(&self) -> bool {
        self.nla_type & NLA_F_NESTED != 0
    }
}

/// Strict iterator over the attributes in a buffer.
///
/// Yields `(header, payload)`. After the first error the iterator is fused.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Result<(NlAttr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        // Trailing padding shorter than a header is not an attribute.
        if self.data.len() < NLA_HDRLEN {
            return None;
        }

        // Copy the header out: nested payloads need not be 2-byte aligned.
        let attr = match NlAttr::read_from_prefix(self.data) {
            Ok((a, _)) => a,
            Err(_) => {
                let actual = self.data.len();
                self.data = &[];
                return Some(Err(Error::Truncated {
                    expected: NLA_HDRLEN,
                    actual,
                }));
            }
        };

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            let err = Error::InvalidAttribute(format!(
                "attribute {} declares length {} with {} bytes left",
                attr.kind(),
                len,
                self.data.len()
            ));
            self.data = &[];
            return Some(Err(err));
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);
        self.data = if aligned_len >= self.data.len() {
            &[]
        } else {
            &self.data[aligned_len..]
        };

        Some(Ok((attr, payload)))
    }
}

/// Width-checked extraction of scalar payloads.
///
/// nl80211 scalars have fixed widths; a payload of the wrong size means the
/// attribute does not have the shape we expect, so these reject both short
/// and long payloads.
pub mod get {
    use super::*;

    fn fixed<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
        data.try_into().map_err(|_| {
            Error::InvalidAttribute(format!(
                "{} attribute must be {} bytes, got {}",
                what,
                N,
                data.len()
            ))
        })
    }

    pub fn u8(data: &[u8]) -> Result<u8> {
        Ok(fixed::<1>(data, "u8")?[0])
    }

    pub fn i8(data: &[u8]) -> Result<i8> {
        Ok(fixed::<1>(data, "s8")?[0] as i8)
    }

    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        Ok(u16::from_ne_bytes(fixed(data, "u16")?))
    }

    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        Ok(u32::from_ne_bytes(fixed(data, "u32")?))
    }

    pub fn i32_ne(data: &[u8]) -> Result<i32> {
        Ok(i32::from_ne_bytes(fixed(data, "s32")?))
    }

    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        Ok(u64::from_ne_bytes(fixed(data, "u64")?))
    }

    /// Extract a string, stopping at the first NUL if there is one.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }
}
