//! `struct genlmsghdr`, the four bytes between the netlink header and the
//! attributes of every GENL message.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::{Error, Result};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    pub cmd: u8,
    pub version: u8,
    pub reserved: u16,
}

pub const GENL_HDRLEN: usize = std::mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Split a message payload into its GENL header and attribute bytes.
    pub fn split(payload: &[u8]) -> Result<(Self, &[u8])> {
        Self::read_from_prefix(payload).map_err(|_| Error::Truncated {
            expected: GENL_HDRLEN,
            actual: payload.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_returns_attributes() {
        // TRIGGER_SCAN, version 0, one trailing attribute byte
        let (hdr, rest) = GenlMsgHdr::split(&[33, 0, 0, 0, 0xff]).unwrap();
        assert_eq!(hdr, GenlMsgHdr::new(33, 0));
        assert_eq!(rest, &[0xff]);
    }

    #[test]
    fn split_rejects_short_payload() {
        assert!(matches!(
            GenlMsgHdr::split(&[3, 1, 0]),
            Err(Error::Truncated {
                expected: 4,
                actual: 3
            })
        ));
    }
}
