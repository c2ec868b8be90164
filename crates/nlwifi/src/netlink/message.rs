//! Netlink message framing.
//!
//! A receive buffer holds one or more messages back to back, each a
//! [`NlMsgHdr`] followed by its payload and padded to four bytes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::{Error, Result};

const NLMSG_ALIGNTO: usize = 4;

#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_ACK: u16 = 0x04;
/// `NLM_F_ROOT | NLM_F_MATCH`.
pub const NLM_F_DUMP: u16 = 0x300;

/// `struct nlmsghdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    pub nlmsg_len: u32,
    /// GENL family id for nl80211 traffic, or a [`Control`] type.
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    /// Zero for multicast notifications.
    pub nlmsg_seq: u32,
    pub nlmsg_pid: u32,
}

/// Message types owned by netlink itself rather than by a family.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Noop = 1,
    /// Error report, or an ACK when the errno is zero.
    Error = 2,
    /// End of a dump.
    Done = 3,
    Overrun = 4,
}

impl NlMsgHdr {
    /// Header of an outgoing request whose total length is `len`.
    pub fn request(len: usize, msg_type: u16, flags: u16, seq: u32, port: u32) -> Self {
        Self {
            nlmsg_len: len as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: seq,
            nlmsg_pid: port,
        }
    }

    /// The control type, if this is not a family message.
    pub fn control(&self) -> Option<Control> {
        match self.nlmsg_type {
            t if t == Control::Noop as u16 => Some(Control::Noop),
            t if t == Control::Error as u16 => Some(Control::Error),
            t if t == Control::Done as u16 => Some(Control::Done),
            t if t == Control::Overrun as u16 => Some(Control::Overrun),
            _ => None,
        }
    }
}

/// Errno carried by an `NLMSG_ERROR` or `NLMSG_DONE` payload; zero for an ACK.
///
/// The kernel sends it negated, as it is returned here.
pub fn error_code(payload: &[u8]) -> Result<i32> {
    i32::read_from_prefix(payload)
        .map(|(code, _)| code)
        .map_err(|_| Error::Truncated {
            expected: 4,
            actual: payload.len(),
        })
}

/// Iterator over the messages of one receive buffer.
///
/// Headers are copied out, so the buffer needs no particular alignment.
/// Stops after the first framing error.
pub struct MessageIter<'a> {
    rest: &'a [u8],
}

impl<'a> MessageIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    fn split_next(&mut self) -> Result<(NlMsgHdr, &'a [u8])> {
        let (header, _) = NlMsgHdr::read_from_prefix(self.rest).map_err(|_| Error::Truncated {
            expected: NLMSG_HDRLEN,
            actual: self.rest.len(),
        })?;

        let len = header.nlmsg_len as usize;
        if !(NLMSG_HDRLEN..=self.rest.len()).contains(&len) {
            return Err(Error::InvalidMessage(format!(
                "message length {} outside {}..={}",
                len,
                NLMSG_HDRLEN,
                self.rest.len()
            )));
        }

        let payload = &self.rest[NLMSG_HDRLEN..len];
        let next = nlmsg_align(len).min(self.rest.len());
        self.rest = &self.rest[next..];
        Ok((header, payload))
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let item = self.split_next();
        if item.is_err() {
            self.rest = &[];
        }
        Some(item)
    }
}
