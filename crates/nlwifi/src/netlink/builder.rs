//! Request encoding.

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::{Immutable, IntoBytes};

use super::attr::{NlAttr, nla_align};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Accumulates the body of one netlink request.
///
/// The netlink header is written by [`finish`](Self::finish), once the
/// length, sequence number and port are known.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    msg_type: u16,
    flags: u16,
    body: BytesMut,
}

impl MessageBuilder {
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            msg_type,
            flags,
            body: BytesMut::new(),
        }
    }

    /// Append a fixed-layout family header (e.g. `genlmsghdr`).
    pub fn push_header<T: IntoBytes + Immutable>(&mut self, header: &T) {
        self.body.put_slice(header.as_bytes());
        self.pad_to(nlmsg_align(self.body.len()));
    }

    /// Append one attribute with a raw payload.
    pub fn push_attr(&mut self, kind: u16, payload: &[u8]) {
        self.body
            .put_slice(NlAttr::new(kind, payload.len()).as_bytes());
        self.body.put_slice(payload);
        self.pad_to(nla_align(self.body.len()));
    }

    /// Append a NUL-terminated string attribute.
    pub fn push_str_attr(&mut self, kind: u16, value: &str) {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.push_attr(kind, &payload);
    }

    /// Everything after the netlink header.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Prepend the header and return the wire bytes.
    pub fn finish(self, seq: u32, port: u32) -> Bytes {
        let len = NLMSG_HDRLEN + self.body.len();
        let header = NlMsgHdr::request(len, self.msg_type, self.flags, seq, port);

        let mut msg = BytesMut::with_capacity(len);
        msg.put_slice(header.as_bytes());
        msg.put_bytes(0, NLMSG_HDRLEN - std::mem::size_of::<NlMsgHdr>());
        msg.put_slice(&self.body);
        msg.freeze()
    }

    fn pad_to(&mut self, len: usize) {
        let pad = len - self.body.len();
        self.body.put_bytes(0, pad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrIter, NLA_HDRLEN};
    use crate::netlink::message::{MessageIter, NLM_F_REQUEST};

    #[test]
    fn header_is_filled_on_finish() {
        let mut builder = MessageBuilder::new(28, NLM_F_REQUEST);
        builder.push_attr(3, &4u32.to_ne_bytes());
        let msg = builder.finish(7, 1234);

        let (header, payload) = MessageIter::new(&msg).next().unwrap().unwrap();
        assert_eq!(header.nlmsg_len as usize, msg.len());
        assert_eq!(header.nlmsg_type, 28);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
        assert_eq!(header.nlmsg_seq, 7);
        assert_eq!(header.nlmsg_pid, 1234);
        assert_eq!(payload.len(), NLA_HDRLEN + 4);
    }

    #[test]
    fn string_attributes_are_terminated_and_padded() {
        let mut builder = MessageBuilder::new(0x10, NLM_F_REQUEST);
        builder.push_str_attr(2, "nl80211");
        assert_eq!(builder.body().len(), NLA_HDRLEN + 8);

        let (attr, value) = AttrIter::new(builder.body()).next().unwrap().unwrap();
        assert_eq!(attr.kind(), 2);
        assert_eq!(value, b"nl80211\0");
    }
}
