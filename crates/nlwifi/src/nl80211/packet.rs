//! nl80211 packet model: a command code plus an attribute tree.
//!
//! Replies are decoded eagerly into [`Attr`] values holding the raw payload.
//! Whether a payload is a scalar or a nested list is decided by the reader
//! ([`Attr::nested`]), since the kernel does not flag every nest.

use tracing::warn;
use zerocopy::IntoBytes;

use super::Nl80211Cmd;
use crate::netlink::attr::{AttrIter, NLA_F_NESTED, NlAttr, get, nla_align};
use crate::netlink::genl::GenlMsgHdr;
use crate::netlink::{Error, MessageBuilder, Result};

/// A single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    kind: u16,
    nested: bool,
    payload: Vec<u8>,
}

impl Attr {
    /// Attribute with a raw payload.
    pub fn new(kind: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            nested: false,
            payload: payload.into(),
        }
    }

    /// Flag attribute: presence is the value.
    pub fn flag(kind: u16) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn new_u8(kind: u16, value: u8) -> Self {
        Self::new(kind, vec![value])
    }

    pub fn new_u16(kind: u16, value: u16) -> Self {
        Self::new(kind, value.to_ne_bytes())
    }

    pub fn new_u32(kind: u16, value: u32) -> Self {
        Self::new(kind, value.to_ne_bytes())
    }

    pub fn new_i32(kind: u16, value: i32) -> Self {
        Self::new(kind, value.to_ne_bytes())
    }

    pub fn new_u64(kind: u16, value: u64) -> Self {
        Self::new(kind, value.to_ne_bytes())
    }

    /// NUL-terminated string attribute.
    pub fn new_string(kind: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Self::new(kind, data)
    }

    /// Nested attribute built from `children`.
    pub fn nest(kind: u16, children: impl IntoIterator<Item = Attr>) -> Self {
        let mut payload = Vec::new();
        for child in children {
            child.encode_into(&mut payload);
        }
        Self {
            kind,
            nested: true,
            payload,
        }
    }

    pub fn kind(&self) -> u16 {
        self.kind
    }

    /// Whether the attribute carries `NLA_F_NESTED`.
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn u8(&self) -> Result<u8> {
        self.shaped(get::u8(&self.payload))
    }

    pub fn u16(&self) -> Result<u16> {
        self.shaped(get::u16_ne(&self.payload))
    }

    pub fn u32(&self) -> Result<u32> {
        self.shaped(get::u32_ne(&self.payload))
    }

    pub fn i32(&self) -> Result<i32> {
        self.shaped(get::i32_ne(&self.payload))
    }

    pub fn u64(&self) -> Result<u64> {
        self.shaped(get::u64_ne(&self.payload))
    }

    pub fn string(&self) -> Result<&str> {
        self.shaped(get::string(&self.payload))
    }

    /// Decode the payload as a nested attribute list.
    pub fn nested(&self) -> Result<Vec<Attr>> {
        self.shaped(decode_attrs(&self.payload))
    }

    fn shaped<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| match e {
            Error::InvalidAttribute(msg) => {
                Error::InvalidAttribute(format!("attribute {}: {}", self.kind, msg))
            }
            other => other,
        })
    }

    fn wire_kind(&self) -> u16 {
        if self.nested {
            self.kind | NLA_F_NESTED
        } else {
            self.kind
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        let hdr = NlAttr::new(self.wire_kind(), self.payload.len());
        buf.extend_from_slice(hdr.as_bytes());
        buf.extend_from_slice(&self.payload);
        buf.resize(nla_align(buf.len()), 0);
    }
}

/// Decode a buffer of attributes.
pub(crate) fn decode_attrs(data: &[u8]) -> Result<Vec<Attr>> {
    AttrIter::new(data)
        .map(|item| {
            let (hdr, payload) = item?;
            Ok(Attr {
                kind: hdr.kind(),
                nested: hdr.is_nested(),
                payload: payload.to_vec(),
            })
        })
        .collect()
}

/// First attribute of the given kind.
pub fn find(attrs: &[Attr], kind: u16) -> Option<&Attr> {
    attrs.iter().find(|a| a.kind == kind)
}

/// Mandatory attribute lookup; a miss is logged with the attribute name.
pub(crate) fn require<'a>(attrs: &'a [Attr], kind: u16, name: &'static str) -> Result<&'a Attr> {
    find(attrs, kind).ok_or_else(|| {
        warn!(attribute = name, "reply is missing a mandatory attribute");
        Error::MissingAttribute { name }
    })
}

/// Log a shape error against the attribute it came from.
pub(crate) fn malformed(name: &'static str) -> impl FnOnce(Error) -> Error {
    move |e| {
        warn!(attribute = name, error = %e, "malformed attribute in reply");
        e
    }
}

/// One nl80211 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nl80211Packet {
    cmd: u8,
    attrs: Vec<Attr>,
}

impl Nl80211Packet {
    pub fn new(cmd: Nl80211Cmd) -> Self {
        Self::from_raw(cmd as u8, Vec::new())
    }

    /// Packet with an arbitrary command code (e.g. one this crate does not know).
    pub fn from_raw(cmd: u8, attrs: Vec<Attr>) -> Self {
        Self { cmd, attrs }
    }

    /// Append an attribute, builder style.
    pub fn with(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn push(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }

    pub fn cmd(&self) -> u8 {
        self.cmd
    }

    pub fn command(&self) -> Option<Nl80211Cmd> {
        Nl80211Cmd::from_u8(self.cmd)
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Look up a top-level attribute. `None` means absent, never zero.
    pub fn attr(&self, kind: u16) -> Option<&Attr> {
        find(&self.attrs, kind)
    }

    /// Look up a mandatory top-level attribute.
    pub fn require(&self, kind: u16, name: &'static str) -> Result<&Attr> {
        require(&self.attrs, kind, name)
    }

    /// Build the netlink message for this packet.
    pub fn to_message(&self, family_id: u16, flags: u16, version: u8) -> MessageBuilder {
        let mut builder = MessageBuilder::new(family_id, flags);
        builder.push_header(&GenlMsgHdr::new(self.cmd, version));
        for attr in &self.attrs {
            builder.push_attr(attr.wire_kind(), &attr.payload);
        }
        builder
    }

    /// Parse a GENL payload (header followed by attributes).
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (hdr, rest) = GenlMsgHdr::split(payload)?;
        let attrs = decode_attrs(rest)?;
        Ok(Self {
            cmd: hdr.cmd,
            attrs,
        })
    }
}
