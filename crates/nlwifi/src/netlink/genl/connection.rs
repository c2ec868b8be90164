//! Request/reply exchanges over a GENL socket, and family lookup.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::ctrl;
use super::header::GenlMsgHdr;
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{Control, MessageIter, NLM_F_ACK, NLM_F_REQUEST, error_code};
use crate::netlink::socket::NetlinkSocket;

/// A resolved GENL family.
#[derive(Debug, Clone, Default)]
pub struct FamilyInfo {
    /// Message type to put in `nlmsg_type` for this family.
    pub id: u16,
    pub version: u8,
    /// Multicast group ids by name.
    pub mcast_groups: HashMap<String, u32>,
}

impl FamilyInfo {
    /// Id of the multicast group called `name`, if the family offers it.
    pub fn group(&self, name: &str) -> Option<u32> {
        self.mcast_groups.get(name).copied()
    }

    /// Decode the attributes of a `CTRL_CMD_NEWFAMILY` reply.
    fn from_attrs(data: &[u8]) -> Result<Self> {
        let mut info = Self::default();
        let mut have_id = false;

        for attr in AttrIter::new(data) {
            let (hdr, payload) = attr?;
            match hdr.kind() {
                ctrl::ATTR_FAMILY_ID => {
                    info.id = get::u16_ne(payload)?;
                    have_id = true;
                }
                ctrl::ATTR_VERSION => info.version = get::u32_ne(payload)? as u8,
                ctrl::ATTR_MCAST_GROUPS => {
                    for group in AttrIter::new(payload) {
                        let (_, group) = group?;
                        if let Some((name, id)) = mcast_group(group)? {
                            info.mcast_groups.insert(name, id);
                        }
                    }
                }
                _ => {}
            }
        }

        if !have_id {
            return Err(Error::InvalidMessage("family reply without an id".into()));
        }
        Ok(info)
    }
}

/// One `CTRL_ATTR_MCAST_GROUPS` entry; incomplete entries are skipped.
fn mcast_group(data: &[u8]) -> Result<Option<(String, u32)>> {
    let (mut name, mut id) = (None, None);
    for attr in AttrIter::new(data) {
        let (hdr, payload) = attr?;
        match hdr.kind() {
            ctrl::ATTR_MCAST_GRP_NAME => name = Some(get::string(payload)?.to_owned()),
            ctrl::ATTR_MCAST_GRP_ID => id = Some(get::u32_ne(payload)?),
            _ => {}
        }
    }
    Ok(name.zip(id))
}

/// Fold one received datagram into the replies of exchange `seq`.
///
/// Returns `true` once the exchange is complete: at the ACK of a request,
/// or at `NLMSG_DONE` of a dump. A dump that fails part-way reports its
/// errno in the `NLMSG_DONE` payload; older kernels send that payload
/// empty, which counts as success.
fn absorb(data: &[u8], seq: u32, replies: &mut Vec<Vec<u8>>) -> Result<bool> {
    for msg in MessageIter::new(data) {
        let (header, payload) = msg?;
        if header.nlmsg_seq != seq {
            trace!(seq = header.nlmsg_seq, "discarding stale reply");
            continue;
        }

        match header.control() {
            Some(Control::Error) => {
                return match error_code(payload)? {
                    0 => Ok(true),
                    errno => Err(Error::from_errno(errno)),
                };
            }
            Some(Control::Done) => {
                return match error_code(payload) {
                    Ok(errno) if errno != 0 => Err(Error::from_errno(errno)),
                    _ => Ok(true),
                };
            }
            Some(Control::Noop | Control::Overrun) => {}
            None => replies.push(payload.to_vec()),
        }
    }
    Ok(false)
}

/// A GENL socket that runs one request/reply exchange at a time.
///
/// Replies are matched by sequence number; anything else read in between
/// is discarded. Concurrent callers queue on an internal lock.
pub struct GenlConnection {
    socket: NetlinkSocket,
    exchange: Mutex<()>,
}

impl GenlConnection {
    pub fn new() -> Result<Self> {
        let socket = NetlinkSocket::new()?;
        Ok(Self {
            socket,
            exchange: Mutex::new(()),
        })
    }

    /// Look up a family by name.
    ///
    /// An unregistered family (kernel `ENOENT`) is reported as
    /// [`Error::FamilyNotFound`].
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        let not_found = || Error::FamilyNotFound {
            name: name.to_owned(),
        };

        let mut request = MessageBuilder::new(ctrl::FAMILY_ID, NLM_F_REQUEST | NLM_F_ACK);
        request.push_header(&GenlMsgHdr::new(ctrl::CMD_GETFAMILY, ctrl::VERSION));
        request.push_str_attr(ctrl::ATTR_FAMILY_NAME, name);

        let replies = self.transact(request).await.map_err(|e| {
            if e.errno() == Some(libc::ENOENT) {
                not_found()
            } else {
                e
            }
        })?;

        let (_, attrs) = GenlMsgHdr::split(replies.first().ok_or_else(not_found)?)?;
        let info = FamilyInfo::from_attrs(attrs)?;
        debug!(family = name, id = info.id, groups = ?info.mcast_groups, "resolved genl family");
        Ok(info)
    }

    /// Send a finished request and collect the payload of every reply.
    ///
    /// Each returned payload starts with the GENL header. The exchange ends
    /// at the ACK (for `NLM_F_ACK` requests) or at `NLMSG_DONE` (for dumps);
    /// a non-zero errno in either aborts it with [`Error::Kernel`].
    pub async fn transact(&self, builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let _exchange = self.exchange.lock().await;

        let seq = self.socket.next_seq();
        let msg = builder.finish(seq, self.socket.port());
        self.socket.send(&msg).await?;

        let mut replies = Vec::new();
        loop {
            let data = self.socket.recv().await?;
            if data.is_empty() {
                return Err(Error::NoReply(format!("sequence {}", seq)));
            }
            if absorb(&data, seq, &mut replies)? {
                return Ok(replies);
            }
        }
    }
}
