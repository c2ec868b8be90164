//! Netlink plumbing: headers, attributes, Generic Netlink and the socket.
//!
//! This layer knows nothing about wireless; the nl80211 semantics live in
//! [`crate::nl80211`].

pub mod attr;
mod builder;
mod error;
pub mod genl;
pub mod message;
mod socket;

pub use attr::{AttrIter, NlAttr};
pub use builder::MessageBuilder;
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr};
pub use socket::NetlinkSocket;
