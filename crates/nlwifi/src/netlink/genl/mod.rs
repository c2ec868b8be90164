//! Generic Netlink (GENL).
//!
//! nl80211 is a GENL family: the kernel assigns its id at boot, so the id
//! and the multicast group ids are looked up by name through the control
//! family before anything else is sent.

mod connection;
mod header;

pub use connection::{FamilyInfo, GenlConnection};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// The control family (`nlctrl`) and the parts of it used for lookups.
pub mod ctrl {
    /// Fixed id of the control family.
    pub const FAMILY_ID: u16 = 0x10;
    pub const VERSION: u8 = 1;

    pub const CMD_GETFAMILY: u8 = 3;

    pub const ATTR_FAMILY_ID: u16 = 1;
    pub const ATTR_FAMILY_NAME: u16 = 2;
    pub const ATTR_VERSION: u16 = 3;
    pub const ATTR_MCAST_GROUPS: u16 = 7;

    pub const ATTR_MCAST_GRP_NAME: u16 = 1;
    pub const ATTR_MCAST_GRP_ID: u16 = 2;
}
