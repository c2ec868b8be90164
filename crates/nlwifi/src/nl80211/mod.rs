//! nl80211: the kernel's wireless configuration family.
//!
//! This module turns nl80211 capability queries and kernel events into
//! typed values, and high-level intents (start a scan, switch an interface
//! to station mode) into correctly encoded requests.
//!
//! The request side is split in two capability sets, [`WifiInfo`] and
//! [`ScanControl`], each with one production implementation
//! ([`NetlinkUtils`], [`ScanUtils`]) that borrows a [`Transport`] and the
//! shared [`EventRegistry`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nlwifi::nl80211::{EventRegistry, NetlinkUtils, Nl80211Transport, Transport, WifiInfo};
//!
//! # async fn example() -> nlwifi::Result<()> {
//! let transport = Nl80211Transport::new().await?;
//! let registry = Arc::new(EventRegistry::new());
//! transport.register_event_listener(registry.clone());
//!
//! let utils = NetlinkUtils::new(&transport, &registry);
//! let wiphy = utils.get_wiphy_index().await?;
//! let (bands, caps, features) = utils.get_wiphy_info(wiphy).await?;
//! println!("2.4 GHz: {:?}", bands.band_2g);
//! println!("max scan SSIDs: {}", caps.max_num_scan_ssids);
//! println!("random MAC: {}", features.supports_random_mac_oneshot_scan);
//! # Ok(())
//! # }
//! ```

mod events;
mod netlink_utils;
mod packet;
mod scan;
mod scan_result;
mod settings;
mod transport;
mod types;

pub use events::{EventRegistry, MlmeHandler, RegDomainHandler, ScanResultHandler};
pub use netlink_utils::{NetlinkUtils, WifiInfo};
pub use packet::{Attr, Nl80211Packet};
pub use scan::{ScanControl, ScanRequest, ScanUtils, SchedScanRequest};
pub use scan_result::{NativeScanResult, RadioChainInfo};
pub use settings::{ChannelSettings, HiddenNetwork, SingleScanSettings};
pub use transport::{EventListener, EventStream, Nl80211Transport, Transport};
pub use types::{
    BandInfo, InterfaceInfo, InterfaceMode, MlmeEvent, ScanCapabilities, ScanEventKind, ScanType,
    SchedScanIntervalSetting, SchedScanPlan, SchedScanReqFlags, StationInfo, WiphyFeatures,
};

/// nl80211 Generic Netlink family name.
pub const NL80211_GENL_NAME: &str = "nl80211";

/// nl80211 Generic Netlink version.
pub const NL80211_GENL_VERSION: u8 = 0;

/// Multicast groups the event socket joins, when the kernel offers them.
pub const NL80211_MULTICAST_GROUPS: &[&str] = &["config", "scan", "regulatory", "mlme"];

/// Longest SSID the kernel accepts.
pub const MAX_SSID_LEN: usize = 32;

/// nl80211 commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Cmd {
    GetWiphy = 1,
    NewWiphy = 3,
    GetInterface = 5,
    SetInterface = 6,
    NewInterface = 7,
    DelInterface = 8,
    GetStation = 17,
    NewStation = 19,
    GetScan = 32,
    TriggerScan = 33,
    NewScanResults = 34,
    ScanAborted = 35,
    RegChange = 36,
    Associate = 38,
    Deauthenticate = 39,
    Disassociate = 40,
    Connect = 46,
    Roam = 47,
    Disconnect = 48,
    StartSchedScan = 75,
    StopSchedScan = 76,
    SchedScanResults = 77,
    SchedScanStopped = 78,
    WiphyRegChange = 113,
    AbortScan = 114,
}

impl Nl80211Cmd {
    /// Map a raw command code to a known command.
    pub fn from_u8(cmd: u8) -> Option<Self> {
        use Nl80211Cmd::*;
        Some(match cmd {
            1 => GetWiphy,
            3 => NewWiphy,
            5 => GetInterface,
            6 => SetInterface,
            7 => NewInterface,
            8 => DelInterface,
            17 => GetStation,
            19 => NewStation,
            32 => GetScan,
            33 => TriggerScan,
            34 => NewScanResults,
            35 => ScanAborted,
            36 => RegChange,
            38 => Associate,
            39 => Deauthenticate,
            40 => Disassociate,
            46 => Connect,
            47 => Roam,
            48 => Disconnect,
            75 => StartSchedScan,
            76 => StopSchedScan,
            77 => SchedScanResults,
            78 => SchedScanStopped,
            113 => WiphyRegChange,
            114 => AbortScan,
            _ => return None,
        })
    }
}

/// Top-level nl80211 attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Attr {
    Wiphy = 1,
    Ifindex = 3,
    Ifname = 4,
    Iftype = 5,
    Mac = 6,
    StaInfo = 21,
    WiphyBands = 22,
    RegAlpha2 = 33,
    Ie = 42,
    MaxNumScanSsids = 43,
    ScanFrequencies = 44,
    ScanSsids = 45,
    Bss = 47,
    RegInitiator = 48,
    RegType = 49,
    Frame = 51,
    Ssid = 52,
    ReasonCode = 54,
    TimedOut = 65,
    DisconnectedByAp = 71,
    StatusCode = 72,
    SchedScanInterval = 119,
    MaxNumSchedScanSsids = 123,
    SchedScanMatch = 132,
    MaxMatchSets = 133,
    FeatureFlags = 143,
    ScanFlags = 158,
    SplitWiphyDump = 174,
    MacMask = 215,
    MaxNumSchedScanPlans = 222,
    MaxScanPlanInterval = 223,
    MaxScanPlanIterations = 224,
    SchedScanPlans = 225,
    SchedScanRelativeRssi = 246,
}

/// Per-band attributes inside `NL80211_ATTR_WIPHY_BANDS`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211BandAttr {
    Freqs = 1,
}

/// Band indices used as nest keys (e.g. per-band RSSI).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Band {
    Band2Ghz = 0,
    Band5Ghz = 1,
    Band60Ghz = 2,
    Band6Ghz = 3,
}

/// Per-frequency attributes inside `NL80211_BAND_ATTR_FREQS`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211FrequencyAttr {
    Freq = 1,
    Disabled = 2,
    NoIr = 3,
    Radar = 5,
    DfsState = 7,
}

/// Station info attributes inside `NL80211_ATTR_STA_INFO`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211StaInfo {
    Signal = 7,
    TxBitrate = 8,
    TxPackets = 10,
    TxFailed = 12,
}

/// Rate info attributes inside `NL80211_STA_INFO_TX_BITRATE`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211RateInfo {
    Bitrate = 1,
    Bitrate32 = 5,
}

/// BSS attributes inside `NL80211_ATTR_BSS`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Bss {
    Bssid = 1,
    Frequency = 2,
    Tsf = 3,
    BeaconInterval = 4,
    Capability = 5,
    InformationElements = 6,
    SignalMbm = 7,
    Status = 9,
    LastSeenBoottime = 15,
    ChainSignal = 19,
}

/// Value of `NL80211_BSS_STATUS` for the BSS we are associated with.
pub const NL80211_BSS_STATUS_ASSOCIATED: u32 = 1;

/// Match set attributes inside `NL80211_ATTR_SCHED_SCAN_MATCH`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211SchedScanMatchAttr {
    Ssid = 1,
    Rssi = 2,
    PerBandRssi = 6,
}

/// Plan attributes inside `NL80211_ATTR_SCHED_SCAN_PLANS`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211SchedScanPlan {
    Interval = 1,
    Iterations = 2,
}

/// `NL80211_ATTR_SCAN_FLAGS` bits.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211ScanFlag {
    RandomAddr = 1 << 3,
    LowSpan = 1 << 8,
    LowPower = 1 << 9,
    HighAccuracy = 1 << 10,
    Colocated6Ghz = 1 << 14,
}

/// `NL80211_ATTR_FEATURE_FLAGS` bits this layer decodes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Feature {
    ScanRandomMacAddr = 1 << 29,
    SchedScanRandomMacAddr = 1 << 30,
}

/// Interface types (`NL80211_ATTR_IFTYPE`).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Iftype {
    Station = 2,
    P2pDevice = 10,
}

/// Regulatory domain types (`NL80211_ATTR_REG_TYPE`).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211RegType {
    Country = 0,
    World = 1,
    CustomWorld = 2,
    Intersection = 3,
}
