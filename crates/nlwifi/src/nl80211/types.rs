//! Domain types produced and consumed by the nl80211 layer.

use super::{Nl80211Feature, Nl80211ScanFlag};
use crate::netlink::{Error, Result};

/// Supported frequencies in MHz, per band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct BandInfo {
    pub band_2g: Vec<u32>,
    pub band_5g: Vec<u32>,
    /// Frequencies that require radar detection, whatever their band.
    pub band_dfs: Vec<u32>,
    pub band_6g: Vec<u32>,
}

/// Hardware scan limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct ScanCapabilities {
    pub max_num_scan_ssids: u8,
    pub max_num_sched_scan_ssids: u8,
    pub max_match_sets: u8,
    /// Zero when the driver does not report scan plans.
    pub max_num_scan_plans: u32,
    pub max_scan_plan_interval: u32,
    pub max_scan_plan_iterations: u32,
}

/// Feature bits this layer cares about.
///
/// Only the named bits are decoded; everything else in the kernel bitmask
/// is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct WiphyFeatures {
    pub supports_random_mac_oneshot_scan: bool,
    pub supports_random_mac_sched_scan: bool,
}

impl WiphyFeatures {
    pub fn from_feature_flags(flags: u32) -> Self {
        Self {
            supports_random_mac_oneshot_scan: flags & Nl80211Feature::ScanRandomMacAddr as u32
                != 0,
            supports_random_mac_sched_scan: flags & Nl80211Feature::SchedScanRandomMacAddr as u32
                != 0,
        }
    }
}

/// Link counters for one associated station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct StationInfo {
    pub station_tx_packets: u32,
    pub station_tx_failed: u32,
    /// In units of 100 kbit/s.
    pub station_tx_bitrate: u32,
    /// dBm.
    pub current_rssi: i8,
}

/// Name, index and hardware address of a wireless interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct InterfaceInfo {
    pub name: String,
    pub index: u32,
    pub mac_address: [u8; 6],
}

/// Target modes for `set_interface_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceMode {
    Station,
}

/// One-shot scan strategies.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub enum ScanType {
    LowSpan = 0,
    #[default]
    LowPower = 1,
    HighAccuracy = 2,
}

impl ScanType {
    /// Validate a raw scan type.
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(Self::LowSpan),
            1 => Ok(Self::LowPower),
            2 => Ok(Self::HighAccuracy),
            other => Err(Error::InvalidScanType(other)),
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// `NL80211_SCAN_FLAG_*` bit for this scan type.
    pub fn scan_flag(self) -> u32 {
        match self {
            Self::LowSpan => Nl80211ScanFlag::LowSpan as u32,
            Self::LowPower => Nl80211ScanFlag::LowPower as u32,
            Self::HighAccuracy => Nl80211ScanFlag::HighAccuracy as u32,
        }
    }
}

impl std::str::FromStr for ScanType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low-span" => Ok(Self::LowSpan),
            "low-power" => Ok(Self::LowPower),
            "high-accuracy" => Ok(Self::HighAccuracy),
            _ => Err(Error::InvalidArgument(format!("unknown scan type '{}'", s))),
        }
    }
}

/// One step of a scheduled scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedScanPlan {
    pub interval_ms: u32,
    pub n_iterations: u32,
}

/// Scheduled scan timing: zero or more plans, then an endless final interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedScanIntervalSetting {
    pub plans: Vec<SchedScanPlan>,
    pub final_interval_ms: u32,
}

/// Behavior flags for a scheduled scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedScanReqFlags {
    pub request_random_mac: bool,
    pub request_low_power: bool,
    pub request_sched_scan_relative_rssi: bool,
}

/// Link-management notification, as delivered to MLME handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub enum MlmeEvent {
    Connect {
        bssid: Option<[u8; 6]>,
        status_code: u16,
        timed_out: bool,
    },
    Associate {
        bssid: Option<[u8; 6]>,
        status_code: u16,
        timed_out: bool,
    },
    Roam {
        bssid: Option<[u8; 6]>,
    },
    Disconnect {
        reason_code: u16,
        by_ap: bool,
    },
    Disassociate {
        bssid: Option<[u8; 6]>,
        reason_code: u16,
    },
    Deauthenticate {
        bssid: Option<[u8; 6]>,
        reason_code: u16,
    },
}

/// What a scan-ready notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub enum ScanEventKind {
    /// One-shot scan finished; results are in the kernel cache.
    Completed,
    /// One-shot scan was aborted.
    Aborted,
    ScheduledResults,
    ScheduledStopped,
}
