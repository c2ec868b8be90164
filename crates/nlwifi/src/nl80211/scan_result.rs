//! Scan result records decoded from `NL80211_CMD_GET_SCAN` dumps.

use super::packet::{Nl80211Packet, find, malformed, require};
use super::{NL80211_BSS_STATUS_ASSOCIATED, Nl80211Attr, Nl80211Bss};
use crate::netlink::{Error, Result};

/// Information element id of the SSID element.
const IE_SSID: u8 = 0;

/// Per-antenna signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct RadioChainInfo {
    pub chain_id: u32,
    /// dBm.
    pub level: i32,
}

/// One BSS from the kernel scan cache.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct NativeScanResult {
    /// Raw SSID bytes; empty for hidden networks.
    pub ssid: Vec<u8>,
    pub bssid: [u8; 6],
    /// Raw information elements as received.
    pub info_element: Vec<u8>,
    /// MHz.
    pub frequency: u32,
    /// Signal strength in mBm (100 * dBm).
    pub signal_mbm: i32,
    /// Microseconds; boottime of the last sighting when the kernel reports it.
    pub tsf: u64,
    pub capability: u16,
    pub associated: bool,
    pub radio_chain_infos: Vec<RadioChainInfo>,
}

impl NativeScanResult {
    /// SSID for display, lossily decoded.
    pub fn ssid_lossy(&self) -> String {
        String::from_utf8_lossy(&self.ssid).into_owned()
    }

    /// Decode the `NL80211_ATTR_BSS` nest of one dump reply.
    pub(crate) fn from_packet(packet: &Nl80211Packet) -> Result<Self> {
        let bss = packet
            .require(Nl80211Attr::Bss as u16, "NL80211_ATTR_BSS")?
            .nested()
            .map_err(malformed("NL80211_ATTR_BSS"))?;

        let bssid_raw = require(&bss, Nl80211Bss::Bssid as u16, "NL80211_BSS_BSSID")?.bytes();
        let bssid = <[u8; 6]>::try_from(bssid_raw).map_err(|_| {
            malformed("NL80211_BSS_BSSID")(Error::InvalidAttribute(format!(
                "BSSID must be 6 bytes, got {}",
                bssid_raw.len()
            )))
        })?;

        let frequency = require(&bss, Nl80211Bss::Frequency as u16, "NL80211_BSS_FREQUENCY")?
            .u32()
            .map_err(malformed("NL80211_BSS_FREQUENCY"))?;
        let info_element = require(
            &bss,
            Nl80211Bss::InformationElements as u16,
            "NL80211_BSS_INFORMATION_ELEMENTS",
        )?
        .bytes()
        .to_vec();
        let signal_mbm = require(&bss, Nl80211Bss::SignalMbm as u16, "NL80211_BSS_SIGNAL_MBM")?
            .i32()
            .map_err(malformed("NL80211_BSS_SIGNAL_MBM"))?;

        let tsf = if let Some(attr) = find(&bss, Nl80211Bss::LastSeenBoottime as u16) {
            attr.u64().map_err(malformed("NL80211_BSS_LAST_SEEN_BOOTTIME"))? / 1000
        } else if let Some(attr) = find(&bss, Nl80211Bss::Tsf as u16) {
            attr.u64().map_err(malformed("NL80211_BSS_TSF"))?
        } else {
            0
        };

        let capability = match find(&bss, Nl80211Bss::Capability as u16) {
            Some(attr) => attr.u16().map_err(malformed("NL80211_BSS_CAPABILITY"))?,
            None => 0,
        };

        let associated = match find(&bss, Nl80211Bss::Status as u16) {
            Some(attr) => {
                attr.u32().map_err(malformed("NL80211_BSS_STATUS"))?
                    == NL80211_BSS_STATUS_ASSOCIATED
            }
            None => false,
        };

        let mut radio_chain_infos = Vec::new();
        if let Some(attr) = find(&bss, Nl80211Bss::ChainSignal as u16) {
            for chain in attr.nested().map_err(malformed("NL80211_BSS_CHAIN_SIGNAL"))? {
                let level = chain.u8().map_err(malformed("NL80211_BSS_CHAIN_SIGNAL"))? as i8;
                radio_chain_infos.push(RadioChainInfo {
                    chain_id: u32::from(chain.kind()),
                    level: i32::from(level),
                });
            }
        }

        Ok(Self {
            ssid: ssid_from_ies(&info_element).unwrap_or_default(),
            bssid,
            info_element,
            frequency,
            signal_mbm,
            tsf,
            capability,
            associated,
            radio_chain_infos,
        })
    }
}

/// SSID element payload, if the element list carries one.
///
/// Parsing stops at the first truncated element.
fn ssid_from_ies(ies: &[u8]) -> Option<Vec<u8>> {
    let mut rest = ies;
    while let [id, len, tail @ ..] = rest {
        let len = *len as usize;
        if tail.len() < len {
            return None;
        }
        if *id == IE_SSID {
            return Some(tail[..len].to_vec());
        }
        rest = &tail[len..];
    }
    None
}
