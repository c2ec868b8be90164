//! Common test utilities for integration tests.
//!
//! Builders for the replies the kernel sends, plus a macro that skips live
//! tests on hosts without nl80211.

#![allow(dead_code)]

use nlwifi::nl80211::{
    Attr, Nl80211Attr, Nl80211BandAttr, Nl80211Bss, Nl80211Cmd, Nl80211FrequencyAttr,
    Nl80211Packet,
};

pub const WIPHY: u32 = 0;
pub const IFINDEX: u32 = 3;
pub const MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
pub const BSSID: [u8; 6] = [0x02, 0x11, 0x22, 0x33, 0x44, 0x55];

/// One frequency entry of a band.
pub fn freq(mhz: u32, radar: bool) -> Attr {
    let mut attrs = vec![Attr::new_u32(Nl80211FrequencyAttr::Freq as u16, mhz)];
    if radar {
        attrs.push(Attr::flag(Nl80211FrequencyAttr::Radar as u16));
    }
    Attr::nest(0, attrs)
}

/// `NL80211_ATTR_WIPHY_BANDS` with one band per frequency list.
pub fn bands(per_band: Vec<Vec<Attr>>) -> Attr {
    Attr::nest(
        Nl80211Attr::WiphyBands as u16,
        per_band.into_iter().enumerate().map(|(i, freqs)| {
            Attr::nest(i as u16, [Attr::nest(Nl80211BandAttr::Freqs as u16, freqs)])
        }),
    )
}

/// Scan limits every wiphy reply must carry.
pub fn scan_limits(scan_ssids: u8, sched_ssids: u8, match_sets: u8) -> Vec<Attr> {
    vec![
        Attr::new_u8(Nl80211Attr::MaxNumScanSsids as u16, scan_ssids),
        Attr::new_u8(Nl80211Attr::MaxNumSchedScanSsids as u16, sched_ssids),
        Attr::new_u8(Nl80211Attr::MaxMatchSets as u16, match_sets),
    ]
}

/// `NEW_WIPHY` reply carrying `attrs`.
pub fn wiphy_reply(wiphy: u32, attrs: Vec<Attr>) -> Nl80211Packet {
    let mut packet = Nl80211Packet::new(Nl80211Cmd::NewWiphy)
        .with(Attr::new_u32(Nl80211Attr::Wiphy as u16, wiphy));
    for attr in attrs {
        packet.push(attr);
    }
    packet
}

/// `NEW_INTERFACE` reply.
pub fn interface_reply(wiphy: u32, ifindex: u32, name: &str, iftype: u32) -> Nl80211Packet {
    Nl80211Packet::new(Nl80211Cmd::NewInterface)
        .with(Attr::new_u32(Nl80211Attr::Wiphy as u16, wiphy))
        .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex))
        .with(Attr::new_string(Nl80211Attr::Ifname as u16, name))
        .with(Attr::new_u32(Nl80211Attr::Iftype as u16, iftype))
        .with(Attr::new(Nl80211Attr::Mac as u16, MAC.to_vec()))
}

/// Scan dump entry for a BSS advertising `ssid`.
pub fn bss_reply(bssid: [u8; 6], ssid: &[u8], frequency: u32, signal_mbm: i32) -> Nl80211Packet {
    let mut ies = vec![0x00, ssid.len() as u8];
    ies.extend_from_slice(ssid);

    Nl80211Packet::new(Nl80211Cmd::NewScanResults)
        .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, IFINDEX))
        .with(Attr::nest(
            Nl80211Attr::Bss as u16,
            [
                Attr::new(Nl80211Bss::Bssid as u16, bssid.to_vec()),
                Attr::new_u32(Nl80211Bss::Frequency as u16, frequency),
                Attr::new(Nl80211Bss::InformationElements as u16, ies),
                Attr::new_i32(Nl80211Bss::SignalMbm as u16, signal_mbm),
                Attr::new_u64(Nl80211Bss::Tsf as u16, 1234),
            ],
        ))
}

/// Skip the test when the nl80211 family is not registered.
///
/// Expands to the transport on success.
#[macro_export]
macro_rules! require_nl80211 {
    () => {
        match nlwifi::nl80211::Nl80211Transport::new().await {
            Ok(transport) => transport,
            Err(e) => {
                eprintln!("Skipping test: nl80211 unavailable ({})", e);
                return Ok(());
            }
        }
    };
}
