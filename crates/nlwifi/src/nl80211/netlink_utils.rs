//! Wiphy, interface and station queries.

use std::future::Future;

use tracing::{debug, warn};

use super::events::EventRegistry;
use super::packet::{Attr, Nl80211Packet, find, malformed, require};
use super::transport::Transport;
use super::types::{
    BandInfo, InterfaceInfo, InterfaceMode, MlmeEvent, ScanCapabilities, StationInfo,
    WiphyFeatures,
};
use super::{
    Nl80211Attr, Nl80211BandAttr, Nl80211Cmd, Nl80211FrequencyAttr, Nl80211Iftype,
    Nl80211RateInfo, Nl80211StaInfo,
};
use crate::netlink::{Error, Result};

/// Capability and state queries for wireless devices.
pub trait WifiInfo {
    /// Index of the first radio the kernel reports.
    fn get_wiphy_index(&self) -> impl Future<Output = Result<u32>> + Send;

    /// Station interface on `wiphy`.
    fn get_interface_info(&self, wiphy: u32) -> impl Future<Output = Result<InterfaceInfo>> + Send;

    fn set_interface_mode(
        &self,
        ifindex: u32,
        mode: InterfaceMode,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Bands, scan limits and feature flags of `wiphy`.
    fn get_wiphy_info(
        &self,
        wiphy: u32,
    ) -> impl Future<Output = Result<(BandInfo, ScanCapabilities, WiphyFeatures)>> + Send;

    /// Counters for the station `mac` on `ifindex`.
    ///
    /// Fails with a kernel rejection (ENOENT) when the station is not
    /// associated.
    fn get_station_info(
        &self,
        ifindex: u32,
        mac: [u8; 6],
    ) -> impl Future<Output = Result<StationInfo>> + Send;

    fn subscribe_mlme_event<F>(&self, ifindex: u32, handler: F)
    where
        F: Fn(u32, &MlmeEvent) + Send + Sync + 'static;

    fn unsubscribe_mlme_event(&self, ifindex: u32);

    fn subscribe_reg_domain_change<F>(&self, wiphy: u32, handler: F)
    where
        F: Fn(u32, &str) + Send + Sync + 'static;

    fn unsubscribe_reg_domain_change(&self, wiphy: u32);
}

/// [`WifiInfo`] over an nl80211 [`Transport`].
///
/// Borrows both collaborators; whoever wires the daemon together keeps the
/// transport and registry alive for as long as this value exists.
pub struct NetlinkUtils<'a, T> {
    transport: &'a T,
    registry: &'a EventRegistry,
}

impl<'a, T: Transport + Sync> NetlinkUtils<'a, T> {
    pub fn new(transport: &'a T, registry: &'a EventRegistry) -> Self {
        Self {
            transport,
            registry,
        }
    }
}

impl<T: Transport + Sync> WifiInfo for NetlinkUtils<'_, T> {
    async fn get_wiphy_index(&self) -> Result<u32> {
        let replies = self
            .transport
            .send_dump(Nl80211Packet::new(Nl80211Cmd::GetWiphy))
            .await
            .map_err(|e| e.with_context("GET_WIPHY"))?;

        for reply in &replies {
            if let Some(attr) = reply.attr(Nl80211Attr::Wiphy as u16) {
                let wiphy = attr.u32().map_err(malformed("NL80211_ATTR_WIPHY"))?;
                debug!(wiphy, "found wiphy");
                return Ok(wiphy);
            }
        }

        Err(Error::NoWiphy)
    }

    async fn get_interface_info(&self, wiphy: u32) -> Result<InterfaceInfo> {
        let request = Nl80211Packet::new(Nl80211Cmd::GetInterface)
            .with(Attr::new_u32(Nl80211Attr::Wiphy as u16, wiphy));
        let replies = self
            .transport
            .send_dump(request)
            .await
            .map_err(|e| e.with_context("GET_INTERFACE"))?;

        for reply in &replies {
            // Older kernels ignore the wiphy filter.
            if let Some(attr) = reply.attr(Nl80211Attr::Wiphy as u16)
                && attr.u32().map_err(malformed("NL80211_ATTR_WIPHY"))? != wiphy
            {
                continue;
            }

            if let Some(attr) = reply.attr(Nl80211Attr::Iftype as u16)
                && attr.u32().map_err(malformed("NL80211_ATTR_IFTYPE"))?
                    == Nl80211Iftype::P2pDevice as u32
            {
                debug!("skipping P2P device interface");
                continue;
            }

            let name = reply
                .require(Nl80211Attr::Ifname as u16, "NL80211_ATTR_IFNAME")?
                .string()
                .map_err(malformed("NL80211_ATTR_IFNAME"))?;
            if name.starts_with("p2p") {
                debug!(name, "skipping P2P interface");
                continue;
            }

            let index = reply
                .require(Nl80211Attr::Ifindex as u16, "NL80211_ATTR_IFINDEX")?
                .u32()
                .map_err(malformed("NL80211_ATTR_IFINDEX"))?;
            let mac = reply
                .require(Nl80211Attr::Mac as u16, "NL80211_ATTR_MAC")?
                .bytes();
            let mac_address = <[u8; 6]>::try_from(mac).map_err(|_| {
                malformed("NL80211_ATTR_MAC")(Error::InvalidAttribute(format!(
                    "MAC must be 6 bytes, got {}",
                    mac.len()
                )))
            })?;

            return Ok(InterfaceInfo {
                name: name.to_string(),
                index,
                mac_address,
            });
        }

        Err(Error::InterfaceNotFound {
            name: format!("station interface on wiphy {}", wiphy),
        })
    }

    async fn set_interface_mode(&self, ifindex: u32, mode: InterfaceMode) -> Result<()> {
        let iftype = match mode {
            InterfaceMode::Station => Nl80211Iftype::Station,
        };
        let request = Nl80211Packet::new(Nl80211Cmd::SetInterface)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex))
            .with(Attr::new_u32(Nl80211Attr::Iftype as u16, iftype as u32));

        self.transport
            .send_ack(request)
            .await
            .map_err(|e| e.with_context("SET_INTERFACE"))
    }

    async fn get_wiphy_info(
        &self,
        wiphy: u32,
    ) -> Result<(BandInfo, ScanCapabilities, WiphyFeatures)> {
        let request = Nl80211Packet::new(Nl80211Cmd::GetWiphy)
            .with(Attr::new_u32(Nl80211Attr::Wiphy as u16, wiphy))
            .with(Attr::flag(Nl80211Attr::SplitWiphyDump as u16));
        let replies = self
            .transport
            .send_dump(request)
            .await
            .map_err(|e| e.with_context("GET_WIPHY"))?;

        let merged = merge_wiphy_replies(&replies, wiphy)?;
        if merged.is_empty() {
            return Err(Error::NoWiphy);
        }

        let bands = parse_band_info(&merged)?;
        let caps = parse_scan_capabilities(&merged)?;
        let features = match find(&merged, Nl80211Attr::FeatureFlags as u16) {
            Some(attr) => WiphyFeatures::from_feature_flags(
                attr.u32().map_err(malformed("NL80211_ATTR_FEATURE_FLAGS"))?,
            ),
            None => WiphyFeatures::default(),
        };

        Ok((bands, caps, features))
    }

    async fn get_station_info(&self, ifindex: u32, mac: [u8; 6]) -> Result<StationInfo> {
        let request = Nl80211Packet::new(Nl80211Cmd::GetStation)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex))
            .with(Attr::new(Nl80211Attr::Mac as u16, mac.to_vec()));
        let replies = self
            .transport
            .send_request(request)
            .await
            .map_err(|e| e.with_context("GET_STATION"))?;

        let reply = replies
            .first()
            .ok_or_else(|| Error::NoReply("GET_STATION".into()))?;
        parse_station_info(reply)
    }

    fn subscribe_mlme_event<F>(&self, ifindex: u32, handler: F)
    where
        F: Fn(u32, &MlmeEvent) + Send + Sync + 'static,
    {
        self.registry.subscribe_mlme_event(ifindex, handler);
    }

    fn unsubscribe_mlme_event(&self, ifindex: u32) {
        self.registry.unsubscribe_mlme_event(ifindex);
    }

    fn subscribe_reg_domain_change<F>(&self, wiphy: u32, handler: F)
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        self.registry.subscribe_reg_domain_change(wiphy, handler);
    }

    fn unsubscribe_reg_domain_change(&self, wiphy: u32) {
        self.registry.unsubscribe_reg_domain_change(wiphy);
    }
}

/// Collect the top-level attributes of every reply describing `wiphy`.
///
/// A split dump spreads one wiphy over many messages; lookups on the merged
/// list see the first occurrence of each attribute.
fn merge_wiphy_replies(replies: &[Nl80211Packet], wiphy: u32) -> Result<Vec<Attr>> {
    let mut merged = Vec::new();
    for reply in replies {
        if let Some(attr) = reply.attr(Nl80211Attr::Wiphy as u16)
            && attr.u32().map_err(malformed("NL80211_ATTR_WIPHY"))? != wiphy
        {
            continue;
        }
        merged.extend(reply.attrs().iter().cloned());
    }
    Ok(merged)
}

fn push_unique(list: &mut Vec<u32>, freq: u32) {
    if !list.contains(&freq) {
        list.push(freq);
    }
}

/// Walk bands → frequencies and classify every frequency.
///
/// Radar-flagged frequencies go to `band_dfs` whatever their value.
/// Disabled frequencies are still reported.
fn parse_band_info(attrs: &[Attr]) -> Result<BandInfo> {
    let mut info = BandInfo::default();
    let mut seen_bands = false;

    for bands in attrs
        .iter()
        .filter(|a| a.kind() == Nl80211Attr::WiphyBands as u16)
    {
        seen_bands = true;
        for band in bands.nested().map_err(malformed("NL80211_ATTR_WIPHY_BANDS"))? {
            let band_attrs = band.nested().map_err(malformed("NL80211_ATTR_WIPHY_BANDS"))?;
            // Split dumps send band rates without frequencies.
            let Some(freqs) = find(&band_attrs, Nl80211BandAttr::Freqs as u16) else {
                continue;
            };

            for freq in freqs.nested().map_err(malformed("NL80211_BAND_ATTR_FREQS"))? {
                let freq_attrs = freq.nested().map_err(malformed("NL80211_BAND_ATTR_FREQS"))?;
                let mhz = require(
                    &freq_attrs,
                    Nl80211FrequencyAttr::Freq as u16,
                    "NL80211_FREQUENCY_ATTR_FREQ",
                )?
                .u32()
                .map_err(malformed("NL80211_FREQUENCY_ATTR_FREQ"))?;

                if find(&freq_attrs, Nl80211FrequencyAttr::Radar as u16).is_some() {
                    push_unique(&mut info.band_dfs, mhz);
                    continue;
                }

                match mhz {
                    2400..=2500 => push_unique(&mut info.band_2g, mhz),
                    4900..=5900 => push_unique(&mut info.band_5g, mhz),
                    5925..=7125 => push_unique(&mut info.band_6g, mhz),
                    _ => debug!(mhz, "ignoring frequency outside 2.4/5/6 GHz"),
                }
            }
        }
    }

    if !seen_bands {
        warn!(attribute = "NL80211_ATTR_WIPHY_BANDS", "reply is missing a mandatory attribute");
        return Err(Error::MissingAttribute {
            name: "NL80211_ATTR_WIPHY_BANDS",
        });
    }

    Ok(info)
}

fn optional_u32(attrs: &[Attr], kind: Nl80211Attr, name: &'static str) -> Result<u32> {
    match find(attrs, kind as u16) {
        Some(attr) => attr.u32().map_err(malformed(name)),
        None => Ok(0),
    }
}

fn required_u8(attrs: &[Attr], kind: Nl80211Attr, name: &'static str) -> Result<u8> {
    require(attrs, kind as u16, name)?
        .u8()
        .map_err(malformed(name))
}

fn parse_scan_capabilities(attrs: &[Attr]) -> Result<ScanCapabilities> {
    Ok(ScanCapabilities {
        max_num_scan_ssids: required_u8(
            attrs,
            Nl80211Attr::MaxNumScanSsids,
            "NL80211_ATTR_MAX_NUM_SCAN_SSIDS",
        )?,
        max_num_sched_scan_ssids: required_u8(
            attrs,
            Nl80211Attr::MaxNumSchedScanSsids,
            "NL80211_ATTR_MAX_NUM_SCHED_SCAN_SSIDS",
        )?,
        max_match_sets: required_u8(
            attrs,
            Nl80211Attr::MaxMatchSets,
            "NL80211_ATTR_MAX_MATCH_SETS",
        )?,
        max_num_scan_plans: optional_u32(
            attrs,
            Nl80211Attr::MaxNumSchedScanPlans,
            "NL80211_ATTR_MAX_NUM_SCHED_SCAN_PLANS",
        )?,
        max_scan_plan_interval: optional_u32(
            attrs,
            Nl80211Attr::MaxScanPlanInterval,
            "NL80211_ATTR_MAX_SCAN_PLAN_INTERVAL",
        )?,
        max_scan_plan_iterations: optional_u32(
            attrs,
            Nl80211Attr::MaxScanPlanIterations,
            "NL80211_ATTR_MAX_SCAN_PLAN_ITERATIONS",
        )?,
    })
}

fn parse_station_info(reply: &Nl80211Packet) -> Result<StationInfo> {
    let sta = reply
        .require(Nl80211Attr::StaInfo as u16, "NL80211_ATTR_STA_INFO")?
        .nested()
        .map_err(malformed("NL80211_ATTR_STA_INFO"))?;

    let tx_packets = require(&sta, Nl80211StaInfo::TxPackets as u16, "NL80211_STA_INFO_TX_PACKETS")?
        .u32()
        .map_err(malformed("NL80211_STA_INFO_TX_PACKETS"))?;
    let tx_failed = require(&sta, Nl80211StaInfo::TxFailed as u16, "NL80211_STA_INFO_TX_FAILED")?
        .u32()
        .map_err(malformed("NL80211_STA_INFO_TX_FAILED"))?;
    let signal = require(&sta, Nl80211StaInfo::Signal as u16, "NL80211_STA_INFO_SIGNAL")?
        .u8()
        .map_err(malformed("NL80211_STA_INFO_SIGNAL"))?;

    let tx_bitrate = match find(&sta, Nl80211StaInfo::TxBitrate as u16) {
        Some(attr) => {
            let rate = attr.nested().map_err(malformed("NL80211_STA_INFO_TX_BITRATE"))?;
            if let Some(r) = find(&rate, Nl80211RateInfo::Bitrate32 as u16) {
                r.u32().map_err(malformed("NL80211_RATE_INFO_BITRATE32"))?
            } else if let Some(r) = find(&rate, Nl80211RateInfo::Bitrate as u16) {
                u32::from(r.u16().map_err(malformed("NL80211_RATE_INFO_BITRATE"))?)
            } else {
                0
            }
        }
        None => 0,
    };

    Ok(StationInfo {
        station_tx_packets: tx_packets,
        station_tx_failed: tx_failed,
        station_tx_bitrate: tx_bitrate,
        current_rssi: signal as i8,
    })
}
