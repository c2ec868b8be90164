//! Event subscription registry and dispatch.
//!
//! Three independent tables map an interface or wiphy index to a single
//! handler: link-management (MLME) events and scan-ready notifications are
//! keyed by interface index, regulatory domain changes by wiphy index.
//! Subscribing again under the same key replaces the previous handler.
//!
//! Handlers are stored as `Arc`s. Dispatch clones the handle under the read
//! lock and calls it after the lock is released, so a handler may subscribe
//! or unsubscribe from inside the callback, and an unsubscribe racing with a
//! dispatch never frees a handler that is still running.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace, warn};

use super::packet::{Nl80211Packet, malformed};
use super::transport::EventListener;
use super::types::{MlmeEvent, ScanEventKind};
use super::{Nl80211Attr, Nl80211Cmd, Nl80211RegType};
use crate::netlink::{Error, Result};

/// Handler for link-management events: `(ifindex, event)`.
pub type MlmeHandler = Arc<dyn Fn(u32, &MlmeEvent) + Send + Sync>;

/// Handler for scan-ready notifications: `(ifindex, kind)`.
pub type ScanResultHandler = Arc<dyn Fn(u32, ScanEventKind) + Send + Sync>;

/// Handler for regulatory domain changes: `(wiphy, country code)`.
pub type RegDomainHandler = Arc<dyn Fn(u32, &str) + Send + Sync>;

/// Country code reported for the world regulatory domain.
const WORLD_ALPHA2: &str = "00";

/// 802.11 management header: frame control, duration, three addresses, seq.
const MGMT_HDR_LEN: usize = 24;
const MGMT_BSSID_OFFSET: usize = 16;

#[derive(Default)]
pub struct EventRegistry {
    mlme: RwLock<HashMap<u32, MlmeHandler>>,
    scan: RwLock<HashMap<u32, ScanResultHandler>>,
    reg: RwLock<HashMap<u32, RegDomainHandler>>,
}

fn insert_or_replace<H>(table: &RwLock<HashMap<u32, H>>, index: u32, handler: H, class: &str) {
    let previous = table
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(index, handler);
    if previous.is_some() {
        debug!(index, class, "replaced event handler");
    }
}

fn remove<H>(table: &RwLock<HashMap<u32, H>>, index: u32) {
    table
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&index);
}

fn lookup<H: Clone>(table: &RwLock<HashMap<u32, H>>, index: u32) -> Option<H> {
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&index)
        .cloned()
}

fn contains<H>(table: &RwLock<HashMap<u32, H>>, index: u32) -> bool {
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(&index)
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_mlme_event<F>(&self, ifindex: u32, handler: F)
    where
        F: Fn(u32, &MlmeEvent) + Send + Sync + 'static,
    {
        insert_or_replace(&self.mlme, ifindex, Arc::new(handler) as MlmeHandler, "mlme");
    }

    pub fn unsubscribe_mlme_event(&self, ifindex: u32) {
        remove(&self.mlme, ifindex);
    }

    pub fn subscribe_scan_result_notification<F>(&self, ifindex: u32, handler: F)
    where
        F: Fn(u32, ScanEventKind) + Send + Sync + 'static,
    {
        insert_or_replace(
            &self.scan,
            ifindex,
            Arc::new(handler) as ScanResultHandler,
            "scan",
        );
    }

    pub fn unsubscribe_scan_result_notification(&self, ifindex: u32) {
        remove(&self.scan, ifindex);
    }

    pub fn subscribe_reg_domain_change<F>(&self, wiphy: u32, handler: F)
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        insert_or_replace(&self.reg, wiphy, Arc::new(handler) as RegDomainHandler, "reg");
    }

    pub fn unsubscribe_reg_domain_change(&self, wiphy: u32) {
        remove(&self.reg, wiphy);
    }

    pub fn has_mlme_handler(&self, ifindex: u32) -> bool {
        contains(&self.mlme, ifindex)
    }

    pub fn has_scan_handler(&self, ifindex: u32) -> bool {
        contains(&self.scan, ifindex)
    }

    pub fn has_reg_handler(&self, wiphy: u32) -> bool {
        contains(&self.reg, wiphy)
    }

    /// Route one event packet to its handler.
    ///
    /// Packets for unsubscribed indices and commands that are not events are
    /// dropped. A packet whose payload cannot be decoded is logged and
    /// dropped; the registry itself is never affected.
    pub fn dispatch(&self, packet: &Nl80211Packet) {
        let Some(cmd) = packet.command() else {
            trace!(cmd = packet.cmd(), "ignoring unknown nl80211 command");
            return;
        };

        let result = match cmd {
            Nl80211Cmd::Connect
            | Nl80211Cmd::Associate
            | Nl80211Cmd::Roam
            | Nl80211Cmd::Disconnect
            | Nl80211Cmd::Disassociate
            | Nl80211Cmd::Deauthenticate => self.dispatch_mlme(cmd, packet),
            Nl80211Cmd::NewScanResults => self.dispatch_scan(ScanEventKind::Completed, packet),
            Nl80211Cmd::ScanAborted => self.dispatch_scan(ScanEventKind::Aborted, packet),
            Nl80211Cmd::SchedScanResults => {
                self.dispatch_scan(ScanEventKind::ScheduledResults, packet)
            }
            Nl80211Cmd::SchedScanStopped => {
                self.dispatch_scan(ScanEventKind::ScheduledStopped, packet)
            }
            Nl80211Cmd::RegChange | Nl80211Cmd::WiphyRegChange => self.dispatch_reg(packet),
            Nl80211Cmd::DelInterface => self.prune_interface(packet),
            other => {
                trace!(?other, "not an event command");
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(?cmd, error = %e, "dropping undecodable nl80211 event");
        }
    }

    fn dispatch_mlme(&self, cmd: Nl80211Cmd, packet: &Nl80211Packet) -> Result<()> {
        let ifindex = ifindex_of(packet)?;
        let Some(handler) = lookup(&self.mlme, ifindex) else {
            trace!(ifindex, ?cmd, "no mlme handler");
            return Ok(());
        };

        let event = decode_mlme(cmd, packet)?;
        handler(ifindex, &event);
        Ok(())
    }

    fn dispatch_scan(&self, kind: ScanEventKind, packet: &Nl80211Packet) -> Result<()> {
        let ifindex = ifindex_of(packet)?;
        let Some(handler) = lookup(&self.scan, ifindex) else {
            trace!(ifindex, ?kind, "no scan handler");
            return Ok(());
        };

        handler(ifindex, kind);
        Ok(())
    }

    fn dispatch_reg(&self, packet: &Nl80211Packet) -> Result<()> {
        let Some(alpha2) = decode_reg_domain(packet)? else {
            return Ok(());
        };

        match packet.attr(Nl80211Attr::Wiphy as u16) {
            Some(attr) => {
                let wiphy = attr.u32().map_err(malformed("NL80211_ATTR_WIPHY"))?;
                match lookup(&self.reg, wiphy) {
                    Some(handler) => handler(wiphy, &alpha2),
                    None => trace!(wiphy, "no regulatory handler"),
                }
            }
            None => {
                // Global change: every radio follows it.
                let handlers: Vec<_> = self
                    .reg
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .map(|(wiphy, handler)| (*wiphy, handler.clone()))
                    .collect();
                for (wiphy, handler) in handlers {
                    handler(wiphy, &alpha2);
                }
            }
        }
        Ok(())
    }

    fn prune_interface(&self, packet: &Nl80211Packet) -> Result<()> {
        let ifindex = ifindex_of(packet)?;
        if contains(&self.mlme, ifindex) || contains(&self.scan, ifindex) {
            debug!(ifindex, "interface removed, dropping its event handlers");
        }
        remove(&self.mlme, ifindex);
        remove(&self.scan, ifindex);
        Ok(())
    }
}

impl EventListener for EventRegistry {
    fn on_event(&self, packet: &Nl80211Packet) {
        self.dispatch(packet);
    }
}

fn ifindex_of(packet: &Nl80211Packet) -> Result<u32> {
    packet
        .require(Nl80211Attr::Ifindex as u16, "NL80211_ATTR_IFINDEX")?
        .u32()
        .map_err(malformed("NL80211_ATTR_IFINDEX"))
}

fn mac_of(packet: &Nl80211Packet) -> Result<Option<[u8; 6]>> {
    packet
        .attr(Nl80211Attr::Mac as u16)
        .map(|attr| {
            <[u8; 6]>::try_from(attr.bytes()).map_err(|_| {
                malformed("NL80211_ATTR_MAC")(Error::InvalidAttribute(format!(
                    "MAC must be 6 bytes, got {}",
                    attr.bytes().len()
                )))
            })
        })
        .transpose()
}

fn u16_of(packet: &Nl80211Packet, kind: Nl80211Attr, name: &'static str) -> Result<Option<u16>> {
    packet
        .attr(kind as u16)
        .map(|attr| attr.u16().map_err(malformed(name)))
        .transpose()
}

/// Management frame carried in `NL80211_ATTR_FRAME`, at least `min_len` long.
fn frame_of(packet: &Nl80211Packet, min_len: usize) -> Result<&[u8]> {
    let frame = packet
        .require(Nl80211Attr::Frame as u16, "NL80211_ATTR_FRAME")?
        .bytes();
    if frame.len() < min_len {
        return Err(malformed("NL80211_ATTR_FRAME")(Error::InvalidAttribute(
            format!("frame is {} bytes, need {}", frame.len(), min_len),
        )));
    }
    Ok(frame)
}

fn frame_bssid(frame: &[u8]) -> Option<[u8; 6]> {
    frame
        .get(MGMT_BSSID_OFFSET..MGMT_BSSID_OFFSET + 6)
        .and_then(|b| b.try_into().ok())
}

/// Little-endian u16 from a frame body (802.11 fields are little endian).
fn frame_u16(frame: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([frame[offset], frame[offset + 1]])
}

fn decode_mlme(cmd: Nl80211Cmd, packet: &Nl80211Packet) -> Result<MlmeEvent> {
    let timed_out = packet.attr(Nl80211Attr::TimedOut as u16).is_some();

    Ok(match cmd {
        Nl80211Cmd::Connect => {
            let status = u16_of(packet, Nl80211Attr::StatusCode, "NL80211_ATTR_STATUS_CODE")?;
            let status_code = match (status, timed_out) {
                (Some(code), _) => code,
                (None, true) => 0,
                (None, false) => {
                    return Err(Error::MissingAttribute {
                        name: "NL80211_ATTR_STATUS_CODE",
                    });
                }
            };
            MlmeEvent::Connect {
                bssid: mac_of(packet)?,
                status_code,
                timed_out,
            }
        }
        Nl80211Cmd::Associate if timed_out => MlmeEvent::Associate {
            bssid: mac_of(packet)?,
            status_code: 0,
            timed_out: true,
        },
        Nl80211Cmd::Associate => {
            // Association response body: capability, status code, AID.
            let frame = frame_of(packet, MGMT_HDR_LEN + 4)?;
            MlmeEvent::Associate {
                bssid: frame_bssid(frame),
                status_code: frame_u16(frame, MGMT_HDR_LEN + 2),
                timed_out: false,
            }
        }
        Nl80211Cmd::Roam => MlmeEvent::Roam {
            bssid: mac_of(packet)?,
        },
        Nl80211Cmd::Disconnect => MlmeEvent::Disconnect {
            reason_code: u16_of(packet, Nl80211Attr::ReasonCode, "NL80211_ATTR_REASON_CODE")?
                .unwrap_or(0),
            by_ap: packet.attr(Nl80211Attr::DisconnectedByAp as u16).is_some(),
        },
        Nl80211Cmd::Disassociate | Nl80211Cmd::Deauthenticate => {
            // Body starts with the reason code.
            let frame = frame_of(packet, MGMT_HDR_LEN + 2)?;
            let bssid = frame_bssid(frame);
            let reason_code = frame_u16(frame, MGMT_HDR_LEN);
            if cmd == Nl80211Cmd::Disassociate {
                MlmeEvent::Disassociate { bssid, reason_code }
            } else {
                MlmeEvent::Deauthenticate { bssid, reason_code }
            }
        }
        other => {
            return Err(Error::InvalidMessage(format!(
                "{:?} is not a link-management event",
                other
            )));
        }
    })
}

/// Country code of a regulatory change, or `None` for domains that have no
/// country code to report.
fn decode_reg_domain(packet: &Nl80211Packet) -> Result<Option<String>> {
    let reg_type = packet
        .require(Nl80211Attr::RegType as u16, "NL80211_ATTR_REG_TYPE")?
        .u8()
        .map_err(malformed("NL80211_ATTR_REG_TYPE"))?;

    match reg_type {
        t if t == Nl80211RegType::Country as u8 => {
            let alpha2 = packet
                .require(Nl80211Attr::RegAlpha2 as u16, "NL80211_ATTR_REG_ALPHA2")?
                .string()
                .map_err(malformed("NL80211_ATTR_REG_ALPHA2"))?;
            Ok(Some(alpha2.to_string()))
        }
        t if t == Nl80211RegType::World as u8 => Ok(Some(WORLD_ALPHA2.to_string())),
        other => {
            debug!(reg_type = other, "ignoring regulatory change without a country code");
            Ok(None)
        }
    }
}
