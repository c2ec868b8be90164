//! One-shot and scheduled scans.
//!
//! Scan completion is event driven: [`ScanControl::scan`] returns once the
//! kernel has accepted the request, and the outcome arrives later through
//! the scan-ready handler registered for the interface.

use std::future::Future;

use tracing::debug;

use super::events::EventRegistry;
use super::packet::{Attr, Nl80211Packet};
use super::scan_result::NativeScanResult;
use super::settings::SingleScanSettings;
use super::transport::Transport;
use super::types::{
    ScanEventKind, ScanType, SchedScanIntervalSetting, SchedScanPlan, SchedScanReqFlags,
};
use super::{
    MAX_SSID_LEN, Nl80211Attr, Nl80211Band, Nl80211Cmd, Nl80211ScanFlag, Nl80211SchedScanMatchAttr,
    Nl80211SchedScanPlan,
};
use crate::netlink::{Error, Result};

/// Scan lifecycle operations.
pub trait ScanControl {
    /// Trigger a one-shot scan.
    fn scan(&self, ifindex: u32, request: ScanRequest) -> impl Future<Output = Result<()>> + Send;

    fn start_scheduled_scan(
        &self,
        ifindex: u32,
        request: SchedScanRequest,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Abort a running one-shot scan. Fails if none is running.
    fn abort_scan(&self, ifindex: u32) -> impl Future<Output = Result<()>> + Send;

    /// Stop the scheduled scan. Fails if none is running.
    fn stop_scheduled_scan(&self, ifindex: u32) -> impl Future<Output = Result<()>> + Send;

    /// Current contents of the kernel scan cache.
    fn get_scan_result(
        &self,
        ifindex: u32,
    ) -> impl Future<Output = Result<Vec<NativeScanResult>>> + Send;

    fn subscribe_scan_result_notification<F>(&self, ifindex: u32, handler: F)
    where
        F: Fn(u32, ScanEventKind) + Send + Sync + 'static;

    fn unsubscribe_scan_result_notification(&self, ifindex: u32);
}

fn check_ssids(ssids: &[Vec<u8>]) -> Result<()> {
    match ssids.iter().find(|s| s.len() > MAX_SSID_LEN) {
        Some(ssid) => Err(Error::InvalidArgument(format!(
            "SSID of {} bytes exceeds {}",
            ssid.len(),
            MAX_SSID_LEN
        ))),
        None => Ok(()),
    }
}

/// Index-keyed nest, one entry per item.
fn indexed_nest<I>(kind: Nl80211Attr, items: I) -> Attr
where
    I: IntoIterator<Item = Attr>,
{
    Attr::nest(kind as u16, items)
}

fn ssid_nest(ssids: &[Vec<u8>]) -> Attr {
    indexed_nest(
        Nl80211Attr::ScanSsids,
        ssids
            .iter()
            .enumerate()
            .map(|(i, ssid)| Attr::new(i as u16, ssid.clone())),
    )
}

fn freq_nest(freqs: &[u32]) -> Attr {
    indexed_nest(
        Nl80211Attr::ScanFrequencies,
        freqs
            .iter()
            .enumerate()
            .map(|(i, &freq)| Attr::new_u32(i as u16, freq)),
    )
}

/// Parameters of a one-shot scan.
///
/// An empty SSID list requests a passive/wildcard scan; an empty frequency
/// list scans every supported channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    scan_type: i32,
    request_random_mac: bool,
    enable_6ghz_rnr: bool,
    ssids: Vec<Vec<u8>>,
    freqs: Vec<u32>,
    vendor_ies: Vec<u8>,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self::new(ScanType::default())
    }
}

impl ScanRequest {
    pub fn new(scan_type: ScanType) -> Self {
        Self {
            scan_type: scan_type.as_raw(),
            request_random_mac: false,
            enable_6ghz_rnr: false,
            ssids: Vec::new(),
            freqs: Vec::new(),
            vendor_ies: Vec::new(),
        }
    }

    /// Set the scan type from an unchecked value; it is validated when the
    /// scan is started.
    pub fn raw_scan_type(mut self, raw: i32) -> Self {
        self.scan_type = raw;
        self
    }

    pub fn request_random_mac(mut self, enabled: bool) -> Self {
        self.request_random_mac = enabled;
        self
    }

    /// Also discover 6 GHz APs through reduced neighbor reports.
    pub fn enable_6ghz_rnr(mut self, enabled: bool) -> Self {
        self.enable_6ghz_rnr = enabled;
        self
    }

    pub fn ssid(mut self, ssid: impl Into<Vec<u8>>) -> Self {
        self.ssids.push(ssid.into());
        self
    }

    pub fn freq(mut self, mhz: u32) -> Self {
        self.freqs.push(mhz);
        self
    }

    pub fn freqs(mut self, mhz: impl IntoIterator<Item = u32>) -> Self {
        self.freqs.extend(mhz);
        self
    }

    pub fn vendor_ies(mut self, ies: Vec<u8>) -> Self {
        self.vendor_ies = ies;
        self
    }

    /// Build a request from the settings object handed over by the
    /// framework: channels become frequencies, hidden networks become
    /// actively scanned SSIDs. A negative channel frequency is rejected.
    pub fn from_settings(settings: &SingleScanSettings, request_random_mac: bool) -> Result<Self> {
        let freqs = settings
            .channel_settings
            .iter()
            .map(|c| {
                u32::try_from(c.frequency).map_err(|_| {
                    Error::InvalidArgument(format!("negative channel frequency {}", c.frequency))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            scan_type: settings.scan_type.as_raw(),
            request_random_mac,
            enable_6ghz_rnr: settings.enable_6ghz_rnr,
            ssids: settings
                .hidden_networks
                .iter()
                .map(|n| n.ssid.clone())
                .collect(),
            freqs,
            vendor_ies: settings.vendor_ies.clone(),
        })
    }

    /// Validate and encode. Nothing is sent when this fails.
    pub fn to_packet(&self, ifindex: u32) -> Result<Nl80211Packet> {
        let scan_type = ScanType::from_raw(self.scan_type)?;
        check_ssids(&self.ssids)?;

        let mut packet = Nl80211Packet::new(Nl80211Cmd::TriggerScan)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex));

        if !self.ssids.is_empty() {
            packet.push(ssid_nest(&self.ssids));
        }
        if !self.freqs.is_empty() {
            packet.push(freq_nest(&self.freqs));
        }
        if !self.vendor_ies.is_empty() {
            packet.push(Attr::new(Nl80211Attr::Ie as u16, self.vendor_ies.clone()));
        }

        let mut flags = scan_type.scan_flag();
        if self.request_random_mac {
            flags |= Nl80211ScanFlag::RandomAddr as u32;
        }
        if self.enable_6ghz_rnr {
            flags |= Nl80211ScanFlag::Colocated6Ghz as u32;
        }
        packet.push(Attr::new_u32(Nl80211Attr::ScanFlags as u16, flags));

        Ok(packet)
    }
}

/// Parameters of a scheduled scan.
///
/// `scan_ssids` are actively scanned for; `match_ssids` restrict which networks
/// are reported. Without match SSIDs a single match set carrying only the
/// RSSI thresholds is sent, so every network above them is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedScanRequest {
    interval: SchedScanIntervalSetting,
    rssi_threshold_2g: i32,
    rssi_threshold_5g: i32,
    rssi_threshold_6g: i32,
    flags: SchedScanReqFlags,
    scan_ssids: Vec<Vec<u8>>,
    match_ssids: Vec<Vec<u8>>,
    freqs: Vec<u32>,
}

impl SchedScanRequest {
    pub fn new(interval: SchedScanIntervalSetting) -> Self {
        Self {
            interval,
            rssi_threshold_2g: 0,
            rssi_threshold_5g: 0,
            rssi_threshold_6g: 0,
            flags: SchedScanReqFlags::default(),
            scan_ssids: Vec::new(),
            match_ssids: Vec::new(),
            freqs: Vec::new(),
        }
    }

    /// Per-band minimum RSSI (dBm) for reported networks.
    pub fn rssi_thresholds(mut self, band_2g: i32, band_5g: i32, band_6g: i32) -> Self {
        self.rssi_threshold_2g = band_2g;
        self.rssi_threshold_5g = band_5g;
        self.rssi_threshold_6g = band_6g;
        self
    }

    pub fn flags(mut self, flags: SchedScanReqFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn scan_ssid(mut self, ssid: impl Into<Vec<u8>>) -> Self {
        self.scan_ssids.push(ssid.into());
        self
    }

    pub fn match_ssid(mut self, ssid: impl Into<Vec<u8>>) -> Self {
        self.match_ssids.push(ssid.into());
        self
    }

    pub fn freqs(mut self, mhz: impl IntoIterator<Item = u32>) -> Self {
        self.freqs.extend(mhz);
        self
    }

    fn check_interval(&self) -> Result<()> {
        let interval = &self.interval;
        if interval.final_interval_ms == 0 {
            return Err(Error::InvalidArgument(
                "scheduled scan interval must be non-zero".into(),
            ));
        }
        if interval.plans.is_empty() {
            return Ok(());
        }

        // Plans are expressed in whole seconds.
        let bad_plan = interval
            .plans
            .iter()
            .any(|p| p.interval_ms < 1000 || p.n_iterations == 0);
        if bad_plan || interval.final_interval_ms < 1000 {
            return Err(Error::InvalidArgument(
                "scan plans need intervals of at least 1s and a non-zero iteration count".into(),
            ));
        }
        Ok(())
    }

    fn match_set(&self, index: u16, ssid: Option<&[u8]>) -> Attr {
        let mut attrs = Vec::with_capacity(3);
        if let Some(ssid) = ssid {
            attrs.push(Attr::new(Nl80211SchedScanMatchAttr::Ssid as u16, ssid.to_vec()));
        }
        attrs.push(Attr::new_i32(
            Nl80211SchedScanMatchAttr::Rssi as u16,
            self.rssi_threshold_5g,
        ));
        attrs.push(Attr::nest(
            Nl80211SchedScanMatchAttr::PerBandRssi as u16,
            [
                Attr::new_i32(Nl80211Band::Band2Ghz as u16, self.rssi_threshold_2g),
                Attr::new_i32(Nl80211Band::Band5Ghz as u16, self.rssi_threshold_5g),
                Attr::new_i32(Nl80211Band::Band6Ghz as u16, self.rssi_threshold_6g),
            ],
        ));
        Attr::nest(index, attrs)
    }

    fn plan_nest(plans: &[SchedScanPlan], final_interval_ms: u32) -> Attr {
        let mut entries: Vec<Attr> = plans
            .iter()
            .enumerate()
            .map(|(i, plan)| {
                Attr::nest(
                    i as u16 + 1,
                    [
                        Attr::new_u32(Nl80211SchedScanPlan::Interval as u16, plan.interval_ms / 1000),
                        Attr::new_u32(Nl80211SchedScanPlan::Iterations as u16, plan.n_iterations),
                    ],
                )
            })
            .collect();
        // The last plan runs forever and carries no iteration count.
        entries.push(Attr::nest(
            plans.len() as u16 + 1,
            [Attr::new_u32(
                Nl80211SchedScanPlan::Interval as u16,
                final_interval_ms / 1000,
            )],
        ));
        Attr::nest(Nl80211Attr::SchedScanPlans as u16, entries)
    }

    /// Validate and encode. Nothing is sent when this fails.
    pub fn to_packet(&self, ifindex: u32) -> Result<Nl80211Packet> {
        check_ssids(&self.scan_ssids)?;
        check_ssids(&self.match_ssids)?;
        self.check_interval()?;

        let mut packet = Nl80211Packet::new(Nl80211Cmd::StartSchedScan)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex));

        if !self.scan_ssids.is_empty() {
            packet.push(ssid_nest(&self.scan_ssids));
        }

        let match_sets: Vec<Attr> = if self.match_ssids.is_empty() {
            vec![self.match_set(0, None)]
        } else {
            self.match_ssids
                .iter()
                .enumerate()
                .map(|(i, ssid)| self.match_set(i as u16, Some(ssid)))
                .collect()
        };
        packet.push(indexed_nest(Nl80211Attr::SchedScanMatch, match_sets));

        if self.interval.plans.is_empty() {
            packet.push(Attr::new_u32(
                Nl80211Attr::SchedScanInterval as u16,
                self.interval.final_interval_ms,
            ));
        } else {
            packet.push(Self::plan_nest(
                &self.interval.plans,
                self.interval.final_interval_ms,
            ));
        }

        if !self.freqs.is_empty() {
            packet.push(freq_nest(&self.freqs));
        }

        let mut flags = 0;
        if self.flags.request_random_mac {
            flags |= Nl80211ScanFlag::RandomAddr as u32;
        }
        if self.flags.request_low_power {
            flags |= Nl80211ScanFlag::LowPower as u32;
        }
        if flags != 0 {
            packet.push(Attr::new_u32(Nl80211Attr::ScanFlags as u16, flags));
        }

        if self.flags.request_sched_scan_relative_rssi {
            packet.push(Attr::new_u8(Nl80211Attr::SchedScanRelativeRssi as u16, 0));
        }

        Ok(packet)
    }
}

/// [`ScanControl`] over an nl80211 [`Transport`].
pub struct ScanUtils<'a, T> {
    transport: &'a T,
    registry: &'a EventRegistry,
}

impl<'a, T: Transport + Sync> ScanUtils<'a, T> {
    pub fn new(transport: &'a T, registry: &'a EventRegistry) -> Self {
        Self {
            transport,
            registry,
        }
    }
}

impl<T: Transport + Sync> ScanControl for ScanUtils<'_, T> {
    async fn scan(&self, ifindex: u32, request: ScanRequest) -> Result<()> {
        let packet = request.to_packet(ifindex)?;
        debug!(ifindex, ssids = request.ssids.len(), freqs = request.freqs.len(), "triggering scan");
        self.transport
            .send_ack(packet)
            .await
            .map_err(|e| e.with_context("TRIGGER_SCAN"))
    }

    async fn start_scheduled_scan(&self, ifindex: u32, request: SchedScanRequest) -> Result<()> {
        let packet = request.to_packet(ifindex)?;
        debug!(
            ifindex,
            match_sets = request.match_ssids.len(),
            plans = request.interval.plans.len(),
            "starting scheduled scan"
        );
        self.transport
            .send_ack(packet)
            .await
            .map_err(|e| e.with_context("START_SCHED_SCAN"))
    }

    async fn abort_scan(&self, ifindex: u32) -> Result<()> {
        let packet = Nl80211Packet::new(Nl80211Cmd::AbortScan)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex));
        self.transport
            .send_ack(packet)
            .await
            .map_err(|e| e.with_context("ABORT_SCAN"))
    }

    async fn stop_scheduled_scan(&self, ifindex: u32) -> Result<()> {
        let packet = Nl80211Packet::new(Nl80211Cmd::StopSchedScan)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex));
        self.transport
            .send_ack(packet)
            .await
            .map_err(|e| e.with_context("STOP_SCHED_SCAN"))
    }

    async fn get_scan_result(&self, ifindex: u32) -> Result<Vec<NativeScanResult>> {
        let packet = Nl80211Packet::new(Nl80211Cmd::GetScan)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex));
        let replies = self
            .transport
            .send_dump(packet)
            .await
            .map_err(|e| e.with_context("GET_SCAN"))?;

        let results = replies
            .iter()
            .map(NativeScanResult::from_packet)
            .collect::<Result<Vec<_>>>()?;
        debug!(ifindex, count = results.len(), "scan results");
        Ok(results)
    }

    fn subscribe_scan_result_notification<F>(&self, ifindex: u32, handler: F)
    where
        F: Fn(u32, ScanEventKind) + Send + Sync + 'static,
    {
        self.registry
            .subscribe_scan_result_notification(ifindex, handler);
    }

    fn unsubscribe_scan_result_notification(&self, ifindex: u32) {
        self.registry.unsubscribe_scan_result_notification(ifindex);
    }
}
