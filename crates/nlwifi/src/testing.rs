//! In-memory doubles for tests.
//!
//! [`MockTransport`] records every request and answers from a queue of
//! scripted replies; [`FakeScanControl`] stands in for [`ScanUtils`]
//! in code that only needs the [`ScanControl`] capability.
//!
//! Enabled in this crate's tests and, for downstream crates, through the
//! `testing` feature.
//!
//! [`ScanUtils`]: crate::nl80211::ScanUtils

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::netlink::{Error, Result};
use crate::nl80211::{
    Attr, EventListener, EventRegistry, NativeScanResult, Nl80211Attr, Nl80211Cmd,
    Nl80211Packet, ScanControl, ScanEventKind, ScanRequest, SchedScanRequest, Transport,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted [`Transport`].
///
/// Replies are consumed in order, one per request. With the queue empty,
/// requests and dumps get no packets and ACK requests succeed.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<Nl80211Packet>>,
    replies: Mutex<VecDeque<Result<Vec<Nl80211Packet>>>>,
    listeners: Mutex<Vec<Arc<dyn EventListener>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the packets answering the next request.
    pub fn push_reply(&self, packets: Vec<Nl80211Packet>) {
        lock(&self.replies).push_back(Ok(packets));
    }

    /// Queue a kernel rejection (positive errno) for the next request.
    pub fn push_errno(&self, errno: i32) {
        lock(&self.replies).push_back(Err(Error::from_errno(-errno)));
    }

    /// Queue an arbitrary failure for the next request.
    pub fn push_error(&self, error: Error) {
        lock(&self.replies).push_back(Err(error));
    }

    /// Every request sent so far, oldest first.
    pub fn sent(&self) -> Vec<Nl80211Packet> {
        lock(&self.sent).clone()
    }

    pub fn last_sent(&self) -> Option<Nl80211Packet> {
        lock(&self.sent).last().cloned()
    }

    /// Deliver a multicast packet to the registered listeners.
    pub fn emit(&self, packet: &Nl80211Packet) {
        let listeners = lock(&self.listeners).clone();
        for listener in listeners {
            listener.on_event(packet);
        }
    }

    fn answer(&self, packet: Nl80211Packet) -> Result<Vec<Nl80211Packet>> {
        lock(&self.sent).push(packet);
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl Transport for MockTransport {
    async fn send_request(&self, packet: Nl80211Packet) -> Result<Vec<Nl80211Packet>> {
        self.answer(packet)
    }

    async fn send_dump(&self, packet: Nl80211Packet) -> Result<Vec<Nl80211Packet>> {
        self.answer(packet)
    }

    async fn send_ack(&self, packet: Nl80211Packet) -> Result<()> {
        self.answer(packet).map(|_| ())
    }

    fn register_event_listener(&self, listener: Arc<dyn EventListener>) {
        lock(&self.listeners).push(listener);
    }
}

/// A call recorded by [`FakeScanControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCall {
    Scan(u32, ScanRequest),
    StartScheduledScan(u32, SchedScanRequest),
    AbortScan(u32),
    StopScheduledScan(u32),
    GetScanResult(u32),
}

/// [`ScanControl`] that records calls and reports canned results.
#[derive(Default)]
pub struct FakeScanControl {
    registry: EventRegistry,
    calls: Mutex<Vec<ScanCall>>,
    results: Mutex<Vec<NativeScanResult>>,
    busy: Mutex<bool>,
}

impl FakeScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results returned by `get_scan_result`.
    pub fn set_results(&self, results: Vec<NativeScanResult>) {
        *lock(&self.results) = results;
    }

    /// Make scan starts fail with EBUSY, as when a scan is already running.
    pub fn set_busy(&self, busy: bool) {
        *lock(&self.busy) = busy;
    }

    pub fn calls(&self) -> Vec<ScanCall> {
        lock(&self.calls).clone()
    }

    /// Notify the scan-ready handler of `ifindex`, as the kernel would.
    pub fn notify(&self, ifindex: u32, kind: ScanEventKind) {
        let cmd = match kind {
            ScanEventKind::Completed => Nl80211Cmd::NewScanResults,
            ScanEventKind::Aborted => Nl80211Cmd::ScanAborted,
            ScanEventKind::ScheduledResults => Nl80211Cmd::SchedScanResults,
            ScanEventKind::ScheduledStopped => Nl80211Cmd::SchedScanStopped,
        };
        self.registry.dispatch(
            &Nl80211Packet::new(cmd).with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex)),
        );
    }

    fn record(&self, call: ScanCall) {
        lock(&self.calls).push(call);
    }

    fn start(&self, call: ScanCall) -> Result<()> {
        self.record(call);
        if *lock(&self.busy) {
            return Err(Error::from_errno(-libc::EBUSY));
        }
        Ok(())
    }
}

impl ScanControl for FakeScanControl {
    async fn scan(&self, ifindex: u32, request: ScanRequest) -> Result<()> {
        // Validate exactly like the real controller.
        request.to_packet(ifindex)?;
        self.start(ScanCall::Scan(ifindex, request))
    }

    async fn start_scheduled_scan(&self, ifindex: u32, request: SchedScanRequest) -> Result<()> {
        request.to_packet(ifindex)?;
        self.start(ScanCall::StartScheduledScan(ifindex, request))
    }

    async fn abort_scan(&self, ifindex: u32) -> Result<()> {
        self.record(ScanCall::AbortScan(ifindex));
        Ok(())
    }

    async fn stop_scheduled_scan(&self, ifindex: u32) -> Result<()> {
        self.record(ScanCall::StopScheduledScan(ifindex));
        Ok(())
    }

    async fn get_scan_result(&self, ifindex: u32) -> Result<Vec<NativeScanResult>> {
        self.record(ScanCall::GetScanResult(ifindex));
        Ok(lock(&self.results).clone())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let mock = MockTransport::new();
        mock.push_reply(vec![Nl80211Packet::new(Nl80211Cmd::NewWiphy)]);
        mock.push_errno(libc::EBUSY);

        let first = mock
            .send_dump(Nl80211Packet::new(Nl80211Cmd::GetWiphy))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let err = mock
            .send_ack(Nl80211Packet::new(Nl80211Cmd::TriggerScan))
            .await
            .unwrap_err();
        assert!(err.is_busy());

        // Queue drained: ACKs succeed.
        mock.send_ack(Nl80211Packet::new(Nl80211Cmd::AbortScan))
            .await
            .unwrap();
        assert_eq!(mock.sent().len(), 3);
    }
}
