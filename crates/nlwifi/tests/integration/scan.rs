//! One-shot and scheduled scans, scan results.

use nlwifi::Result;
use nlwifi::nl80211::{
    ChannelSettings, EventRegistry, HiddenNetwork, Nl80211Attr, Nl80211Cmd, Nl80211ScanFlag,
    Nl80211SchedScanMatchAttr, ScanControl, ScanEventKind, ScanRequest, ScanType, ScanUtils,
    SchedScanIntervalSetting, SchedScanPlan, SchedScanRequest, SingleScanSettings,
};
use nlwifi::testing::{FakeScanControl, MockTransport, ScanCall};

use crate::common::{BSSID, IFINDEX, bss_reply};

fn interval(final_interval_ms: u32) -> SchedScanIntervalSetting {
    SchedScanIntervalSetting {
        plans: Vec::new(),
        final_interval_ms,
    }
}

#[tokio::test]
async fn test_scan_from_framework_settings() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);

    let settings = SingleScanSettings {
        scan_type: ScanType::HighAccuracy,
        enable_6ghz_rnr: true,
        channel_settings: vec![ChannelSettings { frequency: 2412 }],
        hidden_networks: vec![HiddenNetwork {
            ssid: b"hidden".to_vec(),
        }],
        vendor_ies: Vec::new(),
    };
    // The settings cross a process boundary before reaching the scanner.
    let settings = SingleScanSettings::decode(&settings.encode())?;

    scanner
        .scan(IFINDEX, ScanRequest::from_settings(&settings, false)?)
        .await?;

    let sent = mock.last_sent().unwrap();
    assert_eq!(sent.command(), Some(Nl80211Cmd::TriggerScan));
    assert_eq!(sent.attr(Nl80211Attr::Ifindex as u16).unwrap().u32()?, IFINDEX);

    let ssids = sent.attr(Nl80211Attr::ScanSsids as u16).unwrap().nested()?;
    assert_eq!(ssids.len(), 1);
    assert_eq!(ssids[0].bytes(), b"hidden");

    let freqs = sent
        .attr(Nl80211Attr::ScanFrequencies as u16)
        .unwrap()
        .nested()?;
    assert_eq!(freqs[0].u32()?, 2412);

    let flags = sent.attr(Nl80211Attr::ScanFlags as u16).unwrap().u32()?;
    assert_ne!(flags & Nl80211ScanFlag::HighAccuracy as u32, 0);
    assert_ne!(flags & Nl80211ScanFlag::Colocated6Ghz as u32, 0);
    assert_eq!(flags & Nl80211ScanFlag::RandomAddr as u32, 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_scan_type_is_never_sent() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);

    let err = scanner
        .scan(
            IFINDEX,
            ScanRequest::new(ScanType::LowPower).raw_scan_type(7),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, nlwifi::Error::InvalidScanType(7)));
    assert!(err.is_invalid_argument());
    assert!(mock.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_oversized_ssid_is_never_sent() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);

    let request = SchedScanRequest::new(interval(10_000)).match_ssid(vec![b'x'; 33]);
    let err = scanner
        .start_scheduled_scan(IFINDEX, request)
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(mock.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_busy_scan_reports_errno() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);
    mock.push_errno(libc::EBUSY);

    let err = scanner
        .scan(IFINDEX, ScanRequest::new(ScanType::LowSpan))
        .await
        .unwrap_err();

    assert!(err.is_busy());
    assert_eq!(err.errno(), Some(libc::EBUSY));
    assert_eq!(mock.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_sched_scan_single_match_ssid() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);

    let request = SchedScanRequest::new(interval(20_000))
        .rssi_thresholds(-80, -77, -75)
        .match_ssid("home");
    scanner.start_scheduled_scan(IFINDEX, request).await?;

    let sent = mock.last_sent().unwrap();
    assert_eq!(sent.command(), Some(Nl80211Cmd::StartSchedScan));
    assert!(sent.attr(Nl80211Attr::ScanSsids as u16).is_none());
    assert!(sent.attr(Nl80211Attr::ScanFlags as u16).is_none());
    assert_eq!(
        sent.attr(Nl80211Attr::SchedScanInterval as u16)
            .unwrap()
            .u32()?,
        20_000
    );

    let sets = sent
        .attr(Nl80211Attr::SchedScanMatch as u16)
        .unwrap()
        .nested()?;
    assert_eq!(sets.len(), 1);
    let set = sets[0].nested()?;
    let ssid = set
        .iter()
        .find(|a| a.kind() == Nl80211SchedScanMatchAttr::Ssid as u16)
        .unwrap();
    assert_eq!(ssid.bytes(), b"home");
    let rssi = set
        .iter()
        .find(|a| a.kind() == Nl80211SchedScanMatchAttr::Rssi as u16)
        .unwrap();
    assert_eq!(rssi.i32()?, -77);
    Ok(())
}

#[tokio::test]
async fn test_sched_scan_with_plans() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);

    let request = SchedScanRequest::new(SchedScanIntervalSetting {
        plans: vec![SchedScanPlan {
            interval_ms: 10_000,
            n_iterations: 3,
        }],
        final_interval_ms: 60_000,
    });
    scanner.start_scheduled_scan(IFINDEX, request).await?;

    let sent = mock.last_sent().unwrap();
    assert!(sent.attr(Nl80211Attr::SchedScanInterval as u16).is_none());
    let plans = sent
        .attr(Nl80211Attr::SchedScanPlans as u16)
        .unwrap()
        .nested()?;
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[1].kind(), 2);
    assert_eq!(plans[1].nested()?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_abort_and_stop() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);

    scanner.abort_scan(IFINDEX).await?;
    mock.push_errno(libc::ENOENT);
    let err = scanner.stop_scheduled_scan(IFINDEX).await.unwrap_err();
    assert!(err.is_not_found());

    let commands: Vec<_> = mock.sent().iter().map(|p| p.command()).collect();
    assert_eq!(
        commands,
        vec![Some(Nl80211Cmd::AbortScan), Some(Nl80211Cmd::StopSchedScan)]
    );
    Ok(())
}

#[tokio::test]
async fn test_scan_results() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let scanner = ScanUtils::new(&mock, &registry);
    mock.push_reply(vec![
        bss_reply(BSSID, b"lab", 2437, -4500),
        bss_reply([0x02, 0, 0, 0, 0, 0x09], b"", 5180, -8000),
    ]);

    let results = scanner.get_scan_result(IFINDEX).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].bssid, BSSID);
    assert_eq!(results[0].ssid, b"lab");
    assert_eq!(results[0].frequency, 2437);
    assert_eq!(results[0].signal_mbm, -4500);
    assert_eq!(results[0].tsf, 1234);
    assert!(!results[0].associated);
    assert!(results[1].ssid.is_empty());

    assert_eq!(
        mock.last_sent().unwrap().command(),
        Some(Nl80211Cmd::GetScan)
    );
    Ok(())
}

#[tokio::test]
async fn test_fake_scan_control() -> Result<()> {
    let fake = FakeScanControl::new();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    fake.subscribe_scan_result_notification(IFINDEX, move |ifindex, kind| {
        sink.lock().unwrap().push((ifindex, kind));
    });

    fake.scan(IFINDEX, ScanRequest::new(ScanType::LowPower))
        .await?;
    fake.notify(IFINDEX, ScanEventKind::Completed);

    fake.set_busy(true);
    let err = fake
        .scan(IFINDEX, ScanRequest::new(ScanType::LowPower))
        .await
        .unwrap_err();
    assert!(err.is_busy());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(IFINDEX, ScanEventKind::Completed)]
    );
    assert_eq!(fake.calls().len(), 2);
    assert!(matches!(fake.calls()[0], ScanCall::Scan(IFINDEX, _)));
    Ok(())
}
