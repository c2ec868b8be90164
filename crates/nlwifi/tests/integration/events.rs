//! Event dispatch through the transport.
//!
//! The registry is attached to the transport exactly as a daemon would
//! attach it; packets are injected with `MockTransport::emit`.

use std::sync::{Arc, Mutex};

use nlwifi::Result;
use nlwifi::nl80211::{
    Attr, EventRegistry, MlmeEvent, NetlinkUtils, Nl80211Attr, Nl80211Cmd, Nl80211Packet,
    Nl80211RegType, ScanControl, ScanEventKind, ScanUtils, Transport, WifiInfo,
};
use nlwifi::testing::MockTransport;

use crate::common::{BSSID, IFINDEX, WIPHY};

fn setup() -> (MockTransport, Arc<EventRegistry>) {
    let mock = MockTransport::new();
    let registry = Arc::new(EventRegistry::new());
    mock.register_event_listener(registry.clone());
    (mock, registry)
}

fn connect(ifindex: u32, status: u16) -> Nl80211Packet {
    Nl80211Packet::new(Nl80211Cmd::Connect)
        .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, ifindex))
        .with(Attr::new(Nl80211Attr::Mac as u16, BSSID.to_vec()))
        .with(Attr::new_u16(Nl80211Attr::StatusCode as u16, status))
}

fn reg_change(wiphy: Option<u32>, alpha2: &str) -> Nl80211Packet {
    let mut packet = Nl80211Packet::new(Nl80211Cmd::RegChange)
        .with(Attr::new_u8(
            Nl80211Attr::RegType as u16,
            Nl80211RegType::Country as u8,
        ))
        .with(Attr::new_string(Nl80211Attr::RegAlpha2 as u16, alpha2));
    if let Some(wiphy) = wiphy {
        packet.push(Attr::new_u32(Nl80211Attr::Wiphy as u16, wiphy));
    }
    packet
}

#[tokio::test]
async fn test_mlme_events_reach_subscriber() -> Result<()> {
    let (mock, registry) = setup();
    let utils = NetlinkUtils::new(&mock, &registry);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    utils.subscribe_mlme_event(IFINDEX, move |ifindex, event| {
        sink.lock().unwrap().push((ifindex, event.clone()));
    });

    mock.emit(&connect(IFINDEX, 0));
    // Other interfaces are not routed here.
    mock.emit(&connect(IFINDEX + 1, 0));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            IFINDEX,
            MlmeEvent::Connect {
                bssid: Some(BSSID),
                status_code: 0,
                timed_out: false,
            }
        )]
    );

    utils.unsubscribe_mlme_event(IFINDEX);
    mock.emit(&connect(IFINDEX, 17));
    assert_eq!(seen.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_scan_events_reach_subscriber() -> Result<()> {
    let (mock, registry) = setup();
    let scanner = ScanUtils::new(&mock, &registry);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    scanner.subscribe_scan_result_notification(IFINDEX, move |_, kind| {
        sink.lock().unwrap().push(kind);
    });

    for cmd in [
        Nl80211Cmd::NewScanResults,
        Nl80211Cmd::ScanAborted,
        Nl80211Cmd::SchedScanResults,
        Nl80211Cmd::SchedScanStopped,
    ] {
        mock.emit(
            &Nl80211Packet::new(cmd).with(Attr::new_u32(Nl80211Attr::Ifindex as u16, IFINDEX)),
        );
    }

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ScanEventKind::Completed,
            ScanEventKind::Aborted,
            ScanEventKind::ScheduledResults,
            ScanEventKind::ScheduledStopped,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_reg_domain_changes() -> Result<()> {
    let (mock, registry) = setup();
    let utils = NetlinkUtils::new(&mock, &registry);

    let seen = Arc::new(Mutex::new(Vec::new()));
    for wiphy in [WIPHY, WIPHY + 1] {
        let sink = seen.clone();
        utils.subscribe_reg_domain_change(wiphy, move |wiphy, alpha2| {
            sink.lock().unwrap().push((wiphy, alpha2.to_string()));
        });
    }

    mock.emit(&reg_change(Some(WIPHY + 1), "DE"));
    assert_eq!(*seen.lock().unwrap(), vec![(WIPHY + 1, "DE".to_string())]);

    seen.lock().unwrap().clear();
    mock.emit(&reg_change(None, "US"));
    let mut global = seen.lock().unwrap().clone();
    global.sort();
    assert_eq!(
        global,
        vec![(WIPHY, "US".to_string()), (WIPHY + 1, "US".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn test_interface_removal_drops_handlers() -> Result<()> {
    let (mock, registry) = setup();

    registry.subscribe_mlme_event(IFINDEX, |_, _| {});
    registry.subscribe_scan_result_notification(IFINDEX, |_, _| {});

    mock.emit(
        &Nl80211Packet::new(Nl80211Cmd::DelInterface)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, IFINDEX)),
    );

    assert!(!registry.has_mlme_handler(IFINDEX));
    assert!(!registry.has_scan_handler(IFINDEX));
    Ok(())
}

#[tokio::test]
async fn test_malformed_event_leaves_registry_intact() -> Result<()> {
    let (mock, registry) = setup();

    let seen = Arc::new(Mutex::new(0));
    let sink = seen.clone();
    registry.subscribe_mlme_event(IFINDEX, move |_, _| {
        *sink.lock().unwrap() += 1;
    });

    // Connect without a status code and without a timeout is undecodable.
    mock.emit(
        &Nl80211Packet::new(Nl80211Cmd::Connect)
            .with(Attr::new_u32(Nl80211Attr::Ifindex as u16, IFINDEX)),
    );
    mock.emit(&connect(IFINDEX, 1));

    assert_eq!(*seen.lock().unwrap(), 1);
    assert!(registry.has_mlme_handler(IFINDEX));
    Ok(())
}
