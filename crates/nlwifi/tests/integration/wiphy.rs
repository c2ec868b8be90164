//! Radio discovery and capability queries.

use nlwifi::Result;
use nlwifi::nl80211::{
    Attr, EventRegistry, InterfaceMode, NetlinkUtils, Nl80211Attr, Nl80211Cmd, Nl80211Iftype,
    Nl80211Packet, Nl80211RateInfo, Nl80211StaInfo, WifiInfo,
};
use nlwifi::testing::MockTransport;

use crate::common::{
    IFINDEX, MAC, WIPHY, bands, freq, interface_reply, scan_limits, wiphy_reply,
};

#[tokio::test]
async fn test_wiphy_info_from_split_dump() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();

    let mut second = scan_limits(20, 16, 16);
    second.push(Attr::new_u32(Nl80211Attr::FeatureFlags as u16, 1 << 29));
    mock.push_reply(vec![
        wiphy_reply(
            WIPHY,
            vec![bands(vec![
                vec![freq(2412, false), freq(2437, false)],
                vec![freq(5180, false), freq(5600, true)],
            ])],
        ),
        wiphy_reply(WIPHY, second),
        // Another radio in the same dump is ignored.
        wiphy_reply(1, vec![bands(vec![vec![freq(2484, false)]])]),
    ]);

    let utils = NetlinkUtils::new(&mock, &registry);
    let (band_info, caps, features) = utils.get_wiphy_info(WIPHY).await?;

    assert_eq!(band_info.band_2g, vec![2412, 2437]);
    assert_eq!(band_info.band_5g, vec![5180]);
    assert_eq!(band_info.band_dfs, vec![5600]);
    assert!(band_info.band_6g.is_empty());

    assert_eq!(caps.max_num_scan_ssids, 20);
    assert_eq!(caps.max_num_sched_scan_ssids, 16);
    assert_eq!(caps.max_match_sets, 16);
    assert_eq!(caps.max_num_scan_plans, 0);

    assert!(features.supports_random_mac_oneshot_scan);
    assert!(!features.supports_random_mac_sched_scan);

    let request = mock.last_sent().unwrap();
    assert_eq!(request.command(), Some(Nl80211Cmd::GetWiphy));
    assert!(request.attr(Nl80211Attr::SplitWiphyDump as u16).is_some());
    Ok(())
}

#[tokio::test]
async fn test_wiphy_info_without_limits_is_malformed() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    mock.push_reply(vec![wiphy_reply(
        WIPHY,
        vec![bands(vec![vec![freq(2412, false)]])],
    )]);

    let err = NetlinkUtils::new(&mock, &registry)
        .get_wiphy_info(WIPHY)
        .await
        .unwrap_err();
    assert!(err.is_malformed());
    Ok(())
}

#[tokio::test]
async fn test_empty_wiphy_dump() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    let utils = NetlinkUtils::new(&mock, &registry);

    let err = utils.get_wiphy_index().await.unwrap_err();
    assert!(err.is_not_found());

    let err = utils.get_wiphy_info(WIPHY).await.unwrap_err();
    assert!(matches!(err, nlwifi::Error::NoWiphy));
    Ok(())
}

#[tokio::test]
async fn test_interface_skips_p2p() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    mock.push_reply(vec![
        interface_reply(WIPHY, 9, "p2p-dev-wlan0", Nl80211Iftype::P2pDevice as u32),
        interface_reply(WIPHY, 8, "p2p0", Nl80211Iftype::Station as u32),
        interface_reply(WIPHY, IFINDEX, "wlan0", Nl80211Iftype::Station as u32),
    ]);

    let info = NetlinkUtils::new(&mock, &registry)
        .get_interface_info(WIPHY)
        .await?;
    assert_eq!(info.name, "wlan0");
    assert_eq!(info.index, IFINDEX);
    assert_eq!(info.mac_address, MAC);
    Ok(())
}

#[tokio::test]
async fn test_interface_not_found() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    mock.push_reply(vec![interface_reply(
        1,
        IFINDEX,
        "wlan1",
        Nl80211Iftype::Station as u32,
    )]);

    let err = NetlinkUtils::new(&mock, &registry)
        .get_interface_info(WIPHY)
        .await
        .unwrap_err();
    assert!(matches!(err, nlwifi::Error::InterfaceNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn test_set_station_mode() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();

    NetlinkUtils::new(&mock, &registry)
        .set_interface_mode(IFINDEX, InterfaceMode::Station)
        .await?;

    let sent = mock.last_sent().unwrap();
    assert_eq!(sent.command(), Some(Nl80211Cmd::SetInterface));
    assert_eq!(
        sent.attr(Nl80211Attr::Iftype as u16).unwrap().u32()?,
        Nl80211Iftype::Station as u32
    );
    Ok(())
}

#[tokio::test]
async fn test_station_info() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    mock.push_reply(vec![Nl80211Packet::new(Nl80211Cmd::NewStation).with(Attr::nest(
        Nl80211Attr::StaInfo as u16,
        [
            Attr::new_u32(Nl80211StaInfo::TxPackets as u16, 1000),
            Attr::new_u32(Nl80211StaInfo::TxFailed as u16, 7),
            Attr::new_u8(Nl80211StaInfo::Signal as u16, (-55i8) as u8),
            Attr::nest(
                Nl80211StaInfo::TxBitrate as u16,
                [Attr::new_u32(Nl80211RateInfo::Bitrate32 as u16, 8667)],
            ),
        ],
    ))]);

    let info = NetlinkUtils::new(&mock, &registry)
        .get_station_info(IFINDEX, [0x02, 0x11, 0x22, 0x33, 0x44, 0x55])
        .await?;
    assert_eq!(info.station_tx_packets, 1000);
    assert_eq!(info.station_tx_failed, 7);
    assert_eq!(info.station_tx_bitrate, 8667);
    assert_eq!(info.current_rssi, -55);
    Ok(())
}

#[tokio::test]
async fn test_station_not_associated() -> Result<()> {
    let mock = MockTransport::new();
    let registry = EventRegistry::new();
    mock.push_errno(libc::ENOENT);

    let err = NetlinkUtils::new(&mock, &registry)
        .get_station_info(IFINDEX, [0; 6])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("GET_STATION"));
    Ok(())
}
