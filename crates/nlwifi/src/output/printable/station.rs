//! Printable implementations for StationInfo and InterfaceInfo.

use std::io::Write;

use crate::nl80211::{InterfaceInfo, StationInfo};
use crate::output::formatting::{format_bitrate, format_mac};
use crate::output::{OutputOptions, Printable};

impl Printable for StationInfo {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        writeln!(w, "    signal: {} dBm", self.current_rssi)?;
        writeln!(w, "    tx bitrate: {}", format_bitrate(self.station_tx_bitrate))?;
        writeln!(w, "    tx packets: {}", self.station_tx_packets)?;
        writeln!(w, "    tx failed: {}", self.station_tx_failed)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "signal": self.current_rssi,
            "tx_bitrate": self.station_tx_bitrate,
            "tx_packets": self.station_tx_packets,
            "tx_failed": self.station_tx_failed,
        })
    }
}

impl Printable for InterfaceInfo {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        writeln!(
            w,
            "{}: {} addr {}",
            self.index,
            self.name,
            format_mac(&self.mac_address)
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ifindex": self.index,
            "ifname": self.name,
            "address": format_mac(&self.mac_address),
        })
    }
}
