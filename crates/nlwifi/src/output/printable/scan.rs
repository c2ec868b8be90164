//! Printable implementation for NativeScanResult.

use std::io::Write;

use crate::nl80211::NativeScanResult;
use crate::output::formatting::{format_hex, format_mac, format_signal_mbm, format_ssid};
use crate::output::{OutputOptions, Printable};

impl Printable for NativeScanResult {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        write!(
            w,
            "{} {:>5} MHz {:>11}  {}",
            format_mac(&self.bssid),
            self.frequency,
            format_signal_mbm(self.signal_mbm),
            format_ssid(&self.ssid)
        )?;
        if self.associated {
            write!(w, " [associated]")?;
        }
        writeln!(w)?;

        if opts.details {
            writeln!(w, "    tsf {} capability 0x{:04x}", self.tsf, self.capability)?;
            for chain in &self.radio_chain_infos {
                writeln!(
                    w,
                    "    chain {}: {}",
                    chain.chain_id,
                    format_signal_mbm(chain.level * 100)
                )?;
            }
            if !self.info_element.is_empty() {
                writeln!(w, "    ies {}", format_hex(&self.info_element))?;
            }
        }

        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        let chains: Vec<_> = self
            .radio_chain_infos
            .iter()
            .map(|c| serde_json::json!({ "chain_id": c.chain_id, "level": c.level }))
            .collect();

        serde_json::json!({
            "bssid": format_mac(&self.bssid),
            "ssid": self.ssid_lossy(),
            "frequency": self.frequency,
            "signal_mbm": self.signal_mbm,
            "tsf": self.tsf,
            "capability": self.capability,
            "associated": self.associated,
            "radio_chains": chains,
            "ies": format_hex(&self.info_element),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nl80211::RadioChainInfo;

    fn result() -> NativeScanResult {
        NativeScanResult {
            ssid: b"lab".to_vec(),
            bssid: [0x02, 0x11, 0x22, 0x33, 0x44, 0x55],
            info_element: vec![0x00, 0x03, b'l', b'a', b'b'],
            frequency: 5180,
            signal_mbm: -6500,
            tsf: 42,
            capability: 0x0411,
            associated: true,
            radio_chain_infos: vec![RadioChainInfo {
                chain_id: 1,
                level: -66,
            }],
        }
    }

    #[test]
    fn summary_line() {
        let mut out = Vec::new();
        result()
            .print_text(&mut out, &OutputOptions::default())
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "02:11:22:33:44:55  5180 MHz  -65.00 dBm  lab [associated]\n"
        );
    }

    #[test]
    fn details_add_chains_and_ies() {
        let mut out = Vec::new();
        let opts = OutputOptions {
            details: true,
            ..Default::default()
        };
        result().print_text(&mut out, &opts).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("    tsf 42 capability 0x0411\n"));
        assert!(text.contains("    chain 1: -66.00 dBm\n"));
        assert!(text.contains("    ies 00036c6162\n"));
    }

    #[test]
    fn json_fields() {
        let json = result().to_json();
        assert_eq!(json["bssid"], "02:11:22:33:44:55");
        assert_eq!(json["ssid"], "lab");
        assert_eq!(json["radio_chains"][0]["level"], -66);
    }
}
