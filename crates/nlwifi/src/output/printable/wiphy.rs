//! Printable implementation for radio capabilities.

use std::io::Write;

use crate::nl80211::{BandInfo, ScanCapabilities, WiphyFeatures};
use crate::output::{OutputOptions, Printable};

/// Everything `GetWiphyInfo` reports about one radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiphySummary {
    pub wiphy: u32,
    pub bands: BandInfo,
    pub capabilities: ScanCapabilities,
    pub features: WiphyFeatures,
}

fn write_freqs<W: Write>(w: &mut W, label: &str, freqs: &[u32]) -> std::io::Result<()> {
    if freqs.is_empty() {
        return Ok(());
    }
    let list = freqs
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(w, "    {}: {}", label, list)
}

impl Printable for WiphySummary {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        writeln!(w, "phy{}", self.wiphy)?;

        writeln!(w, "  frequencies (MHz):")?;
        write_freqs(w, "2.4 GHz", &self.bands.band_2g)?;
        write_freqs(w, "5 GHz", &self.bands.band_5g)?;
        write_freqs(w, "DFS", &self.bands.band_dfs)?;
        write_freqs(w, "6 GHz", &self.bands.band_6g)?;

        let caps = &self.capabilities;
        writeln!(
            w,
            "  scan: {} ssids, {} sched ssids, {} match sets",
            caps.max_num_scan_ssids, caps.max_num_sched_scan_ssids, caps.max_match_sets
        )?;
        if caps.max_num_scan_plans > 0 {
            writeln!(
                w,
                "  scan plans: {} max, interval <= {}s, iterations <= {}",
                caps.max_num_scan_plans, caps.max_scan_plan_interval, caps.max_scan_plan_iterations
            )?;
        }

        write!(w, "  random mac:")?;
        if self.features.supports_random_mac_oneshot_scan {
            write!(w, " scan")?;
        }
        if self.features.supports_random_mac_sched_scan {
            write!(w, " sched-scan")?;
        }
        if !self.features.supports_random_mac_oneshot_scan
            && !self.features.supports_random_mac_sched_scan
        {
            write!(w, " none")?;
        }
        writeln!(w)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "wiphy": self.wiphy,
            "bands": self.bands,
            "scan_capabilities": self.capabilities,
            "features": self.features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> WiphySummary {
        WiphySummary {
            wiphy: 0,
            bands: BandInfo {
                band_2g: vec![2412, 2437],
                band_5g: vec![5180],
                band_dfs: vec![5600],
                band_6g: vec![],
            },
            capabilities: ScanCapabilities {
                max_num_scan_ssids: 20,
                max_num_sched_scan_ssids: 16,
                max_match_sets: 16,
                ..Default::default()
            },
            features: WiphyFeatures {
                supports_random_mac_oneshot_scan: true,
                supports_random_mac_sched_scan: false,
            },
        }
    }

    #[test]
    fn text_lists_bands() {
        let mut out = Vec::new();
        summary()
            .print_text(&mut out, &OutputOptions::default())
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("phy0\n"));
        assert!(text.contains("    2.4 GHz: 2412 2437\n"));
        assert!(text.contains("    DFS: 5600\n"));
        assert!(!text.contains("6 GHz"));
        assert!(!text.contains("scan plans"));
        assert!(text.contains("  random mac: scan\n"));
    }

    #[test]
    fn json_nests_domain_types() {
        let json = summary().to_json();
        assert_eq!(json["bands"]["band_5g"][0], 5180);
        assert_eq!(json["scan_capabilities"]["max_match_sets"], 16);
        assert_eq!(json["features"]["supports_random_mac_sched_scan"], false);
    }
}
