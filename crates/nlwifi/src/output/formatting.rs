//! Formatting helpers for wireless values.
//!
//! # Example
//!
//! ```
//! use nlwifi::output::formatting::{format_bitrate, format_mac, format_signal_mbm};
//!
//! assert_eq!(format_mac(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]), "00:11:22:33:44:55");
//! assert_eq!(format_bitrate(540), "54.0 MBit/s");
//! assert_eq!(format_signal_mbm(-6500), "-65.00 dBm");
//! ```

/// Format a MAC address from bytes.
///
/// # Example
///
/// ```
/// use nlwifi::output::formatting::format_mac;
///
/// assert_eq!(format_mac(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]), "00:11:22:33:44:55");
/// ```
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse `aa:bb:cc:dd:ee:ff`.
pub fn parse_mac(s: &str) -> Option<[u8; 6]> {
    let mut out = [0u8; 6];
    let mut parts = s.split(':');
    for byte in &mut out {
        *byte = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    parts.next().is_none().then_some(out)
}

/// Format a hex string from bytes.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format a bitrate given in 100 kbit/s units.
pub fn format_bitrate(rate: u32) -> String {
    format!("{}.{} MBit/s", rate / 10, rate % 10)
}

/// Format a signal strength given in mBm.
pub fn format_signal_mbm(mbm: i32) -> String {
    format!("{:.2} dBm", mbm as f64 / 100.0)
}

/// Format an SSID, escaping bytes that are not printable ASCII.
pub fn format_ssid(ssid: &[u8]) -> String {
    ssid.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                (b as char).to_string()
            } else {
                format!("\\x{:02x}", b)
            }
        })
        .collect()
}
