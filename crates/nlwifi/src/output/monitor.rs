//! Monitor helper utilities for event-based output.
//!
//! # Example
//!
//! ```ignore
//! use nlwifi::output::{MonitorConfig, OutputFormat, WifiEvent, print_event};
//!
//! let config = MonitorConfig::new()
//!     .with_timestamp(true)
//!     .with_format(OutputFormat::Text);
//!
//! registry.subscribe_mlme_event(3, move |ifindex, event| {
//!     let event = WifiEvent::Mlme { ifindex, event: event.clone() };
//!     let _ = print_event(&mut std::io::stdout(), &event, &config);
//! });
//! ```

use super::formatting::format_mac;
use super::{OutputFormat, OutputOptions};
use crate::nl80211::{MlmeEvent, ScanEventKind};
use std::io::{self, Write};
use std::time::SystemTime;

/// Configuration for monitor output.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Whether to prefix output with timestamps.
    pub timestamp: bool,
    /// Output format (text or JSON).
    pub format: OutputFormat,
    /// Output options.
    pub opts: OutputOptions,
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = enabled;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_opts(mut self, opts: OutputOptions) -> Self {
        self.opts = opts;
        self
    }
}

/// Write a timestamp prefix to the output if enabled.
///
/// Format: `[seconds.milliseconds] `
pub fn write_timestamp<W: Write>(w: &mut W, config: &MonitorConfig) -> io::Result<()> {
    if config.timestamp {
        let now = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        write!(w, "[{}.{:03}] ", now.as_secs(), now.subsec_millis())?;
    }
    Ok(())
}

/// Helper trait for event types that can be printed in monitor mode.
pub trait MonitorEvent {
    /// Print the event in text format.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> io::Result<()>;

    /// Convert the event to a JSON value.
    fn to_json(&self) -> serde_json::Value;
}

/// Print a monitor event using the configured format.
pub fn print_event<W, E>(w: &mut W, event: &E, config: &MonitorConfig) -> io::Result<()>
where
    W: Write,
    E: MonitorEvent,
{
    write_timestamp(w, config)?;

    match config.format {
        OutputFormat::Text => {
            event.print_text(w, &config.opts)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *w, &event.to_json())?;
            writeln!(w)?;
        }
    }

    w.flush()?;
    Ok(())
}

/// Print a startup message for monitor mode (text format only).
pub fn print_monitor_start<W: Write>(
    w: &mut W,
    config: &MonitorConfig,
    message: &str,
) -> io::Result<()> {
    if config.format == OutputFormat::Text {
        writeln!(w, "{}", message)?;
    }
    Ok(())
}

/// Any event a monitor can receive from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiEvent {
    Mlme { ifindex: u32, event: MlmeEvent },
    Scan { ifindex: u32, kind: ScanEventKind },
    RegDomain { wiphy: u32, alpha2: String },
}

fn bssid_text(bssid: &Option<[u8; 6]>) -> String {
    bssid
        .as_ref()
        .map(|b| format_mac(b))
        .unwrap_or_else(|| "-".to_string())
}

fn scan_kind_name(kind: ScanEventKind) -> &'static str {
    match kind {
        ScanEventKind::Completed => "completed",
        ScanEventKind::Aborted => "aborted",
        ScanEventKind::ScheduledResults => "sched-results",
        ScanEventKind::ScheduledStopped => "sched-stopped",
    }
}

fn mlme_text<W: Write>(w: &mut W, event: &MlmeEvent) -> io::Result<()> {
    match event {
        MlmeEvent::Connect {
            bssid,
            status_code,
            timed_out,
        } => {
            write!(w, "connect {} status {}", bssid_text(bssid), status_code)?;
            if *timed_out {
                write!(w, " timed-out")?;
            }
        }
        MlmeEvent::Associate {
            bssid,
            status_code,
            timed_out,
        } => {
            write!(w, "associate {} status {}", bssid_text(bssid), status_code)?;
            if *timed_out {
                write!(w, " timed-out")?;
            }
        }
        MlmeEvent::Roam { bssid } => write!(w, "roam {}", bssid_text(bssid))?,
        MlmeEvent::Disconnect { reason_code, by_ap } => {
            write!(w, "disconnect reason {}", reason_code)?;
            if *by_ap {
                write!(w, " by-ap")?;
            }
        }
        MlmeEvent::Disassociate { bssid, reason_code } => {
            write!(w, "disassociate {} reason {}", bssid_text(bssid), reason_code)?
        }
        MlmeEvent::Deauthenticate { bssid, reason_code } => write!(
            w,
            "deauthenticate {} reason {}",
            bssid_text(bssid),
            reason_code
        )?,
    }
    Ok(())
}

fn mlme_json(event: &MlmeEvent) -> serde_json::Value {
    let bssid = |b: &Option<[u8; 6]>| b.as_ref().map(|b| format_mac(b));
    match event {
        MlmeEvent::Connect {
            bssid: b,
            status_code,
            timed_out,
        } => serde_json::json!({
            "type": "connect",
            "bssid": bssid(b),
            "status_code": status_code,
            "timed_out": timed_out,
        }),
        MlmeEvent::Associate {
            bssid: b,
            status_code,
            timed_out,
        } => serde_json::json!({
            "type": "associate",
            "bssid": bssid(b),
            "status_code": status_code,
            "timed_out": timed_out,
        }),
        MlmeEvent::Roam { bssid: b } => serde_json::json!({
            "type": "roam",
            "bssid": bssid(b),
        }),
        MlmeEvent::Disconnect { reason_code, by_ap } => serde_json::json!({
            "type": "disconnect",
            "reason_code": reason_code,
            "by_ap": by_ap,
        }),
        MlmeEvent::Disassociate {
            bssid: b,
            reason_code,
        } => serde_json::json!({
            "type": "disassociate",
            "bssid": bssid(b),
            "reason_code": reason_code,
        }),
        MlmeEvent::Deauthenticate {
            bssid: b,
            reason_code,
        } => serde_json::json!({
            "type": "deauthenticate",
            "bssid": bssid(b),
            "reason_code": reason_code,
        }),
    }
}

impl MonitorEvent for WifiEvent {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> io::Result<()> {
        match self {
            WifiEvent::Mlme { ifindex, event } => {
                write!(w, "MLME: dev {} ", ifindex)?;
                mlme_text(w, event)?;
                writeln!(w)
            }
            WifiEvent::Scan { ifindex, kind } => {
                writeln!(w, "SCAN: dev {} {}", ifindex, scan_kind_name(*kind))
            }
            WifiEvent::RegDomain { wiphy, alpha2 } => {
                writeln!(w, "REG: phy{} country {}", wiphy, alpha2)
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            WifiEvent::Mlme { ifindex, event } => serde_json::json!({
                "event": "mlme",
                "ifindex": ifindex,
                "mlme": mlme_json(event),
            }),
            WifiEvent::Scan { ifindex, kind } => serde_json::json!({
                "event": "scan",
                "ifindex": ifindex,
                "kind": scan_kind_name(*kind),
            }),
            WifiEvent::RegDomain { wiphy, alpha2 } => serde_json::json!({
                "event": "reg",
                "wiphy": wiphy,
                "alpha2": alpha2,
            }),
        }
    }
}
