//! Async nl80211 control layer for Linux wireless devices.
//!
//! This crate sits between a WiFi daemon and the kernel's nl80211 Generic
//! Netlink family. It turns capability and state queries into typed values
//! (bands, scan limits, feature flags, station counters), drives one-shot
//! and scheduled scans, and routes kernel events to per-interface handlers.
//!
//! # Features
//!
//! - `output` - JSON/text output formatting for the domain types
//! - `testing` - In-memory transport and scan-control doubles
//! - `full` - All features enabled
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nlwifi::nl80211::{
//!     EventRegistry, Nl80211Transport, ScanControl, ScanRequest, ScanType, ScanUtils, Transport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> nlwifi::Result<()> {
//!     let transport = Nl80211Transport::new().await?;
//!     let registry = Arc::new(EventRegistry::new());
//!     transport.register_event_listener(registry.clone());
//!
//!     let scanner = ScanUtils::new(&transport, &registry);
//!     scanner.subscribe_scan_result_notification(3, |ifindex, kind| {
//!         println!("scan on {}: {:?}", ifindex, kind);
//!     });
//!     scanner.scan(3, ScanRequest::new(ScanType::LowPower)).await?;
//!
//!     // Events are delivered while this runs.
//!     transport.run_events().await
//! }
//! ```

// Core modules (always available)
pub mod netlink;
pub mod nl80211;

// Feature-gated modules
#[cfg(feature = "output")]
pub mod output;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export common types at crate root for convenience
pub use netlink::{Error, Result};
