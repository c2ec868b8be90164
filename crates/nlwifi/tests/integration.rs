//! Integration test entry point.
//!
//! The tests drive the public API through the in-memory transport from
//! `nlwifi::testing`, so they run without wireless hardware:
//!
//! ```bash
//! cargo test --test integration --features testing
//! ```
//!
//! `live.rs` talks to the real kernel and skips itself when nl80211 is not
//! available.
//!
//! # Test Organization
//!
//! - `wiphy.rs` - Radio discovery and capability queries
//! - `scan.rs` - One-shot and scheduled scans, scan results
//! - `events.rs` - Event dispatch through the transport
//! - `live.rs` - Smoke tests against the running kernel

#[macro_use]
#[path = "common/mod.rs"]
mod common;

#[path = "integration/wiphy.rs"]
mod wiphy;

#[path = "integration/scan.rs"]
mod scan;

#[path = "integration/events.rs"]
mod events;

#[path = "integration/live.rs"]
mod live;
