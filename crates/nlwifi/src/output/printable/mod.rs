//! Printable implementations for the nl80211 domain types.

mod scan;
mod station;
mod wiphy;

pub use wiphy::WiphySummary;
