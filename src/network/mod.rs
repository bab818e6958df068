// src/network/mod.rs
//! Network statistics
//!
//! Fetches the global difficulty and block height from public plain-text
//! endpoints and caches them with a stale-over-absent policy.

/// HTTP fetcher and the cached [`NetworkStats`]
///
/// Each endpoint is requested independently, so one outage doesn't hide the
/// other value.
pub mod fetcher;

// Re-export main components for cleaner imports
pub use fetcher::{NetworkFetch, NetworkStats, NetworkStatsFetcher};
