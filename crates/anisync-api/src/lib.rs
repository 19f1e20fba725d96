//! Remote catalog access for anisync.
//!
//! [`traits`] holds the service-agnostic types the sync core works with;
//! [`mal`] implements them against the MyAnimeList v2 API.

pub mod mal;
pub mod traits;
