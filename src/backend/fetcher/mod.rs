//! Bulk asset fetching with per-file failure isolation.

/// Registry-listing chunk discovery.
pub mod discovery;
pub mod error;
/// reqwest-backed downloader.
pub mod http;
pub mod models;

pub use discovery::{
    ChunkPattern, ListingFilter, discover_extra_chunks, filter_listing, try_discover_extra_chunks,
};
pub use error::FetchError;
pub use http::AssetFetcher;
pub use models::{
    DiscoveredChunk, EntryOrigin, FetchEvent, FetchOutcome, FetchResult, RegistryListing,
};
