//! Finds auxiliary chunk files through a package registry's flat file listing.
//!
//! Discovery is best effort: any failure yields an empty result and the run
//! carries on with the explicit manifest.

use super::error::FetchError;
use super::http::AssetFetcher;
use super::models::{DiscoveredChunk, RegistryListing};
use crate::backend::utils::config::DiscoveryConfig;
use std::collections::HashSet;

/// Which listed paths are candidates at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFilter {
    /// Substring the path must contain, e.g. `/dist/umd/`.
    pub dir_marker: String,
    /// Suffix the path must end with, e.g. `.js`.
    pub suffix: String,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            dir_marker: "/dist/umd/".to_string(),
            suffix: ".js".to_string(),
        }
    }
}

impl From<&DiscoveryConfig> for ListingFilter {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            dir_marker: config.dir_marker.clone(),
            suffix: config.suffix.clone(),
        }
    }
}

/// Recognizes chunk file names by case-insensitive infixes.
#[derive(Debug, Clone)]
pub struct ChunkPattern {
    infixes: Vec<String>,
}

impl ChunkPattern {
    pub fn new<I, S>(infixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            infixes: infixes
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.infixes.iter().any(|infix| name.contains(infix.as_str()))
    }
}

impl Default for ChunkPattern {
    /// webpack chunks of `@ffmpeg/ffmpeg` are named `<id>.ffmpeg.js`.
    fn default() -> Self {
        Self::new([".ffmpeg.js", "worker"])
    }
}

/// Last path segment of a listed path.
fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Picks the chunk files out of a listing, in listing order.
///
/// Entries already in the manifest and repeated names are skipped.
pub fn filter_listing<P>(
    listing: &RegistryListing,
    filter: &ListingFilter,
    already_listed: &HashSet<String>,
    is_chunk: P,
) -> Vec<DiscoveredChunk>
where
    P: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();

    listing
        .files
        .iter()
        .map(|f| f.name.as_str())
        .filter(|path| {
            path.contains(filter.dir_marker.as_str()) && path.ends_with(filter.suffix.as_str())
        })
        .filter_map(|path| {
            let file_name = base_name(path);
            if file_name.is_empty()
                || already_listed.contains(file_name)
                || !is_chunk(file_name)
                || !seen.insert(file_name.to_string())
            {
                return None;
            }
            Some(DiscoveredChunk {
                file_name: file_name.to_string(),
                remote_path: path.to_string(),
            })
        })
        .collect()
}

/// Requests the listing at `listing_url` and returns the chunks worth fetching.
pub async fn try_discover_extra_chunks<P>(
    fetcher: &AssetFetcher,
    listing_url: &str,
    filter: &ListingFilter,
    already_listed: &HashSet<String>,
    is_chunk: P,
) -> Result<Vec<DiscoveredChunk>, FetchError>
where
    P: Fn(&str) -> bool,
{
    let listing = fetcher.get_listing(listing_url).await?;
    let chunks = filter_listing(&listing, filter, already_listed, is_chunk);
    log::debug!(
        "Listing {listing_url} has {} files, {} new chunks",
        listing.files.len(),
        chunks.len()
    );
    Ok(chunks)
}

/// Like [`try_discover_extra_chunks`], but never fails: a request or parse error
/// is logged and yields an empty list.
pub async fn discover_extra_chunks<P>(
    fetcher: &AssetFetcher,
    listing_url: &str,
    filter: &ListingFilter,
    already_listed: &HashSet<String>,
    is_chunk: P,
) -> Vec<DiscoveredChunk>
where
    P: Fn(&str) -> bool,
{
    try_discover_extra_chunks(fetcher, listing_url, filter, already_listed, is_chunk)
        .await
        .unwrap_or_else(|e| {
            log::warn!("Could not auto-detect chunks from {listing_url}: {e}");
            Vec::new()
        })
}
