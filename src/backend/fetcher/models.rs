use super::error::FetchError;
use serde::Deserialize;

/// Bytes written on success.
pub type FetchOutcome = Result<u64, FetchError>;

/// Whether an entry came from the explicit manifest or from registry discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    Listed,
    Discovered,
}

/// Outcome of one manifest entry, in the order it was fetched.
#[derive(Debug)]
pub struct FetchResult {
    pub file_name: String,
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Progress notifications emitted while a manifest is fetched.
#[derive(Debug)]
pub enum FetchEvent<'a> {
    Started { file_name: &'a str },
    Finished(&'a FetchResult),
}

/// A chunk file found in a registry listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredChunk {
    /// Base name used for the local file.
    pub file_name: String,
    /// Path as listed by the registry, e.g. `/dist/umd/814.ffmpeg.js`.
    pub remote_path: String,
}

/// A registry "flat" package listing. Only the file paths are read.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryListing {
    pub files: Vec<ListedFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListedFile {
    #[serde(alias = "path")]
    pub name: String,
}
