use super::error::FetchError;
use super::models::{FetchEvent, FetchOutcome, FetchResult, RegistryListing};
use crate::backend::utils::config::HttpConfig;
use crate::backend::utils::file_utils::{part_path, remove_file_if_exists};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Sequential asset downloader.
///
/// Every fetch is isolated: a failure is returned as that entry's outcome and
/// never aborts the surrounding manifest.
#[derive(Clone)]
pub struct AssetFetcher {
    client: Client,
}

impl AssetFetcher {
    pub fn new(http: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(http.timeout())
            .user_agent(http.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    /// Fetches `base_url + file_name` into `dest_dir/file_name`.
    pub async fn fetch_one(
        &self,
        base_url: &str,
        file_name: &str,
        dest_dir: &Path,
    ) -> FetchOutcome {
        let url = format!("{base_url}{file_name}");
        self.fetch_url(&url, &dest_dir.join(file_name)).await
    }

    /// Fetches `url` into `destination`, overwriting it, and returns the bytes written.
    ///
    /// The body goes to a `.part` sibling first; the destination is only replaced once
    /// the whole body has been written.
    pub async fn fetch_url(&self, url: &str, destination: &Path) -> FetchOutcome {
        let part = part_path(destination);
        let outcome = self.download_to(url, &part).await;

        let outcome = match outcome {
            Ok(written) => fs::rename(&part, destination)
                .await
                .map(|()| written)
                .map_err(FetchError::from),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(written) => log::debug!("Fetched {url} ({written} bytes) to {destination:?}"),
            Err(e) => {
                log::warn!("Failed to fetch {url}: {e}");
                if let Err(cleanup) = remove_file_if_exists(&part).await {
                    log::debug!("Could not remove {part:?}: {cleanup}");
                }
            }
        }

        outcome
    }

    async fn download_to(&self, url: &str, part: &Path) -> FetchOutcome {
        log::debug!("Downloading {url} to {part:?}");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let mut file = File::create(part).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        drop(file);

        Ok(written)
    }

    /// Fetches every file of a manifest in order, continuing past failures.
    pub async fn fetch_manifest(
        &self,
        base_url: &str,
        file_names: &[String],
        dest_dir: &Path,
    ) -> Vec<FetchResult> {
        self.fetch_manifest_with(base_url, file_names, dest_dir, |_| {}).await
    }

    /// Same as [`fetch_manifest`](Self::fetch_manifest), reporting progress to `on_event`.
    pub async fn fetch_manifest_with<F>(
        &self,
        base_url: &str,
        file_names: &[String],
        dest_dir: &Path,
        mut on_event: F,
    ) -> Vec<FetchResult>
    where
        F: FnMut(FetchEvent<'_>),
    {
        let mut results = Vec::with_capacity(file_names.len());

        for file_name in file_names {
            on_event(FetchEvent::Started {
                file_name: file_name.as_str(),
            });
            let outcome = self.fetch_one(base_url, file_name, dest_dir).await;
            let result = FetchResult {
                file_name: file_name.clone(),
                outcome,
            };
            on_event(FetchEvent::Finished(&result));
            results.push(result);
        }

        results
    }

    /// Fetches and parses a registry "flat" listing.
    pub async fn get_listing(&self, url: &str) -> Result<RegistryListing, FetchError> {
        log::debug!("Fetching registry listing from {url}");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
