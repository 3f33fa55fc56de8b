//! One `fetch-assets` run: ensure the destination, fetch every group, then discovered chunks.

use crate::backend::fetcher::{
    AssetFetcher, ChunkPattern, EntryOrigin, FetchEvent, FetchResult, ListingFilter,
    try_discover_extra_chunks,
};
use crate::backend::utils::config::FetchConfig;
use crate::backend::utils::file_utils::{absolute_display, ensure_directory};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Receives progress while a setup runs.
pub trait SetupProgress {
    fn destination_created(&mut self, _path: &std::path::Path) {}
    fn group_started(&mut self, _label: &str) {}
    fn discovery_started(&mut self) {}
    /// The registry listing could not be used; no chunks will be fetched.
    fn discovery_failed(&mut self, _reason: &str) {}
    fn entry_started(&mut self, _file_name: &str) {}
    fn entry_finished(&mut self, _origin: EntryOrigin, _result: &FetchResult) {}
}

/// Discards all progress.
pub struct Silent;

impl SetupProgress for Silent {}

#[derive(Debug)]
pub struct ReportEntry {
    /// Group label, or `None` for discovered chunks.
    pub group: Option<String>,
    pub origin: EntryOrigin,
    pub result: FetchResult,
}

#[derive(Debug)]
pub struct SetupReport {
    /// Absolute destination directory.
    pub destination: PathBuf,
    pub entries: Vec<ReportEntry>,
}

impl SetupReport {
    fn failed(&self, origin: EntryOrigin) -> usize {
        self.entries
            .iter()
            .filter(|e| e.origin == origin && !e.result.is_success())
            .count()
    }

    /// Explicitly listed files that could not be fetched.
    pub fn listed_failures(&self) -> usize {
        self.failed(EntryOrigin::Listed)
    }

    /// Discovered chunks that could not be fetched.
    pub fn skipped_chunks(&self) -> usize {
        self.failed(EntryOrigin::Discovered)
    }

    pub fn bytes_written(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| e.result.outcome.as_ref().ok())
            .sum()
    }
}

/// Runs a full setup. Only a failure to create the destination is fatal.
pub async fn run_setup<R: SetupProgress>(
    config: &FetchConfig,
    fetcher: &AssetFetcher,
    progress: &mut R,
) -> Result<SetupReport> {
    let destination = config.destination.as_path();
    let created = ensure_directory(destination)
        .await
        .with_context(|| format!("Failed to create destination directory {destination:?}"))?;
    if created {
        progress.destination_created(destination);
    }

    let mut entries = Vec::new();

    for group in &config.groups {
        log::info!("Fetching {} files from {}", group.files.len(), group.base_url);
        progress.group_started(&group.label);

        let results = fetcher
            .fetch_manifest_with(&group.base_url, &group.files, destination, |event| match event {
                FetchEvent::Started { file_name } => progress.entry_started(file_name),
                FetchEvent::Finished(result) => progress.entry_finished(EntryOrigin::Listed, result),
            })
            .await;

        entries.extend(results.into_iter().map(|result| ReportEntry {
            group: Some(group.label.clone()),
            origin: EntryOrigin::Listed,
            result,
        }));
    }

    if let Some(discovery) = &config.discovery {
        progress.discovery_started();

        let already_listed: HashSet<String> =
            config.listed_files().map(str::to_string).collect();
        let pattern = ChunkPattern::new(&discovery.chunk_infixes);

        let chunks = match try_discover_extra_chunks(
            fetcher,
            &discovery.listing_url,
            &ListingFilter::from(discovery),
            &already_listed,
            |name| pattern.matches(name),
        )
        .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                log::warn!("Could not auto-detect chunks from {}: {e}", discovery.listing_url);
                progress.discovery_failed(&e.to_string());
                Vec::new()
            }
        };

        for chunk in chunks {
            progress.entry_started(&chunk.file_name);
            let url = format!("{}{}", discovery.download_base_url, chunk.remote_path);
            let outcome = fetcher
                .fetch_url(&url, &destination.join(&chunk.file_name))
                .await;
            let result = FetchResult {
                file_name: chunk.file_name,
                outcome,
            };
            progress.entry_finished(EntryOrigin::Discovered, &result);
            entries.push(ReportEntry {
                group: None,
                origin: EntryOrigin::Discovered,
                result,
            });
        }
    }

    let report = SetupReport {
        destination: absolute_display(destination),
        entries,
    };

    log::info!(
        "Setup finished: {} entries, {} listed failures, {} skipped chunks",
        report.entries.len(),
        report.listed_failures(),
        report.skipped_chunks()
    );

    Ok(report)
}
