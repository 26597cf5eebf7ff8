// src/pipeline/merge.rs

//! Repository merging.
//!
//! Loads every feed of one logical repository concurrently and folds the
//! results into a single snapshot keyed by full identity.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::models::{PackageRecord, RepositoryConfig};
use crate::services::MetadataLoader;

/// Full identity → record, for one logical repository.
pub type RepositorySnapshot = BTreeMap<String, PackageRecord>;

/// Summary of a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub repository: String,
    pub feed_total: usize,
    pub feed_failures: usize,
    pub record_count: usize,
    /// Identities delivered by more than one feed
    pub collisions: usize,
}

/// Merged snapshot plus its report.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub snapshot: RepositorySnapshot,
    pub report: MergeReport,
}

/// Merges the feeds of a repository through a shared loader.
#[derive(Clone)]
pub struct RepositoryMerger {
    loader: Arc<dyn MetadataLoader>,
    concurrency: usize,
}

impl RepositoryMerger {
    /// Create a merger running at most `concurrency` loads at once.
    pub fn new(loader: Arc<dyn MetadataLoader>, concurrency: usize) -> Self {
        Self {
            loader,
            concurrency: concurrency.max(1),
        }
    }

    /// Merge all feeds of a configured repository.
    pub async fn merge_repository(&self, repository: &RepositoryConfig) -> MergeOutcome {
        self.merge(&repository.name, &repository.urls).await
    }

    /// Load every URL and fold the records into one snapshot.
    ///
    /// Feeds that fail are logged and contribute nothing. Results are folded
    /// in completion order, so on an identity collision the feed finishing
    /// last wins.
    pub async fn merge(&self, name: &str, urls: &[String]) -> MergeOutcome {
        let mut outcome = MergeOutcome {
            report: MergeReport {
                repository: name.to_string(),
                feed_total: urls.len(),
                ..MergeReport::default()
            },
            ..MergeOutcome::default()
        };

        let mut loads = stream::iter(urls)
            .map(|url| {
                let loader = Arc::clone(&self.loader);
                async move { (url, loader.load(url).await) }
            })
            .buffer_unordered(self.concurrency);

        while let Some((url, result)) = loads.next().await {
            match result {
                Ok(records) => {
                    log::info!(
                        "Completed fetching data from {} ({} packages)",
                        url,
                        records.len()
                    );
                    for record in records {
                        if outcome.snapshot.insert(record.identity(), record).is_some() {
                            outcome.report.collisions += 1;
                        }
                    }
                }
                Err(error) => {
                    outcome.report.feed_failures += 1;
                    log::warn!("Error fetching data from {}: {}", url, error);
                }
            }
        }

        outcome.report.record_count = outcome.snapshot.len();
        if outcome.report.collisions > 0 {
            log::debug!(
                "{}: {} identities delivered by more than one feed",
                name,
                outcome.report.collisions
            );
        }
        outcome
    }
}
