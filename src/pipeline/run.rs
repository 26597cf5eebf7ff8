// src/pipeline/run.rs

//! Full comparison pipeline: merge → index → diff → store.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, DivergenceResult, RepositoryConfig};
use crate::services::MetadataLoader;
use crate::storage::{ResultStorage, WriteSummary};

use super::diff::calculate_divergence;
use super::index::build_indexes;
use super::merge::{MergeReport, RepositoryMerger};

/// Everything a comparison run produced.
#[derive(Debug)]
pub struct DiffOutcome {
    pub result: DivergenceResult,
    pub alpha: MergeReport,
    pub beta: MergeReport,
    pub write: WriteSummary,
}

fn log_report(report: &MergeReport) {
    if report.feed_failures == report.feed_total && report.feed_total > 0 {
        log::warn!(
            "{}: every feed failed, comparing against an empty repository",
            report.repository
        );
    }
    log::info!(
        "{}: {} packages from {}/{} feeds",
        report.repository,
        report.record_count,
        report.feed_total - report.feed_failures,
        report.feed_total
    );
}

/// Compare two repositories and write the result files.
///
/// Both repositories are merged concurrently; indexing starts only once
/// both snapshots are final.
pub async fn run_diff(
    config: &Config,
    alpha: &RepositoryConfig,
    beta: &RepositoryConfig,
    loader: Arc<dyn MetadataLoader>,
    storage: &dyn ResultStorage,
) -> Result<DiffOutcome> {
    let start_time = Utc::now();
    log::info!("Comparing {} against {}", alpha.name, beta.name);

    let merger = RepositoryMerger::new(loader, config.fetch.max_concurrent);
    let (alpha_merge, beta_merge) = tokio::join!(
        merger.merge_repository(alpha),
        merger.merge_repository(beta)
    );
    log_report(&alpha_merge.report);
    log_report(&beta_merge.report);

    let fetched_time = Utc::now();
    log::info!(
        "Fetch phase took {:.2} seconds",
        (fetched_time - start_time).num_milliseconds() as f64 / 1000.0
    );

    let alpha_indexes = build_indexes(&alpha_merge.snapshot)?;
    let beta_indexes = build_indexes(&beta_merge.snapshot)?;
    let result = calculate_divergence(&alpha_indexes, &beta_indexes);

    let write = storage.write_result(&result).await?;

    let end_time = Utc::now();
    log::info!(
        "Diff phase took {:.2} seconds",
        (end_time - fetched_time).num_milliseconds() as f64 / 1000.0
    );
    log::info!(
        "Wrote {} result files to {}",
        write.files_written,
        write.location.display()
    );

    Ok(DiffOutcome {
        result,
        alpha: alpha_merge.report,
        beta: beta_merge.report,
        write,
    })
}
