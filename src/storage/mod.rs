//! Storage abstractions for comparison results.
//!
//! Each category of a [`DivergenceResult`] is persisted as its own JSON
//! document.
//!
//! ## Directory Structure
//!
//! ```text
//! output/
//! ├── alpha_unique_by_name.json
//! ├── beta_unique_by_name.json
//! ├── version.json
//! ├── release.json
//! ├── version_and_release.json
//! ├── alpha_unique_by_identity.json
//! ├── beta_unique_by_identity.json
//! └── youngest_namesake_packages.json
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::DivergenceResult;

// Re-export for convenience
pub use local::LocalStorage;

pub const ALPHA_UNIQUE_BY_NAME: &str = "alpha_unique_by_name.json";
pub const BETA_UNIQUE_BY_NAME: &str = "beta_unique_by_name.json";
pub const VERSION: &str = "version.json";
pub const RELEASE: &str = "release.json";
pub const VERSION_AND_RELEASE: &str = "version_and_release.json";
pub const ALPHA_UNIQUE_BY_IDENTITY: &str = "alpha_unique_by_identity.json";
pub const BETA_UNIQUE_BY_IDENTITY: &str = "beta_unique_by_identity.json";
pub const YOUNGEST_NAMESAKES: &str = "youngest_namesake_packages.json";

/// Every result file, in write order.
pub const RESULT_FILES: [&str; 8] = [
    ALPHA_UNIQUE_BY_NAME,
    BETA_UNIQUE_BY_NAME,
    VERSION,
    RELEASE,
    VERSION_AND_RELEASE,
    ALPHA_UNIQUE_BY_IDENTITY,
    BETA_UNIQUE_BY_IDENTITY,
    YOUNGEST_NAMESAKES,
];

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Directory the files were written to
    pub location: PathBuf,
    /// Number of files written
    pub files_written: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for result storage backends.
#[async_trait]
pub trait ResultStorage: Send + Sync {
    /// Write every category of the result.
    async fn write_result(&self, result: &DivergenceResult) -> Result<WriteSummary>;

    /// Read a previously written result back.
    async fn load_result(&self) -> Result<DivergenceResult>;
}
