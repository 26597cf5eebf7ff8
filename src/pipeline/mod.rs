//! Pipeline stages for repository comparison.
//!
//! - `merge`: Load and merge the feeds of one repository
//! - `index`: Derive name, name+arch and identity indexes
//! - `diff`: Compare two repositories' indexes
//! - `run`: Drive the full comparison and store the result

pub mod diff;
pub mod index;
pub mod merge;
pub mod run;

pub use diff::{
    Divergence, calculate_divergence, classify_divergence, unique_by_identity, unique_by_name,
    youngest_namesakes,
};
pub use index::{IdentityIndex, NameArchIndex, NameIndex, RepositoryIndexes, build_indexes};
pub use merge::{MergeOutcome, MergeReport, RepositoryMerger, RepositorySnapshot};
pub use run::{DiffOutcome, run_diff};
