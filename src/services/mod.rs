//! Service layer for the repository differ.
//!
//! This module contains the seams towards the outside world:
//! - Feed metadata loading (`MetadataLoader`, `RepomdLoader`)
//! - Metadata caching (`MetadataCache`, `FileCache`, `CachedLoader`)

mod cache;
mod metadata;

pub use cache::{CachedLoader, FileCache, MetadataCache};
pub use metadata::{
    Checksum, DEFAULT_EPOCH, MetadataLoader, RepoMdEntry, RepomdLoader, decompress, parse_primary,
    parse_repomd,
};
