// src/models/mod.rs

//! Domain models for the repository differ.

mod config;
mod package;
mod result;

// Re-export all public types
pub use config::{CacheConfig, Config, FetchConfig, OutputConfig, RepositoryConfig};
pub use package::{Evr, PackageRecord};
pub use result::{DivergenceMap, DivergenceResult, Namesake, ValuePair};
