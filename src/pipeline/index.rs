// src/pipeline/index.rs

//! Index building.
//!
//! Turns a merged snapshot into the three views the differ compares:
//! package names, name+architecture slots, and full identities.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AppError, Result};
use crate::models::{Evr, PackageRecord};

use super::merge::RepositorySnapshot;

/// Distinct package names.
pub type NameIndex = BTreeSet<String>;

/// `name.architecture` → highest epoch/version/release seen for that slot.
pub type NameArchIndex = BTreeMap<String, Evr>;

/// Full identity → record, one entry per package.
pub type IdentityIndex = BTreeMap<String, PackageRecord>;

/// All indexes derived from one repository snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryIndexes {
    pub names: NameIndex,
    pub name_arch: NameArchIndex,
    pub identities: IdentityIndex,
}

impl RepositoryIndexes {
    /// Add one record to every index.
    ///
    /// The name+architecture slot keeps whichever record wins under
    /// [`Evr::supersedes`].
    pub fn insert(&mut self, record: &PackageRecord) -> Result<()> {
        validate_record(record)?;

        self.names.insert(record.name.clone());

        let candidate = record.evr();
        let key = record.name_arch();
        match self.name_arch.get(&key) {
            Some(existing) if !candidate.supersedes(existing) => {}
            _ => {
                self.name_arch.insert(key, candidate);
            }
        }

        self.identities.insert(record.identity(), record.clone());
        Ok(())
    }
}

/// Reject records that break the loader contract.
fn validate_record(record: &PackageRecord) -> Result<()> {
    let fields = [
        ("name", &record.name),
        ("epoch", &record.epoch),
        ("version", &record.version),
        ("release", &record.release),
        ("architecture", &record.architecture),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(AppError::malformed(record.identity(), *field)),
        None => Ok(()),
    }
}

/// Build all indexes for a snapshot in a single pass.
pub fn build_indexes(snapshot: &RepositorySnapshot) -> Result<RepositoryIndexes> {
    let mut indexes = RepositoryIndexes::default();
    for record in snapshot.values() {
        indexes.insert(record)?;
    }
    Ok(indexes)
}
