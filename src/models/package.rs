//! Package record data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One built package as advertised by a repository feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PackageRecord {
    /// Package name
    pub name: String,

    /// Epoch ("0" when the feed does not declare one)
    pub epoch: String,

    /// Upstream version
    pub version: String,

    /// Distribution release
    pub release: String,

    /// Build architecture (e.g. "x86_64", "noarch", "src")
    pub architecture: String,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        epoch: impl Into<String>,
        version: impl Into<String>,
        release: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            epoch: epoch.into(),
            version: version.into(),
            release: release.into(),
            architecture: architecture.into(),
        }
    }

    /// Full identity: `name-epoch:version-release.architecture`.
    pub fn identity(&self) -> String {
        format!(
            "{}-{}:{}-{}.{}",
            self.name, self.epoch, self.version, self.release, self.architecture
        )
    }

    /// Name+architecture key: `name.architecture`.
    pub fn name_arch(&self) -> String {
        format!("{}.{}", self.name, self.architecture)
    }

    /// Epoch/version/release triple of this record.
    pub fn evr(&self) -> Evr {
        Evr {
            epoch: self.epoch.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
        }
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

/// Epoch, version and release of a package slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: String,
    pub version: String,
    pub release: String,
}

impl Evr {
    /// Whether `self` replaces `existing` under the highest-wins rule.
    ///
    /// Fields are compared as plain strings, epoch first, and `self` loses as
    /// soon as `existing` is greater in any field. This is not RPM version
    /// ordering: `"10" < "9"` here.
    pub fn supersedes(&self, existing: &Evr) -> bool {
        if existing.epoch > self.epoch {
            false
        } else if existing.version > self.version {
            false
        } else {
            existing.release <= self.release
        }
    }

    /// Compact form used by the namesake report: `epoch:version.release`.
    pub fn label(&self) -> String {
        format!("{}:{}.{}", self.epoch, self.version, self.release)
    }
}
