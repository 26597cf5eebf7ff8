//! Divergence calculation between two repositories.
//!
//! Every operation borrows its inputs and builds fresh collections; the
//! indexes handed in stay usable afterwards.

use crate::models::{DivergenceMap, DivergenceResult, Namesake};

use super::index::{IdentityIndex, NameArchIndex, NameIndex, RepositoryIndexes};

/// Names present in only one of the two repositories.
pub fn unique_by_name(alpha: &NameIndex, beta: &NameIndex) -> (NameIndex, NameIndex) {
    let alpha_only = alpha.difference(beta).cloned().collect();
    let beta_only = beta.difference(alpha).cloned().collect();
    (alpha_only, beta_only)
}

/// Full identities present in only one of the two repositories.
pub fn unique_by_identity(
    alpha: &IdentityIndex,
    beta: &IdentityIndex,
) -> (IdentityIndex, IdentityIndex) {
    let only_in = |left: &IdentityIndex, right: &IdentityIndex| -> IdentityIndex {
        left.iter()
            .filter(|(identity, _)| !right.contains_key(*identity))
            .map(|(identity, record)| (identity.clone(), record.clone()))
            .collect()
    };
    (only_in(alpha, beta), only_in(beta, alpha))
}

/// Version/release divergence buckets for shared name+architecture slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Divergence {
    /// Same release, different version: `(alpha.version, beta.version)`
    pub version: DivergenceMap,
    /// Same version, different release: `(alpha.release, beta.release)`
    pub release: DivergenceMap,
    /// Both differ: `(alpha.version + alpha.release, beta.version + beta.release)`
    pub version_and_release: DivergenceMap,
}

/// Classify every slot of `alpha` that also exists in `beta`.
///
/// Slots missing from `beta` are left to the uniqueness reports. Epochs are
/// not compared here.
pub fn classify_divergence(alpha: &NameArchIndex, beta: &NameArchIndex) -> Divergence {
    let mut divergence = Divergence::default();

    for (key, a) in alpha {
        let Some(b) = beta.get(key) else {
            continue;
        };

        let same_version = a.version == b.version;
        let same_release = a.release == b.release;

        match (same_version, same_release) {
            (true, true) => {}
            (true, false) => {
                divergence
                    .release
                    .insert(key.clone(), (a.release.clone(), b.release.clone()));
            }
            (false, true) => {
                divergence
                    .version
                    .insert(key.clone(), (a.version.clone(), b.version.clone()));
            }
            (false, false) => {
                divergence.version_and_release.insert(
                    key.clone(),
                    (
                        format!("{}{}", a.version, a.release),
                        format!("{}{}", b.version, b.release),
                    ),
                );
            }
        }
    }

    divergence
}

/// Pair the surviving builds of every shared slot, matches included.
///
/// Entries follow the key order of `alpha`.
pub fn youngest_namesakes(alpha: &NameArchIndex, beta: &NameArchIndex) -> Vec<Namesake> {
    alpha
        .iter()
        .filter_map(|(key, a)| {
            beta.get(key)
                .map(|b| Namesake::from([(key.clone(), (a.label(), b.label()))]))
        })
        .collect()
}

/// Run every comparison and assemble the full result set.
pub fn calculate_divergence(
    alpha: &RepositoryIndexes,
    beta: &RepositoryIndexes,
) -> DivergenceResult {
    let (alpha_unique_by_name, beta_unique_by_name) = unique_by_name(&alpha.names, &beta.names);
    let (alpha_unique_by_identity, beta_unique_by_identity) =
        unique_by_identity(&alpha.identities, &beta.identities);
    let Divergence {
        version,
        release,
        version_and_release,
    } = classify_divergence(&alpha.name_arch, &beta.name_arch);
    let youngest_namesakes = youngest_namesakes(&alpha.name_arch, &beta.name_arch);

    DivergenceResult {
        alpha_unique_by_name,
        beta_unique_by_name,
        version,
        release,
        version_and_release,
        alpha_unique_by_identity,
        beta_unique_by_identity,
        youngest_namesakes,
    }
}
