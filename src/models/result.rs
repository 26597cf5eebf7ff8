//! Divergence result data structures.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::PackageRecord;

/// `(alpha, beta)` values for one name+architecture key.
pub type ValuePair = (String, String);

/// Mapping from `name.architecture` to the differing values.
pub type DivergenceMap = BTreeMap<String, ValuePair>;

/// One entry of the namesake report: `{ "name.arch": [alpha, beta] }`.
pub type Namesake = BTreeMap<String, ValuePair>;

/// Aggregate output of one comparison run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DivergenceResult {
    /// Names only present in alpha
    pub alpha_unique_by_name: BTreeSet<String>,

    /// Names only present in beta
    pub beta_unique_by_name: BTreeSet<String>,

    /// Same release, different version
    pub version: DivergenceMap,

    /// Same version, different release
    pub release: DivergenceMap,

    /// Both differ; values are `version + release` concatenated
    pub version_and_release: DivergenceMap,

    /// Full identities only present in alpha
    pub alpha_unique_by_identity: BTreeMap<String, PackageRecord>,

    /// Full identities only present in beta
    pub beta_unique_by_identity: BTreeMap<String, PackageRecord>,

    /// Highest alpha/beta builds for every shared name+architecture key
    pub youngest_namesakes: Vec<Namesake>,
}

impl DivergenceResult {
    /// Check if the two repositories differ at all.
    pub fn has_divergence(&self) -> bool {
        !self.alpha_unique_by_name.is_empty()
            || !self.beta_unique_by_name.is_empty()
            || !self.version.is_empty()
            || !self.release.is_empty()
            || !self.version_and_release.is_empty()
            || !self.alpha_unique_by_identity.is_empty()
            || !self.beta_unique_by_identity.is_empty()
    }

    /// Per-category counts, in output file order.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("alpha unique by name", self.alpha_unique_by_name.len()),
            ("beta unique by name", self.beta_unique_by_name.len()),
            ("version differs", self.version.len()),
            ("release differs", self.release.len()),
            ("version and release differ", self.version_and_release.len()),
            ("alpha unique by identity", self.alpha_unique_by_identity.len()),
            ("beta unique by identity", self.beta_unique_by_identity.len()),
            ("youngest namesakes", self.youngest_namesakes.len()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DivergenceResult {
        let mut result = DivergenceResult::default();
        result.alpha_unique_by_name.insert("bar".into());
        result
            .release
            .insert("foo.x86_64".into(), ("1".into(), "2".into()));
        result
            .version_and_release
            .insert("baz.noarch".into(), ("1.01".into(), "2.03".into()));
        let bar = PackageRecord::new("bar", "0", "3.1", "4", "x86_64");
        result.alpha_unique_by_identity.insert(bar.identity(), bar);
        result.youngest_namesakes.push(Namesake::from([(
            "foo.x86_64".to_string(),
            ("0:1.2.1".to_string(), "0:1.2.2".to_string()),
        )]));
        result
    }

    #[test]
    fn test_empty_result_has_no_divergence() {
        assert!(!DivergenceResult::default().has_divergence());
    }

    #[test]
    fn test_namesakes_alone_are_not_divergence() {
        let mut result = DivergenceResult::default();
        result.youngest_namesakes.push(Namesake::from([(
            "foo.x86_64".to_string(),
            ("0:1.1".to_string(), "0:1.1".to_string()),
        )]));
        assert!(!result.has_divergence());
    }

    #[test]
    fn test_json_roundtrip() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        let parsed: DivergenceResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_pairs_serialize_as_arrays() {
        let result = sample();
        let value = serde_json::to_value(&result.release).unwrap();
        assert_eq!(value, serde_json::json!({ "foo.x86_64": ["1", "2"] }));

        let value = serde_json::to_value(&result.youngest_namesakes).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "foo.x86_64": ["0:1.2.1", "0:1.2.2"] }])
        );
    }
}
