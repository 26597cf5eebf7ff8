//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};
use crate::models::DivergenceResult;
use crate::storage::{
    ALPHA_UNIQUE_BY_IDENTITY, ALPHA_UNIQUE_BY_NAME, BETA_UNIQUE_BY_IDENTITY, BETA_UNIQUE_BY_NAME,
    RELEASE, RESULT_FILES, ResultStorage, VERSION, VERSION_AND_RELEASE, WriteSummary,
    YOUNGEST_NAMESAKES,
};
use crate::utils::fs::{load_json, save_json};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a result file.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        save_json(&self.path(key), value).await?;
        log::debug!("Wrote {}", self.path(key).display());
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        load_json(&self.path(key)).await?.ok_or_else(|| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", self.path(key).display()),
            ))
        })
    }
}

#[async_trait]
impl ResultStorage for LocalStorage {
    async fn write_result(&self, result: &DivergenceResult) -> Result<WriteSummary> {
        self.write_json(ALPHA_UNIQUE_BY_NAME, &result.alpha_unique_by_name)
            .await?;
        self.write_json(BETA_UNIQUE_BY_NAME, &result.beta_unique_by_name)
            .await?;
        self.write_json(VERSION, &result.version).await?;
        self.write_json(RELEASE, &result.release).await?;
        self.write_json(VERSION_AND_RELEASE, &result.version_and_release)
            .await?;
        self.write_json(ALPHA_UNIQUE_BY_IDENTITY, &result.alpha_unique_by_identity)
            .await?;
        self.write_json(BETA_UNIQUE_BY_IDENTITY, &result.beta_unique_by_identity)
            .await?;
        self.write_json(YOUNGEST_NAMESAKES, &result.youngest_namesakes)
            .await?;

        Ok(WriteSummary {
            location: self.root_dir.clone(),
            files_written: RESULT_FILES.len(),
            timestamp: Utc::now(),
        })
    }

    async fn load_result(&self) -> Result<DivergenceResult> {
        Ok(DivergenceResult {
            alpha_unique_by_name: self.read_json(ALPHA_UNIQUE_BY_NAME).await?,
            beta_unique_by_name: self.read_json(BETA_UNIQUE_BY_NAME).await?,
            version: self.read_json(VERSION).await?,
            release: self.read_json(RELEASE).await?,
            version_and_release: self.read_json(VERSION_AND_RELEASE).await?,
            alpha_unique_by_identity: self.read_json(ALPHA_UNIQUE_BY_IDENTITY).await?,
            beta_unique_by_identity: self.read_json(BETA_UNIQUE_BY_IDENTITY).await?,
            youngest_namesakes: self.read_json(YOUNGEST_NAMESAKES).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Namesake, PackageRecord};
    use tempfile::TempDir;

    fn sample() -> DivergenceResult {
        let mut result = DivergenceResult::default();
        result.beta_unique_by_name.insert("zsh".into());
        result
            .version
            .insert("vim.x86_64".into(), ("8.2".into(), "9.0".into()));
        let zsh = PackageRecord::new("zsh", "0", "5.9", "1", "x86_64");
        result.beta_unique_by_identity.insert(zsh.identity(), zsh);
        result.youngest_namesakes.push(Namesake::from([(
            "vim.x86_64".to_string(),
            ("2:8.2.1".to_string(), "2:9.0.1".to_string()),
        )]));
        result
    }

    #[tokio::test]
    async fn test_writes_every_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("output"));

        let summary = storage.write_result(&sample()).await.unwrap();

        assert_eq!(summary.files_written, 8);
        for file in RESULT_FILES {
            assert!(tmp.path().join("output").join(file).exists(), "{file} missing");
        }
    }

    #[tokio::test]
    async fn test_empty_result_still_writes_every_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_result(&DivergenceResult::default())
            .await
            .unwrap();

        let names = std::fs::read_to_string(tmp.path().join(ALPHA_UNIQUE_BY_NAME)).unwrap();
        assert_eq!(names.trim(), "[]");
        let youngest = std::fs::read_to_string(tmp.path().join(YOUNGEST_NAMESAKES)).unwrap();
        assert_eq!(youngest.trim(), "[]");
    }

    #[tokio::test]
    async fn test_write_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let result = sample();

        storage.write_result(&result).await.unwrap();
        let loaded = storage.load_result().await.unwrap();

        assert_eq!(loaded, result);
    }

    #[tokio::test]
    async fn test_file_shapes() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.write_result(&sample()).await.unwrap();

        let version: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join(VERSION)).unwrap())
                .unwrap();
        assert_eq!(version, serde_json::json!({ "vim.x86_64": ["8.2", "9.0"] }));

        let identities: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join(BETA_UNIQUE_BY_IDENTITY)).unwrap(),
        )
        .unwrap();
        assert_eq!(
            identities["zsh-0:5.9-1.x86_64"]["architecture"],
            serde_json::json!("x86_64")
        );
    }

    #[tokio::test]
    async fn test_load_missing_result_fails() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert!(storage.load_result().await.is_err());
    }
}
