//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and concurrency settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Metadata cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Result file settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logical repositories, each a list of feed URLs
    #[serde(default = "defaults::repositories")]
    pub repositories: Vec<RepositoryConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::validation("fetch.max_concurrent must be > 0"));
        }
        if self.repositories.len() < 2 {
            return Err(AppError::validation(
                "At least two repositories must be defined",
            ));
        }

        let mut names = HashSet::new();
        for repo in &self.repositories {
            if repo.name.trim().is_empty() {
                return Err(AppError::validation("Repository with empty name"));
            }
            if !names.insert(repo.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate repository name: {}",
                    repo.name
                )));
            }
            if repo.urls.is_empty() {
                return Err(AppError::validation(format!(
                    "Repository {} has no feed URLs",
                    repo.name
                )));
            }
            for url in &repo.urls {
                Url::parse(url).map_err(|e| {
                    AppError::validation(format!("Repository {}: bad URL {url}: {e}", repo.name))
                })?;
            }
        }
        Ok(())
    }

    /// Find a repository by name.
    pub fn repository(&self, name: &str) -> Result<&RepositoryConfig> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| AppError::config(format!("Unknown repository: {name}")))
    }

    /// Resolve the alpha/beta pair, defaulting to the first two repositories.
    pub fn select_pair(
        &self,
        alpha: Option<&str>,
        beta: Option<&str>,
    ) -> Result<(&RepositoryConfig, &RepositoryConfig)> {
        let pick = |name: Option<&str>, index: usize| match name {
            Some(name) => self.repository(name),
            None => self.repositories.get(index).ok_or_else(|| {
                AppError::config(format!("No repository configured at position {index}"))
            }),
        };
        let alpha = pick(alpha, 0)?;
        let beta = pick(beta, 1)?;
        if alpha.name == beta.name {
            return Err(AppError::config(format!(
                "Cannot compare repository {} with itself",
                alpha.name
            )));
        }
        Ok((alpha, beta))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
            repositories: defaults::repositories(),
        }
    }
}

/// HTTP client and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent feed loads per repository
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Metadata cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::cache_enabled")]
    pub enabled: bool,

    /// Directory holding cached feed metadata
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,

    /// Seconds before a cached feed expires
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::cache_enabled(),
            dir: defaults::cache_dir(),
            ttl_secs: defaults::cache_ttl(),
        }
    }
}

/// Result file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the result files are written to
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
        }
    }
}

/// A logical repository made of one or more feeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository name (e.g., "redos-7.3")
    pub name: String,

    /// Feed base URLs (e.g., the "os" and "updates" trees)
    pub urls: Vec<String>,
}

mod defaults {
    use std::path::PathBuf;

    use super::RepositoryConfig;

    // Fetch defaults
    pub fn user_agent() -> String {
        concat!("repodiff/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        120
    }
    pub fn max_concurrent() -> usize {
        8
    }

    // Cache defaults
    pub fn cache_enabled() -> bool {
        true
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from(".cache/repodiff")
    }
    pub fn cache_ttl() -> u64 {
        3600
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("output")
    }

    fn feeds(base: &str) -> Vec<String> {
        ["os", "updates", "kernel-testing"]
            .iter()
            .map(|feed| format!("{base}/{feed}/"))
            .collect()
    }

    // Repository defaults
    pub fn repositories() -> Vec<RepositoryConfig> {
        vec![
            RepositoryConfig {
                name: "redos-7.3".to_string(),
                urls: feeds("http://repo.red-soft.ru/redos/7.3/x86_64"),
            },
            RepositoryConfig {
                name: "redos-8.0".to_string(),
                urls: feeds("http://repo.red-soft.ru/redos/8.0/x86_64"),
            },
        ]
    }
}
