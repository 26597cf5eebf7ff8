//! repodiff CLI
//!
//! Compares the package inventories of two configured repositories.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use repodiff::{
    error::Result,
    models::Config,
    pipeline,
    services::{CachedLoader, FileCache, MetadataLoader, RepomdLoader},
    storage::LocalStorage,
    utils::http,
};

/// repodiff - RPM repository comparison
#[derive(Parser, Debug)]
#[command(
    name = "repodiff",
    version,
    about = "Compare the package inventories of two RPM repositories"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two repositories and write the result files
    Diff {
        /// Repository treated as alpha (default: first configured)
        #[arg(long)]
        alpha: Option<String>,

        /// Repository treated as beta (default: second configured)
        #[arg(long)]
        beta: Option<String>,

        /// Output directory (default: output.dir from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Always fetch metadata, bypassing the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the primary metadata checksum of a feed
    Checksum {
        /// Feed base URL
        url: String,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let client = http::create_async_client(&config.fetch)?;

    match cli.command {
        Command::Diff {
            alpha,
            beta,
            output,
            no_cache,
        } => {
            config.validate()?;
            let (alpha, beta) = config.select_pair(alpha.as_deref(), beta.as_deref())?;

            let repomd = RepomdLoader::new(client);
            let loader: Arc<dyn MetadataLoader> = if config.cache.enabled && !no_cache {
                log::debug!("Using metadata cache at {}", config.cache.dir.display());
                Arc::new(CachedLoader::new(
                    repomd,
                    FileCache::new(&config.cache.dir),
                    config.cache.ttl_secs,
                ))
            } else {
                Arc::new(repomd)
            };

            let storage = LocalStorage::new(output.unwrap_or_else(|| config.output.dir.clone()));
            let outcome = pipeline::run_diff(&config, alpha, beta, loader, &storage).await?;

            log::info!("Summary ({} vs {}):", alpha.name, beta.name);
            for (category, count) in outcome.result.counts() {
                log::info!("    {}: {}", category, count);
            }
        }

        Command::Checksum { url } => {
            let loader = RepomdLoader::new(client);
            match loader.primary_checksum(&url).await? {
                Some(checksum) => println!("{} {}", checksum.algorithm, checksum.value),
                None => log::warn!("No primary metadata listed in {}", url),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            for repo in &config.repositories {
                log::info!("✓ {} ({} feeds)", repo.name, repo.urls.len());
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
