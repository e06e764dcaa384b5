use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use log::debug;
use reqwest::Url;
use serde::Deserialize;
use tokio::fs;

use crate::{
    repository::{cache::CachedSource, fs::FsRepository, http::HttpRepository, Remote},
    yaml,
};

pub const CONFIG_FILE_NAME: &str = "pakman.yml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub local_path: String,
    pub remote_path: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_timeout() -> u64 {
    30
}

/// Where the source repository lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLocation {
    Url(Url),
    Dir(PathBuf),
}

/// Configuration with every path made absolute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub local_dir: PathBuf,
    pub remote: RemoteLocation,
    pub debug: bool,
    pub cache_ttl: Duration,
    pub timeout: Duration,
}

impl Config {
    pub fn parse(content: &[u8]) -> Result<Self> {
        let config: Self = yaml::decode(content)?;

        if config.local_path.trim().is_empty() {
            bail!("Configuration's 'localPath' must not be empty");
        }

        if config.remote_path.trim().is_empty() {
            bail!("Configuration's 'remotePath' must not be empty");
        }

        Ok(config)
    }

    /// Resolve relative paths against the directory the configuration file lives in
    pub fn resolve(self, base_dir: &Path) -> Result<ResolvedConfig> {
        let Self {
            local_path,
            remote_path,
            debug,
            cache_ttl,
            timeout,
        } = self;

        let remote = if remote_path.starts_with("http://") || remote_path.starts_with("https://")
        {
            let mut url = Url::parse(&remote_path)
                .with_context(|| format!("Invalid remote URL {remote_path:?}"))?;

            // Make sure files are resolved under the URL's path, not next to it
            if !url.path().ends_with('/') {
                url.set_path(&format!("{}/", url.path()));
            }

            RemoteLocation::Url(url)
        } else {
            RemoteLocation::Dir(base_dir.join(remote_path))
        };

        Ok(ResolvedConfig {
            local_dir: base_dir.join(local_path),
            remote,
            debug,
            cache_ttl: Duration::from_secs(cache_ttl),
            timeout: Duration::from_secs(timeout),
        })
    }
}

impl ResolvedConfig {
    pub fn remote_repository(&self) -> Result<Remote> {
        match &self.remote {
            RemoteLocation::Url(url) => {
                let repo = HttpRepository::new(url.clone(), self.timeout)?;
                Ok(Remote::Http(
                    CachedSource::new(repo).with_ttl(self.cache_ttl),
                ))
            }

            RemoteLocation::Dir(dir) => Ok(Remote::Fs(FsRepository::new(dir.clone()))),
        }
    }

    pub fn local_repository(&self) -> FsRepository {
        FsRepository::new(self.local_dir.clone())
    }
}

/// Find the configuration file to use
///
/// An explicit path always wins, then `pakman.yml` in the current directory,
/// then the one in the user's configuration directory.
pub fn locate(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let local = std::env::current_dir()
        .context("Failed to get the current directory")?
        .join(CONFIG_FILE_NAME);

    if local.is_file() {
        return Ok(local);
    }

    let global = dirs::config_dir()
        .context("Failed to get path to the user's configuration directory")?
        .join("pakman")
        .join(CONFIG_FILE_NAME);

    if global.is_file() {
        return Ok(global);
    }

    bail!(
        "No configuration file found, create a {CONFIG_FILE_NAME} file in the current directory or at {}",
        global.display()
    )
}

pub async fn load(path: &Path) -> Result<ResolvedConfig> {
    debug!("Loading configuration from {}", path.display());

    let content = fs::read(path)
        .await
        .with_context(|| format!("Failed to read configuration file at {}", path.display()))?;

    let config = Config::parse(&content)
        .with_context(|| format!("Invalid configuration file at {}", path.display()))?;

    let path = fs::canonicalize(path)
        .await
        .with_context(|| format!("Failed to canonicalize path {}", path.display()))?;

    let base_dir = path
        .parent()
        .context("Configuration file has no parent directory")?;

    config.resolve(base_dir)
}
