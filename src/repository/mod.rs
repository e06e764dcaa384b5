pub mod cache;
pub mod fs;
pub mod http;
#[cfg(test)]
pub mod memory;

use anyhow::Result;

use crate::pak::{FileGetter, FileStream, Manifest, ManifestGetter, Spec, SpecGetter, SpecIndex};

use self::{cache::CachedSource, fs::FsRepository, http::HttpRepository};

/// Source repository selected from the configuration
pub enum Remote {
    Http(CachedSource<HttpRepository>),
    Fs(FsRepository),
}

impl SpecGetter for Remote {
    async fn get_spec(&self, id: &str) -> Result<Option<Spec>> {
        match self {
            Self::Http(repo) => repo.get_spec(id).await,
            Self::Fs(repo) => repo.get_spec(id).await,
        }
    }

    async fn list(&self) -> Result<SpecIndex> {
        match self {
            Self::Http(repo) => repo.list().await,
            Self::Fs(repo) => repo.list().await,
        }
    }
}

impl ManifestGetter for Remote {
    async fn get_manifest(&self, id: &str, version: Option<&str>) -> Result<Option<Manifest>> {
        match self {
            Self::Http(repo) => repo.get_manifest(id, version).await,
            Self::Fs(repo) => repo.get_manifest(id, version).await,
        }
    }
}

impl FileGetter for Remote {
    async fn get_file(&self, id: &str, version: &str, file: &str) -> Result<FileStream> {
        match self {
            Self::Http(repo) => repo.get_file(id, version, file).await,
            Self::Fs(repo) => repo.get_file(id, version, file).await,
        }
    }
}
