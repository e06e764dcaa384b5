//! Caching layer for source catalogs.
//!
//! Keeps the last fetched index for a configurable TTL so that looking up
//! several specs in a row only downloads the index once.

use std::{
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use anyhow::Result;
use log::debug;
use tokio::time::Instant;

use crate::pak::{
    FileGetter, FileStream, Manifest, ManifestGetter, Spec, SpecGetter, SpecIndex,
};

/// Default cache TTL (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CachedIndex {
    index: SpecIndex,
    fetched_at: Instant,
}

/// Source wrapper serving `list` and `get_spec` from a single cached index
///
/// Failed fetches are not cached, the next read simply tries again.
/// Manifests and files are never cached.
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<Option<CachedIndex>>,
    ttl: Duration,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(None),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cache(&self) -> MutexGuard<'_, Option<CachedIndex>> {
        self.cache.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn cached_index(&self) -> Option<SpecIndex> {
        let mut cache = self.cache();

        if cache
            .as_ref()
            .is_some_and(|cached| cached.fetched_at.elapsed() > self.ttl)
        {
            debug!("Index cache expired");
            *cache = None;
        }

        cache.as_ref().map(|cached| cached.index.clone())
    }
}

impl<S: SpecGetter> CachedSource<S> {
    async fn index(&self) -> Result<SpecIndex> {
        if let Some(index) = self.cached_index() {
            debug!("Index cache hit");
            return Ok(index);
        }

        debug!("Index cache miss, fetching index...");

        let index = self.inner.list().await?;

        *self.cache() = Some(CachedIndex {
            index: index.clone(),
            fetched_at: Instant::now(),
        });

        Ok(index)
    }
}

impl<S: SpecGetter> SpecGetter for CachedSource<S> {
    async fn get_spec(&self, id: &str) -> Result<Option<Spec>> {
        let mut index = self.index().await?;
        Ok(index.remove(id))
    }

    async fn list(&self) -> Result<SpecIndex> {
        self.index().await
    }
}

impl<S: ManifestGetter> ManifestGetter for CachedSource<S> {
    async fn get_manifest(&self, id: &str, version: Option<&str>) -> Result<Option<Manifest>> {
        self.inner.get_manifest(id, version).await
    }
}

impl<S: FileGetter> FileGetter for CachedSource<S> {
    async fn get_file(&self, id: &str, version: &str, file: &str) -> Result<FileStream> {
        self.inner.get_file(id, version, file).await
    }
}
