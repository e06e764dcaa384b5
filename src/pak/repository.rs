//! Capabilities a repository may offer to the [`Manager`](super::Manager).
//!
//! Each trait is a single capability, so an adapter only implements what it
//! actually supports. [`SourceRepository`] and [`LocalRepository`] are the two
//! capability sets the manager depends on and are implemented automatically
//! for any type providing all of their members.
//!
//! "Not found" is never an error for lookups: it is reported as `Ok(None)`.

use std::pin::Pin;

use anyhow::Result;
use tokio::io::AsyncRead;

use super::spec::{Manifest, Spec, SpecIndex};

/// Content of a single package file
pub type FileStream = Pin<Box<dyn AsyncRead + Send>>;

pub trait SpecGetter {
    /// Get the catalog entry of a package
    async fn get_spec(&self, id: &str) -> Result<Option<Spec>>;

    /// Get the whole catalog
    async fn list(&self) -> Result<SpecIndex>;
}

pub trait ManifestGetter {
    /// Get the manifest of a package version, or of its latest version if `version` is `None`
    ///
    /// A manifest whose embedded version differs from the requested one is reported as not found.
    async fn get_manifest(&self, id: &str, version: Option<&str>) -> Result<Option<Manifest>>;
}

pub trait FileGetter {
    /// Open a file of a package version
    ///
    /// Fails with [`PakError::FileNotFound`](super::PakError::FileNotFound) if the file doesn't exist.
    async fn get_file(&self, id: &str, version: &str, file: &str) -> Result<FileStream>;
}

pub trait InstalledManifestGetter {
    /// Get the manifest of the installed version of a package
    async fn get_installed_manifest(&self, id: &str) -> Result<Option<Manifest>>;
}

pub trait InstalledLister {
    async fn list_installed(&self) -> Result<Vec<Manifest>>;
}

pub trait FileWriter {
    /// Store a file at `(id, version, file)`, replacing any previous content
    async fn write(&self, id: &str, version: &str, file: &str, data: FileStream) -> Result<()>;
}

pub trait ManifestWriter {
    async fn write_manifest(&self, manifest: &Manifest) -> Result<()>;
}

pub trait Deleter {
    /// Remove the manifest of a package and every file it lists
    ///
    /// Does nothing if the package isn't installed.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Repository packages can be fetched from
pub trait SourceRepository: SpecGetter + ManifestGetter + FileGetter {}

impl<T: SpecGetter + ManifestGetter + FileGetter> SourceRepository for T {}

/// Repository packages are installed into
pub trait LocalRepository:
    InstalledManifestGetter + InstalledLister + FileWriter + ManifestWriter + Deleter
{
}

impl<T> LocalRepository for T where
    T: InstalledManifestGetter + InstalledLister + FileWriter + ManifestWriter + Deleter
{
}
