//! Repository stored in a local directory.
//!
//! As a local store, each installed package lives in its own directory:
//!
//! ```text
//! <root>/<id>/manifest
//! <root>/<id>/<file>
//! ```
//!
//! As a source, the catalog and every published version are laid out as:
//!
//! ```text
//! <root>/index.yml
//! <root>/<id>/<version>/manifest.yml
//! <root>/<id>/<version>/<file>
//! ```

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    pak::{
        compare_ids, Deleter, FileGetter, FileStream, FileWriter, InstalledLister,
        InstalledManifestGetter, Manifest, ManifestGetter, ManifestWriter, PakError, Spec,
        SpecGetter, SpecIndex,
    },
    yaml,
};

pub const INDEX_FILE: &str = "index.yml";
pub const REMOTE_MANIFEST_FILE: &str = "manifest.yml";
pub const LOCAL_MANIFEST_FILE: &str = "manifest";

pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pak_dir(&self, id: &str) -> Result<PathBuf> {
        let path = relative_path(id)?;

        // Installed paks are only looked up one level below the root
        if path.components().count() != 1 {
            bail!("Invalid pak ID {id:?}: must not contain path separators");
        }

        Ok(self.root.join(path))
    }

    fn local_manifest_path(&self, id: &str) -> Result<PathBuf> {
        Ok(self.pak_dir(id)?.join(LOCAL_MANIFEST_FILE))
    }

    fn local_file_path(&self, id: &str, file: &str) -> Result<PathBuf> {
        Ok(self.pak_dir(id)?.join(relative_path(file)?))
    }

    fn is_local_manifest(file: &str) -> bool {
        Path::new(file) == Path::new(LOCAL_MANIFEST_FILE)
    }

    fn version_dir(&self, id: &str, version: &str) -> Result<PathBuf> {
        Ok(self.pak_dir(id)?.join(relative_path(version)?))
    }

    async fn read_manifest(path: &Path) -> Result<Option<Manifest>> {
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read manifest at {}", path.display()))
            }
        };

        yaml::decode(&content)
            .map(Some)
            .with_context(|| format!("Failed to parse manifest at {}", path.display()))
    }

    async fn index(&self) -> Result<SpecIndex> {
        let path = self.root.join(INDEX_FILE);

        let content = fs::read(&path)
            .await
            .with_context(|| format!("Failed to read index file at {}", path.display()))?;

        yaml::decode(&content)
            .with_context(|| format!("Failed to parse index file at {}", path.display()))
    }
}

/// Turn a package ID, version or file name into a path that can't escape its parent directory
fn relative_path(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);

    if name.is_empty()
        || !path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        bail!("Invalid path {name:?}: only plain relative paths are allowed");
    }

    Ok(path.to_owned())
}

async fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    Ok(())
}

impl InstalledManifestGetter for FsRepository {
    async fn get_installed_manifest(&self, id: &str) -> Result<Option<Manifest>> {
        Self::read_manifest(&self.local_manifest_path(id)?).await
    }
}

impl InstalledLister for FsRepository {
    async fn list_installed(&self) -> Result<Vec<Manifest>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read directory {}", self.root.display())
                })
            }
        };

        let mut installed = vec![];

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to read directory {}", self.root.display()))?
        {
            let path = entry.path().join(LOCAL_MANIFEST_FILE);

            if !fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }

            let manifest = match Self::read_manifest(&path).await {
                Ok(Some(manifest)) => manifest,
                Ok(None) => continue,
                Err(err) => {
                    warn!("Ignoring invalid manifest: {err:#}");
                    continue;
                }
            };

            // A manifest only counts if it sits in its own package's directory
            if entry.file_name().to_str() != Some(manifest.id.as_str()) {
                debug!(
                    "Ignoring manifest of pak {} found at {}",
                    manifest.id,
                    path.display()
                );
                continue;
            }

            installed.push(manifest);
        }

        installed.sort_by(|a, b| compare_ids(&a.id, &b.id));

        Ok(installed)
    }
}

impl FileWriter for FsRepository {
    async fn write(&self, id: &str, _version: &str, file: &str, mut data: FileStream) -> Result<()> {
        if Self::is_local_manifest(file) {
            bail!("File {file:?} of pak {id} would overwrite its local manifest");
        }

        let path = self.local_file_path(id, file)?;

        create_parent_dir(&path).await?;

        let mut out = fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create file {}", path.display()))?;

        tokio::io::copy(&mut data, &mut out)
            .await
            .with_context(|| format!("Failed to write file {}", path.display()))?;

        out.flush()
            .await
            .with_context(|| format!("Failed to flush file {}", path.display()))?;

        Ok(())
    }
}

impl ManifestWriter for FsRepository {
    async fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        let path = self.local_manifest_path(&manifest.id)?;

        create_parent_dir(&path).await?;

        fs::write(&path, yaml::encode(manifest)?)
            .await
            .with_context(|| format!("Failed to write manifest at {}", path.display()))
    }
}

impl Deleter for FsRepository {
    async fn delete(&self, id: &str) -> Result<()> {
        let Some(manifest) = self.get_installed_manifest(id).await? else {
            return Ok(());
        };

        let pak_dir = self.pak_dir(id)?;

        for file in &manifest.files {
            if Self::is_local_manifest(file) {
                warn!("Skipping file {file:?} of pak {id} as it is the local manifest");
                continue;
            }

            let path = self.local_file_path(id, file)?;

            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!("File {} was already removed", path.display());
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to remove file {}", path.display()))
                }
            }

            prune_empty_dirs(&path, &pak_dir).await;
        }

        let manifest_path = self.local_manifest_path(id)?;

        fs::remove_file(&manifest_path)
            .await
            .with_context(|| format!("Failed to remove manifest at {}", manifest_path.display()))?;

        // Other files may still live here, so failing is fine
        let _ = fs::remove_dir(&pak_dir).await;

        Ok(())
    }
}

/// Remove the now-empty directories between a deleted file and its package directory
async fn prune_empty_dirs(removed: &Path, pak_dir: &Path) {
    let mut dir = removed.parent();

    while let Some(current) = dir {
        if current == pak_dir || !current.starts_with(pak_dir) {
            break;
        }

        if fs::remove_dir(current).await.is_err() {
            break;
        }

        dir = current.parent();
    }
}

impl SpecGetter for FsRepository {
    async fn get_spec(&self, id: &str) -> Result<Option<Spec>> {
        let mut index = self.index().await?;
        Ok(index.remove(id))
    }

    async fn list(&self) -> Result<SpecIndex> {
        self.index().await
    }
}

impl ManifestGetter for FsRepository {
    async fn get_manifest(&self, id: &str, version: Option<&str>) -> Result<Option<Manifest>> {
        let version = match version {
            Some(version) => version.to_owned(),
            None => match self.get_spec(id).await? {
                Some(spec) => spec.current_version,
                None => return Ok(None),
            },
        };

        let path = self.version_dir(id, &version)?.join(REMOTE_MANIFEST_FILE);

        let manifest = Self::read_manifest(&path).await?;

        Ok(manifest.filter(|manifest| manifest.version == version))
    }
}

impl FileGetter for FsRepository {
    async fn get_file(&self, id: &str, version: &str, file: &str) -> Result<FileStream> {
        let path = self.version_dir(id, version)?.join(relative_path(file)?);

        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),

            Err(err) if err.kind() == ErrorKind::NotFound => Err(PakError::FileNotFound {
                id: id.to_owned(),
                version: version.to_owned(),
                file: file.to_owned(),
            }
            .into()),

            Err(err) => {
                Err(err).with_context(|| format!("Failed to open file {}", path.display()))
            }
        }
    }
}
