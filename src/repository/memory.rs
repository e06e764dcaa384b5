//! In-memory repository, acting both as a source and as a local store.
//!
//! Every capability call is recorded so tests can check which queries were made.

use std::{
    collections::{BTreeMap, HashMap},
    io::Cursor,
    sync::Mutex,
};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::pak::{
    Deleter, FileGetter, FileStream, FileWriter, InstalledLister, InstalledManifestGetter,
    Manifest, ManifestGetter, ManifestWriter, PakError, PakTime, Spec, SpecGetter, SpecIndex,
};

type FileKey = (String, String, String);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryState {
    pub index: SpecIndex,
    pub manifests: HashMap<(String, String), Manifest>,
    pub files: BTreeMap<FileKey, Vec<u8>>,
    pub installed: BTreeMap<String, Manifest>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    calls: Mutex<Vec<String>>,
}

impl MemoryRepository {
    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state().clone()
    }

    /// Publish a version, making it the current one
    pub fn publish(&self, id: &str, version: &str, files: &[(&str, &[u8])]) {
        let mut state = self.state();

        let spec = state.index.entry(id.to_owned()).or_insert_with(|| Spec {
            id: id.to_owned(),
            name: id.to_owned(),
            ..Default::default()
        });

        spec.current_version = version.to_owned();
        spec.updated = PakTime::now();

        if !spec.versions.iter().any(|v| v == version) {
            spec.versions.push(version.to_owned());
        }

        state.manifests.insert(
            (id.to_owned(), version.to_owned()),
            Manifest {
                id: id.to_owned(),
                name: id.to_owned(),
                version: version.to_owned(),
                date: PakTime::now(),
                files: files.iter().map(|(name, _)| (*name).to_owned()).collect(),
            },
        );

        for (name, content) in files {
            state.files.insert(
                (id.to_owned(), version.to_owned(), (*name).to_owned()),
                content.to_vec(),
            );
        }
    }

    pub fn set_updated(&self, id: &str, updated: PakTime) {
        if let Some(spec) = self.state().index.get_mut(id) {
            spec.updated = updated;
        }
    }

    pub fn remove_file(&self, id: &str, version: &str, file: &str) {
        self.state()
            .files
            .remove(&(id.to_owned(), version.to_owned(), file.to_owned()));
    }

    pub fn put_file(&self, id: &str, version: &str, file: &str, content: &[u8]) {
        self.state().files.insert(
            (id.to_owned(), version.to_owned(), file.to_owned()),
            content.to_vec(),
        );
    }

    pub fn put_manifest(&self, manifest: Manifest) {
        self.state()
            .installed
            .insert(manifest.id.clone(), manifest);
    }

    pub fn installed(&self, id: &str) -> Option<Manifest> {
        self.state().installed.get(id).cloned()
    }

    pub fn file(&self, id: &str, version: &str, file: &str) -> Option<Vec<u8>> {
        self.state()
            .files
            .get(&(id.to_owned(), version.to_owned(), file.to_owned()))
            .cloned()
    }

    /// Every `(version, file)` stored for a package, sorted
    pub fn files_of(&self, id: &str) -> Vec<(String, String)> {
        self.state()
            .files
            .keys()
            .filter(|(file_id, _, _)| file_id == id)
            .map(|(_, version, file)| (version.clone(), file.clone()))
            .collect()
    }
}

impl SpecGetter for MemoryRepository {
    async fn get_spec(&self, id: &str) -> Result<Option<Spec>> {
        self.record(format!("get_spec {id}"));
        Ok(self.state().index.get(id).cloned())
    }

    async fn list(&self) -> Result<SpecIndex> {
        self.record("list".to_owned());
        Ok(self.state().index.clone())
    }
}

impl ManifestGetter for MemoryRepository {
    async fn get_manifest(&self, id: &str, version: Option<&str>) -> Result<Option<Manifest>> {
        self.record(format!("get_manifest {id} {}", version.unwrap_or("latest")));

        let state = self.state();

        let version = match version {
            Some(version) => version.to_owned(),
            None => match state.index.get(id) {
                Some(spec) => spec.current_version.clone(),
                None => return Ok(None),
            },
        };

        Ok(state
            .manifests
            .get(&(id.to_owned(), version.clone()))
            .filter(|manifest| manifest.version == version)
            .cloned())
    }
}

impl FileGetter for MemoryRepository {
    async fn get_file(&self, id: &str, version: &str, file: &str) -> Result<FileStream> {
        self.record(format!("get_file {id} {version} {file}"));

        let content = self
            .file(id, version, file)
            .ok_or_else(|| PakError::FileNotFound {
                id: id.to_owned(),
                version: version.to_owned(),
                file: file.to_owned(),
            })?;

        Ok(Box::pin(Cursor::new(content)))
    }
}

impl InstalledManifestGetter for MemoryRepository {
    async fn get_installed_manifest(&self, id: &str) -> Result<Option<Manifest>> {
        self.record(format!("get_installed_manifest {id}"));
        Ok(self.installed(id))
    }
}

impl InstalledLister for MemoryRepository {
    async fn list_installed(&self) -> Result<Vec<Manifest>> {
        self.record("list_installed".to_owned());
        Ok(self.state().installed.values().cloned().collect())
    }
}

impl FileWriter for MemoryRepository {
    async fn write(&self, id: &str, version: &str, file: &str, mut data: FileStream) -> Result<()> {
        self.record(format!("write {id} {version} {file}"));

        let mut content = vec![];

        data.read_to_end(&mut content)
            .await
            .context("Failed to read file content")?;

        self.put_file(id, version, file, &content);

        Ok(())
    }
}

impl ManifestWriter for MemoryRepository {
    async fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        self.record(format!("write_manifest {}", manifest.id));
        self.put_manifest(manifest.clone());
        Ok(())
    }
}

impl Deleter for MemoryRepository {
    async fn delete(&self, id: &str) -> Result<()> {
        self.record(format!("delete {id}"));

        let mut state = self.state();

        let Some(manifest) = state.installed.remove(id) else {
            return Ok(());
        };

        for file in &manifest.files {
            state
                .files
                .remove(&(id.to_owned(), manifest.version.clone(), file.clone()));
        }

        Ok(())
    }
}
