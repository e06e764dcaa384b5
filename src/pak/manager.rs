use anyhow::{Context, Result};

use super::{
    error::PakError,
    log::{NoopLogger, PakLogger},
    repository::{LocalRepository, SourceRepository},
    spec::{InstallSpec, Manifest, Spec, SpecIndex, UpgradableSpec},
};

/// Installs, upgrades and removes paks from a source repository into a local one
///
/// Every operation handles its packages one after the other, and stops at the first failure.
/// Packages handled before the failure are left as they are.
pub struct Manager<L, S> {
    local: L,
    remote: S,
    logger: Box<dyn PakLogger>,
}

impl<L: LocalRepository, S: SourceRepository> Manager<L, S> {
    pub fn new(local: L, remote: S) -> Self {
        Self {
            local,
            remote,
            logger: Box::new(NoopLogger),
        }
    }

    pub fn with_logger(mut self, logger: impl PakLogger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    #[cfg(test)]
    pub fn local(&self) -> &L {
        &self.local
    }

    #[cfg(test)]
    pub fn remote(&self) -> &S {
        &self.remote
    }

    /// Install the provided paks
    ///
    /// An already-installed pak is replaced by the requested version, unless
    /// that version is the one already installed, in which case nothing happens.
    pub async fn install(&self, specs: &[InstallSpec]) -> Result<()> {
        for spec in specs {
            self.logger.info(format_args!("Installing {spec}"));

            self.install_one(spec, false)
                .await
                .with_context(|| format!("Failed to install pak {spec}"))?;
        }

        Ok(())
    }

    async fn install_one(&self, to_install: &InstallSpec, upgrade: bool) -> Result<()> {
        let id = to_install.id.as_str();

        if id.is_empty() {
            return Err(PakError::InvalidInstallSpec.into());
        }

        let existing = self
            .local
            .get_installed_manifest(id)
            .await
            .context("Failed to get the installed manifest")?;

        let version = match to_install.version.as_deref().filter(|v| !v.is_empty()) {
            Some(version) => version.to_owned(),

            None => {
                let spec = self
                    .remote
                    .get_spec(id)
                    .await
                    .context("Failed to get the pak's spec")?
                    .ok_or_else(|| PakError::SpecNotFound { id: id.to_owned() })?;

                spec.current_version
            }
        };

        if let Some(existing) = &existing {
            if existing.version == version {
                self.logger
                    .debug(format_args!("Pak {id}@{version} is already installed"));

                return Ok(());
            }

            if upgrade {
                self.logger.info(format_args!(
                    "Upgrading {id} from {} to {version}",
                    existing.version
                ));
            }
        }

        let manifest = self
            .remote
            .get_manifest(id, Some(&version))
            .await
            .context("Failed to get the remote manifest")?
            .ok_or_else(|| PakError::ManifestNotFound {
                id: id.to_owned(),
                version: version.clone(),
            })?;

        // Nothing restores the previous version if a later step fails,
        // installing again starts over from a clean state
        if existing.is_some() {
            self.uninstall_one(id)
                .await
                .context("Failed to uninstall the existing version")?;
        }

        for file in &manifest.files {
            self.download_file(id, &version, file)
                .await
                .with_context(|| format!("Failed to download file {file:?}"))?;
        }

        self.local
            .write_manifest(&manifest)
            .await
            .context("Failed to write the local manifest")?;

        Ok(())
    }

    async fn download_file(&self, id: &str, version: &str, file: &str) -> Result<()> {
        let data = self
            .remote
            .get_file(id, version, file)
            .await
            .context("Failed to get the remote file")?;

        self.local
            .write(id, version, file, data)
            .await
            .context("Failed to write the local file")
    }

    /// Uninstall the provided paks, ignoring the ones that aren't installed
    pub async fn uninstall(&self, ids: &[String]) -> Result<()> {
        for id in ids {
            self.logger.info(format_args!("Uninstalling {id}"));

            self.uninstall_one(id)
                .await
                .with_context(|| format!("Failed to uninstall pak {id}"))?;
        }

        Ok(())
    }

    async fn uninstall_one(&self, id: &str) -> Result<()> {
        self.local
            .delete(id)
            .await
            .context("Failed to delete the local pak")
    }

    /// Upgrade the provided paks, or every installed pak to its latest version if none is provided
    pub async fn upgrade(&self, specs: &[InstallSpec]) -> Result<()> {
        let specs = if specs.is_empty() {
            self.local
                .list_installed()
                .await
                .context("Failed to list local paks")?
                .into_iter()
                .map(|manifest| InstallSpec::latest(manifest.id))
                .collect()
        } else {
            specs.to_vec()
        };

        for spec in &specs {
            self.install_one(spec, true)
                .await
                .with_context(|| format!("Failed to upgrade pak {}", spec.id))?;
        }

        Ok(())
    }

    /// List the installed paks the source publishes another version of
    pub async fn upgradable(&self) -> Result<Vec<UpgradableSpec>> {
        let installed = self
            .local
            .list_installed()
            .await
            .context("Failed to list local paks")?;

        let mut upgradable = vec![];

        for pak in installed {
            let spec = self
                .remote
                .get_spec(&pak.id)
                .await
                .with_context(|| format!("Failed to get the latest version of pak {}", pak.id))?
                .ok_or_else(|| PakError::SpecNotFound { id: pak.id.clone() })?;

            if spec.current_version != pak.version {
                upgradable.push(upgradable_spec(pak, spec));
            }
        }

        Ok(upgradable)
    }

    /// List every pak of the source repository
    pub async fn list(&self) -> Result<SpecIndex> {
        self.remote.list().await.context("Failed to list remote paks")
    }

    /// List every installed pak
    pub async fn list_installed(&self) -> Result<Vec<Manifest>> {
        self.local
            .list_installed()
            .await
            .context("Failed to list local paks")
    }
}

fn upgradable_spec(installed: Manifest, latest: Spec) -> UpgradableSpec {
    let Manifest {
        id,
        name,
        version,
        date,
        files: _,
    } = installed;

    UpgradableSpec {
        spec: Spec {
            id,
            name,
            description: latest.description,
            current_version: version,
            updated: date,
            versions: latest.versions,
        },
        latest_version: latest.current_version,
        last_updated: latest.updated,
    }
}
