//! Source repository served over HTTP.
//!
//! Uses the same layout as a directory source, relative to a base URL:
//! the index lives at `<base>/index.yml` and every version at
//! `<base>/<id>/<version>/manifest.yml`, next to its files.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use reqwest::{Client, Response, StatusCode, Url};
use tokio_stream::StreamExt;
use tokio_util::io::StreamReader;

use crate::{
    pak::{FileGetter, FileStream, Manifest, ManifestGetter, PakError, Spec, SpecGetter, SpecIndex},
    yaml,
};

use super::fs::{INDEX_FILE, REMOTE_MANIFEST_FILE};

pub struct HttpRepository {
    base_url: Url,
    client: Client,
}

impl HttpRepository {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pakman/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, client })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let segments = segments
            .iter()
            .flat_map(|segment| segment.split('/'))
            .collect::<Vec<_>>();

        if let Some(invalid) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            bail!("Invalid path segment {invalid:?} in {}", segments.join("/"));
        }

        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| anyhow!("URL {} cannot be used as a base", self.base_url))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Perform a GET request, `None` meaning the server answered 404
    async fn get(&self, url: Url) -> Result<Option<Response>> {
        debug!("Fetching: {url}");

        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to perform GET request on {url}"))?;

        let status = res.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status.is_client_error() || status.is_server_error() {
            bail!("Failed to fetch {url}: server answered {status}");
        }

        Ok(Some(res))
    }

    async fn get_bytes(&self, url: Url) -> Result<Option<Vec<u8>>> {
        let Some(res) = self.get(url.clone()).await? else {
            return Ok(None);
        };

        let bytes = res
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;

        Ok(Some(bytes.to_vec()))
    }

    async fn index(&self) -> Result<SpecIndex> {
        let url = self.url(&[INDEX_FILE])?;

        let content = self
            .get_bytes(url.clone())
            .await?
            .with_context(|| format!("No index file found at {url}"))?;

        yaml::decode(&content).with_context(|| format!("Failed to parse index file from {url}"))
    }
}

impl SpecGetter for HttpRepository {
    async fn get_spec(&self, id: &str) -> Result<Option<Spec>> {
        let mut index = self.index().await?;
        Ok(index.remove(id))
    }

    async fn list(&self) -> Result<SpecIndex> {
        self.index().await
    }
}

impl ManifestGetter for HttpRepository {
    async fn get_manifest(&self, id: &str, version: Option<&str>) -> Result<Option<Manifest>> {
        let version = match version {
            Some(version) => version.to_owned(),
            None => match self.get_spec(id).await? {
                Some(spec) => spec.current_version,
                None => return Ok(None),
            },
        };

        let url = self.url(&[id, &version, REMOTE_MANIFEST_FILE])?;

        let Some(content) = self.get_bytes(url.clone()).await? else {
            return Ok(None);
        };

        let manifest: Manifest = yaml::decode(&content)
            .with_context(|| format!("Failed to parse manifest from {url}"))?;

        if manifest.version != version {
            debug!(
                "Manifest at {url} is for version {} instead of {version}",
                manifest.version
            );

            return Ok(None);
        }

        Ok(Some(manifest))
    }
}

impl FileGetter for HttpRepository {
    async fn get_file(&self, id: &str, version: &str, file: &str) -> Result<FileStream> {
        let url = self.url(&[id, version, file])?;

        let res = self
            .get(url)
            .await?
            .ok_or_else(|| PakError::FileNotFound {
                id: id.to_owned(),
                version: version.to_owned(),
                file: file.to_owned(),
            })?;

        let stream = res.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other));

        Ok(Box::pin(StreamReader::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::{
        pak::{find_pak_error, InstallSpec, Manager},
        repository::{cache::CachedSource, memory::MemoryRepository},
    };

    const INDEX: &str = "\
widget:
  id: widget
  name: Widget
  description: Does things
  currentVersion: 2.0.0
  updated: 2024-01-02 03:04:05 +0000
  versions: [1.0.0, 2.0.0]
";

    const MANIFEST: &str = "\
id: widget
name: Widget
version: 2.0.0
date: 2024-01-02 03:04:05 +0000
files: [bin/widget]
";

    fn repository(server: &MockServer) -> HttpRepository {
        let base_url = Url::parse(&format!("{}/paks/", server.base_url())).unwrap();
        HttpRepository::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_catalog() {
        let server = MockServer::start();
        let index = server.mock(|when, then| {
            when.method(GET).path("/paks/index.yml");
            then.status(200).body(INDEX);
        });

        let repo = repository(&server);

        let spec = repo.get_spec("widget").await.unwrap().unwrap();
        assert_eq!(spec.current_version, "2.0.0");
        assert_eq!(spec.versions, ["1.0.0", "2.0.0"]);

        assert!(repo.get_spec("ghost").await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap().len(), 1);

        index.assert_calls(3);
    }

    #[tokio::test]
    async fn missing_index_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/paks/index.yml");
            then.status(404);
        });

        assert!(repository(&server).list().await.is_err());
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/paks/index.yml");
            then.status(500);
        });

        let err = repository(&server).list().await.unwrap_err();

        assert!(format!("{err:#}").contains("500"));
        assert!(find_pak_error(&err).is_none());
    }

    #[tokio::test]
    async fn fetches_manifests() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/paks/index.yml");
            then.status(200).body(INDEX);
        });
        server.mock(|when, then| {
            when.method(GET).path("/paks/widget/2.0.0/manifest.yml");
            then.status(200).body(MANIFEST);
        });
        // Served from the wrong directory
        server.mock(|when, then| {
            when.method(GET).path("/paks/widget/1.0.0/manifest.yml");
            then.status(200).body(MANIFEST);
        });

        let repo = repository(&server);

        let latest = repo.get_manifest("widget", None).await.unwrap().unwrap();
        assert_eq!(latest.version, "2.0.0");
        assert_eq!(latest.files, ["bin/widget"]);

        assert!(repo
            .get_manifest("widget", Some("1.0.0"))
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .get_manifest("widget", Some("3.0.0"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn streams_files() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/paks/widget/2.0.0/bin/widget");
            then.status(200).body("#!/bin/sh");
        });

        let mut content = String::new();

        repository(&server)
            .get_file("widget", "2.0.0", "bin/widget")
            .await
            .unwrap()
            .read_to_string(&mut content)
            .await
            .unwrap();

        assert_eq!(content, "#!/bin/sh");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let server = MockServer::start();

        let err = match repository(&server).get_file("widget", "2.0.0", "nope").await {
            Ok(_) => panic!("file should be missing"),
            Err(err) => err,
        };

        assert!(matches!(
            find_pak_error(&err),
            Some(PakError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_escaping_segments() {
        let server = MockServer::start();
        let repo = repository(&server);

        assert!(repo.get_file("widget", "2.0.0", "../secret").await.is_err());
        assert!(repo.get_file("widget", "..", "file").await.is_err());
    }

    #[tokio::test]
    async fn installs_through_cached_source() {
        let server = MockServer::start();
        let index = server.mock(|when, then| {
            when.method(GET).path("/paks/index.yml");
            then.status(200).body(INDEX);
        });
        server.mock(|when, then| {
            when.method(GET).path("/paks/widget/2.0.0/manifest.yml");
            then.status(200).body(MANIFEST);
        });
        server.mock(|when, then| {
            when.method(GET).path("/paks/widget/2.0.0/bin/widget");
            then.status(200).body("#!/bin/sh");
        });

        let manager = Manager::new(
            MemoryRepository::default(),
            CachedSource::new(repository(&server)),
        );

        manager.install(&[InstallSpec::latest("widget")]).await.unwrap();
        manager.install(&[InstallSpec::latest("widget")]).await.unwrap();
        assert!(manager.upgradable().await.unwrap().is_empty());

        assert_eq!(
            manager.local().file("widget", "2.0.0", "bin/widget").unwrap(),
            b"#!/bin/sh"
        );

        index.assert_calls(1);
    }
}
