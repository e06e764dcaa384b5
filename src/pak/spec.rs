use std::{collections::HashMap, fmt, str::FromStr};

use anyhow::{bail, Context, Result};
use jiff::{fmt::strtime, tz::TimeZone, Timestamp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Layout used for every timestamp found in indexes and manifests
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Timestamp serialized with [`TIME_FORMAT`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PakTime(pub Timestamp);

impl PakTime {
    pub fn now() -> Self {
        Self(Timestamp::now())
    }
}

impl fmt::Display for PakTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_zoned(TimeZone::UTC).strftime(TIME_FORMAT))
    }
}

impl FromStr for PakTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        strtime::parse(TIME_FORMAT, s)
            .and_then(|parsed| parsed.to_timestamp())
            .map(Self)
            .with_context(|| format!("Invalid timestamp {s:?}"))
    }
}

impl Serialize for PakTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PakTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let buf = String::deserialize(deserializer)?;
        buf.parse().map_err(serde::de::Error::custom)
    }
}

/// Catalog entry of a package, as published by a source
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub current_version: String,
    pub updated: PakTime,
    pub versions: Vec<String>,
}

/// Package ID => catalog entry
pub type SpecIndex = HashMap<String, Spec>;

/// An installed package whose source publishes a different version
///
/// `spec.current_version` and `spec.updated` describe what is installed,
/// the other two fields what the source currently offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradableSpec {
    #[serde(flatten)]
    pub spec: Spec,
    pub latest_version: String,
    pub last_updated: PakTime,
}

/// File listing and version stamp of a single package version
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub date: PakTime,
    pub files: Vec<String>,
}

/// Request to install a package, optionally at a given version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallSpec {
    pub id: String,
    pub version: Option<String>,
}

impl InstallSpec {
    pub fn latest(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }

    pub fn at(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: Some(version.into()),
        }
    }
}

impl fmt::Display for InstallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{version}", self.id),
            None => write!(f, "{}@latest", self.id),
        }
    }
}

/// Parses `<id>` or `<id>@<version>`
impl FromStr for InstallSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('@') {
            None => Ok(Self::latest(s)),

            Some((id, version)) => {
                if id.is_empty() {
                    bail!("Missing package ID in {s:?}");
                }

                if version.is_empty() {
                    bail!("Missing version after '@' in {s:?}");
                }

                Ok(Self::at(id, version))
            }
        }
    }
}
