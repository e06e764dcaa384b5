use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

pub fn decode<T: DeserializeOwned>(content: &[u8]) -> Result<T> {
    serde_yaml::from_slice(content).context("Failed to decode YAML")
}

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("Failed to encode YAML")
}
