use std::collections::BTreeMap;
use std::path::Path;
use log::debug;
use serde::Deserialize;
use thiserror::Error;
use Error::*;

#[derive(Error, Debug)]
pub enum Error {
    #[error("bundle file {0} not found")]
    NotFound(String),

    #[error("read {path}: {err}")]
    Read {
        err: std::io::Error,
        path: String,
    },

    #[error("deserialize: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// A CNAB bundle descriptor, as found in bundle.json.
///
/// Parameters and credentials are kept in name order, so everything
/// generated from them comes out in a stable order.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub invocation_images: Vec<InvocationImage>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub credentials: BTreeMap<String, Credential>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationImage {
    #[serde(default = "default_image_type")]
    pub image_type: String,
    pub image: String,
}

fn default_image_type() -> String {
    "docker".to_string()
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "type")]
    pub data_type: String,
    pub default: Option<serde_json::Value>,
    pub allowed_values: Option<Vec<serde_json::Value>>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub metadata: Option<ParameterMetadata>,
}

impl Parameter {
    /// Description from the parameter metadata, if it is set and non-empty.
    pub fn description(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.description.as_deref())
            .filter(|description| !description.is_empty())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ParameterMetadata {
    pub description: Option<String>,
}

/// Where the invocation image expects a credential. Only the name
/// (the key in `Bundle::credentials`) and the description affect the template.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Credential {
    pub path: Option<String>,
    pub env: Option<String>,
    pub description: Option<String>,
}

impl Bundle {
    pub fn parse(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Read and parse a bundle descriptor from disk.
pub fn load(path: &str) -> Result<Bundle, Error> {
    if !Path::new(path).exists() {
        return Err(NotFound(path.to_string()));
    }

    let file = std::fs::File::open(path).map_err(|err| Read {
        err,
        path: path.to_string(),
    })?;
    let bundle: Bundle = serde_json::from_reader(std::io::BufReader::new(file))?;

    debug!(
        "Bundle {} loaded with {} parameters, {} credentials and {} invocation images",
        bundle.name.as_deref().unwrap_or("<unnamed>"),
        bundle.parameters.len(),
        bundle.credentials.len(),
        bundle.invocation_images.len(),
    );

    Ok(bundle)
}
