use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use thiserror::Error;
use Error::*;

const DEFAULT_CONFIG: &str = include_str!("../default.toml");

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile {
        err: std::io::Error,
        path: String,
    },

    #[error("deserialize: {0}")]
    Deserialize(#[from] toml::de::Error),
}

/// An atfcnab.toml file, merged on top of the built-in defaults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct File {
    pub bundle: Bundle,
    pub registry: Registry,
    pub template: Template,
    pub container_group: ContainerGroup,
    pub container: Container,
}

impl Default for File {
    fn default() -> Self {
        // The default config is compiled into the program, so
        // make sure to test default() to catch panics compile-time.
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }
}

impl File {
    /// Read a user configuration file and merge it over the built-in defaults.
    /// Keys missing from the user file keep their default values.
    pub fn default_with_user_config_file(path: &str) -> Result<Self, Error> {
        let user_config = std::fs::read_to_string(path).map_err(|err| ReadFile {
            err,
            path: path.to_string(),
        })?;
        Self::default_with_user_config(&user_config)
    }

    pub fn default_with_user_config(user_config: &str) -> Result<Self, Error> {
        let mut merged = DEFAULT_CONFIG.parse::<toml::Table>()?;
        merge(&mut merged, user_config.parse::<toml::Table>()?);
        Ok(toml::Value::Table(merged).try_into::<File>()?)
    }
}

/// Recursively overlay `overlay` onto `base`. Tables are merged key by key,
/// any other value replaces the one in `base`.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => {
                if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                    merge(base_table, overlay_table);
                } else {
                    base.insert(key, toml::Value::Table(overlay_table));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Bundle {
    pub path: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Registry {
    /// Registry host prefix stripped from the invocation image to form the bundle name.
    pub prefix: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Template {
    pub schema: String,
    pub content_version: String,
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ContainerGroup {
    pub name: String,
    pub location: String,
    pub api_version: String,
    #[serde_inline_default("Linux".to_string())]
    pub os_type: String,
    #[serde_inline_default("Never".to_string())]
    pub restart_policy: String,
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Container {
    pub name: String,
    /// Image executing the bundle action inside the container group.
    pub image: String,
    #[serde_inline_default(1.0)]
    pub cpu: f64,
    #[serde_inline_default(1.5)]
    pub memory_in_gb: f64,
}
