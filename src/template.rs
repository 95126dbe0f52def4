use std::collections::BTreeMap;
use serde::Serialize;
use crate::config;

const CONTAINER_GROUP_TYPE: &str = "Microsoft.ContainerInstance/containerGroups";

/// ARM deployment template running a bundle in an Azure container group.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub content_version: String,
    pub parameters: BTreeMap<String, Parameter>,
    pub resources: Vec<Resource>,
}

/// ARM template parameter definition.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub description: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub api_version: String,
    pub location: String,
    pub properties: ContainerGroupProperties,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGroupProperties {
    pub containers: Vec<Container>,
    pub os_type: String,
    pub restart_policy: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Container {
    pub name: String,
    pub properties: ContainerProperties,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    pub image: String,
    pub resources: ResourceRequirements,
    pub environment_variables: Vec<EnvironmentVariable>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResourceRequirements {
    pub requests: ResourceRequests,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequests {
    pub cpu: f64,
    pub memory_in_gb: f64,
}

/// Container environment binding. Serializes as
/// `{"name": .., "value": ..}` or `{"name": .., "secureValue": ..}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EnvironmentVariable {
    pub name: String,
    #[serde(flatten)]
    pub value: EnvironmentValue,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum EnvironmentValue {
    Value(String),
    SecureValue(String),
}

impl EnvironmentVariable {
    pub fn plain(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: EnvironmentValue::Value(value.into()),
        }
    }

    pub fn secure(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: EnvironmentValue::SecureValue(value.into()),
        }
    }
}

impl Template {
    /// An empty template with a single container group holding a single container.
    pub fn new(cfg: &config::File) -> Self {
        Self {
            schema: cfg.template.schema.clone(),
            content_version: cfg.template.content_version.clone(),
            parameters: BTreeMap::new(),
            resources: vec![Resource {
                resource_type: CONTAINER_GROUP_TYPE.to_string(),
                name: cfg.container_group.name.clone(),
                api_version: cfg.container_group.api_version.clone(),
                location: cfg.container_group.location.clone(),
                properties: ContainerGroupProperties {
                    containers: vec![Container {
                        name: cfg.container.name.clone(),
                        properties: ContainerProperties {
                            image: cfg.container.image.clone(),
                            resources: ResourceRequirements {
                                requests: ResourceRequests {
                                    cpu: cfg.container.cpu,
                                    memory_in_gb: cfg.container.memory_in_gb,
                                },
                            },
                            environment_variables: vec![],
                        },
                    }],
                    os_type: cfg.container_group.os_type.clone(),
                    restart_policy: cfg.container_group.restart_policy.clone(),
                },
            }],
        }
    }

    /// Append an environment variable to the bundle container.
    pub fn set_container_environment_variable(&mut self, environment_variable: EnvironmentVariable) {
        self.resources[0].properties.containers[0]
            .properties
            .environment_variables
            .push(environment_variable);
    }

    pub fn environment_variables(&self) -> &[EnvironmentVariable] {
        &self.resources[0].properties.containers[0]
            .properties
            .environment_variables
    }
}

/// ARM template expression referencing a template parameter.
pub fn parameter_reference(name: &str) -> String {
    format!("[parameters('{}')]", name)
}
