use log::{debug, warn};
use crate::bundle::{Bundle, Credential, Parameter};
use crate::config;
use crate::template::{self, parameter_reference, EnvironmentVariable, Metadata, Template};

pub const BUNDLE_NAME_VARIABLE: &str = "CNAB_BUNDLE_NAME";

const SECURE_STRING: &str = "securestring";

/// Credentials that are filled in from the deploying subscription
/// instead of being asked for as template parameters.
const SUBSCRIPTION_CREDENTIALS: [(&str, &str); 2] = [
    ("azure_subscription_id", "[subscription().subscriptionId]"),
    ("azure_tenant_id", "[subscription().tenantId]"),
];

/// Build the ARM template executing `bundle`.
///
/// The container gets `CNAB_BUNDLE_NAME`, then one variable per parameter,
/// then one per credential, each group sorted by name.
pub fn generate(bundle: &Bundle, bundle_name: &str, cfg: &config::File) -> Template {
    let mut generated = Template::new(cfg);

    generated.set_container_environment_variable(EnvironmentVariable::plain(
        BUNDLE_NAME_VARIABLE,
        bundle_name,
    ));

    for (name, parameter) in &bundle.parameters {
        debug!("Mapping parameter {name} of type {}", parameter.data_type);
        generated.parameters.insert(name.clone(), arm_parameter(parameter));
        generated.set_container_environment_variable(EnvironmentVariable::plain(
            name.to_uppercase(),
            parameter_reference(name),
        ));
    }

    for (name, credential) in &bundle.credentials {
        if let Some(expression) = subscription_expression(name) {
            debug!("Credential {name} resolved from the subscription");
            generated.set_container_environment_variable(EnvironmentVariable::plain(
                name.to_uppercase(),
                expression,
            ));
            continue;
        }

        debug!("Mapping credential {name} to a secure parameter");
        if generated.parameters.contains_key(name) {
            warn!("Credential {name} shadows the bundle parameter with the same name");
        }
        generated.parameters.insert(name.clone(), secure_parameter(credential));
        generated.set_container_environment_variable(EnvironmentVariable::secure(
            name.to_uppercase(),
            parameter_reference(name),
        ));
    }

    generated
}

fn subscription_expression(credential: &str) -> Option<&'static str> {
    SUBSCRIPTION_CREDENTIALS
        .iter()
        .find(|(name, _)| *name == credential)
        .map(|(_, expression)| *expression)
}

fn arm_parameter(parameter: &Parameter) -> template::Parameter {
    template::Parameter {
        data_type: parameter.data_type.clone(),
        allowed_values: parameter.allowed_values.clone(),
        default_value: parameter.default.clone(),
        min_value: parameter.min_value,
        max_value: parameter.max_value,
        min_length: parameter.min_length,
        max_length: parameter.max_length,
        metadata: parameter.description().map(|description| Metadata {
            description: description.to_string(),
        }),
    }
}

fn secure_parameter(credential: &Credential) -> template::Parameter {
    template::Parameter {
        data_type: SECURE_STRING.to_string(),
        metadata: credential
            .description
            .as_ref()
            .filter(|description| !description.is_empty())
            .map(|description| Metadata {
                description: description.clone(),
            }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::generate;
    use crate::bundle::Bundle;
    use crate::config;
    use crate::template::{EnvironmentValue, EnvironmentVariable, Template};
    use serde_json::json;

    fn generate_from(json: &str) -> Template {
        let bundle = Bundle::parse(json).unwrap();
        generate(&bundle, "myapp", &config::File::default())
    }

    const BUNDLE: &str = r#"{
        "invocationImages": [
            { "imageType": "docker", "image": "cnabquickstartstest.azurecr.io/myapp:1.0" }
        ],
        "parameters": {
            "replicas": { "type": "int", "default": 5, "metadata": { "description": "number of replicas" } },
            "location": { "type": "string", "allowedValues": ["westeurope", "eastus"] },
            "debug": { "type": "bool", "default": false }
        },
        "credentials": {
            "kubeconfig": { "path": "/root/.kube/config" },
            "azure_tenant_id": { "env": "AZURE_TENANT_ID" },
            "azure_subscription_id": { "env": "AZURE_SUBSCRIPTION_ID" },
            "registry_password": { "env": "REGISTRY_PASSWORD", "description": "ACR password" }
        }
    }"#;

    fn names(template: &Template) -> Vec<&str> {
        template
            .environment_variables()
            .iter()
            .map(|variable| variable.name.as_str())
            .collect()
    }

    #[test]
    fn one_variable_per_parameter_and_credential() {
        let template = generate_from(BUNDLE);

        // 3 parameters + 4 credentials + CNAB_BUNDLE_NAME
        assert_eq!(template.environment_variables().len(), 8);
        // 3 parameters + 2 secure credentials
        assert_eq!(template.parameters.len(), 5);
    }

    #[test]
    fn variables_are_upper_cased_and_sorted() {
        let template = generate_from(BUNDLE);
        assert_eq!(
            names(&template),
            vec![
                "CNAB_BUNDLE_NAME",
                "DEBUG",
                "LOCATION",
                "REPLICAS",
                "AZURE_SUBSCRIPTION_ID",
                "AZURE_TENANT_ID",
                "KUBECONFIG",
                "REGISTRY_PASSWORD",
            ]
        );
        assert_eq!(
            template.environment_variables()[0],
            EnvironmentVariable::plain("CNAB_BUNDLE_NAME", "myapp")
        );
    }

    #[test]
    fn parameters_reference_template_parameters() {
        let template = generate_from(BUNDLE);
        let replicas = template
            .environment_variables()
            .iter()
            .find(|variable| variable.name == "REPLICAS")
            .unwrap();
        assert_eq!(
            replicas.value,
            EnvironmentValue::Value("[parameters('replicas')]".into())
        );
    }

    #[test]
    fn parameter_definitions_are_copied() {
        let template = generate_from(BUNDLE);
        let parameters = serde_json::to_value(&template.parameters).unwrap();

        assert_eq!(
            parameters["replicas"],
            json!({ "type": "int", "defaultValue": 5, "metadata": { "description": "number of replicas" } })
        );
        assert_eq!(
            parameters["location"],
            json!({ "type": "string", "allowedValues": ["westeurope", "eastus"] })
        );
        assert_eq!(parameters["debug"], json!({ "type": "bool", "defaultValue": false }));
    }

    #[test]
    fn default_value_keeps_its_json_type() {
        let template = generate_from(BUNDLE);
        let output = serde_json::to_string(&template.parameters["replicas"]).unwrap();
        assert!(output.contains(r#""defaultValue":5"#), "{output}");
    }

    #[test]
    fn subscription_credentials_do_not_become_parameters() {
        let template = generate_from(BUNDLE);

        assert!(!template.parameters.contains_key("azure_tenant_id"));
        assert!(!template.parameters.contains_key("azure_subscription_id"));
        assert!(template
            .environment_variables()
            .contains(&EnvironmentVariable::plain("AZURE_TENANT_ID", "[subscription().tenantId]")));
        assert!(template.environment_variables().contains(&EnvironmentVariable::plain(
            "AZURE_SUBSCRIPTION_ID",
            "[subscription().subscriptionId]"
        )));
    }

    #[test]
    fn credentials_become_secure_parameters() {
        let template = generate_from(BUNDLE);
        let parameters = serde_json::to_value(&template.parameters).unwrap();

        assert_eq!(parameters["kubeconfig"], json!({ "type": "securestring" }));
        assert_eq!(
            parameters["registry_password"],
            json!({ "type": "securestring", "metadata": { "description": "ACR password" } })
        );
        assert!(template
            .environment_variables()
            .contains(&EnvironmentVariable::secure("KUBECONFIG", "[parameters('kubeconfig')]")));
    }

    #[test]
    fn credential_replaces_parameter_with_same_name() {
        let template = generate_from(
            r#"{
                "parameters": { "token": { "type": "string", "default": "abc" } },
                "credentials": { "token": {} }
            }"#,
        );

        assert_eq!(template.parameters["token"].data_type, "securestring");
        assert_eq!(template.parameters["token"].default_value, None);
        assert_eq!(names(&template), vec!["CNAB_BUNDLE_NAME", "TOKEN", "TOKEN"]);
    }

    #[test]
    fn empty_bundle_only_carries_the_bundle_name() {
        let template = generate_from("{}");
        assert!(template.parameters.is_empty());
        assert_eq!(names(&template), vec!["CNAB_BUNDLE_NAME"]);
    }

    #[test]
    fn output_is_deterministic() {
        let first = serde_json::to_string(&generate_from(BUNDLE)).unwrap();
        let second = serde_json::to_string(&generate_from(BUNDLE)).unwrap();
        assert_eq!(first, second);
    }
}
