use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("static registry contains an environment with an empty name")]
    EmptyEnvironmentName,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum RegistryConfig {
    /// Query a remote registry over HTTP for every lookup.
    Http {
        url: Url,
        region: Option<String>,
    },
    /// Environments declared up front, keyed by name. Each maps output keys to values.
    Static {
        #[serde(default)]
        environments: IndexMap<String, IndexMap<String, String>>,
    },
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let RegistryConfig::Static { environments } = self
            && environments.keys().any(|name| name.is_empty())
        {
            return Err(ValidationError::EmptyEnvironmentName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_registry() {
        let yaml = r#"
            type: http
            url: https://registry.internal/stacks
            region: eu-west-1
            "#;
        let config: RegistryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config,
            RegistryConfig::Http {
                url: Url::parse("https://registry.internal/stacks").unwrap(),
                region: Some("eu-west-1".into()),
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_static_registry() {
        let yaml = r#"
            type: static
            environments:
                pr-1:
                    FunctionUrl: https://pr1.lambda-url.eu-west-1.on.aws/
                pr-2: {}
            "#;
        let config: RegistryConfig = serde_yaml::from_str(yaml).unwrap();
        let RegistryConfig::Static { environments } = &config else {
            panic!("expected static registry");
        };
        assert_eq!(environments.len(), 2);
        assert_eq!(
            environments["pr-1"]["FunctionUrl"],
            "https://pr1.lambda-url.eu-west-1.on.aws/"
        );
        assert!(environments["pr-2"].is_empty());
    }

    #[test]
    fn test_invalid_registry_config() {
        let bad_url = r#"
            type: http
            url: not a url
            "#;
        assert!(serde_yaml::from_str::<RegistryConfig>(bad_url).is_err());

        let empty_name = RegistryConfig::Static {
            environments: IndexMap::from([(String::new(), IndexMap::new())]),
        };
        assert_eq!(
            empty_name.validate(),
            Err(ValidationError::EmptyEnvironmentName)
        );
    }
}
