use edge_router::config::{Config as EdgeRouterConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_METRICS_PREFIX: &str = "branchgate";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    DEFAULT_METRICS_PREFIX.to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    /// Filter directive, overridden by RUST_LOG when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub edge_router: EdgeRouterConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.edge_router.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_router::config::ViewerPolicy;
    use registry::config::RegistryConfig;
    use std::io::Write;
    use std::time::Duration;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://public@sentry.example.com/1
                level: debug
            edge_router:
                listener:
                    host: 0.0.0.0
                    port: 3000
                admin_listener:
                    host: 0.0.0.0
                    port: 3001
                viewer:
                    policy:
                        type: redirect
                        location: https://fixed.example.com/
                origin:
                    lookup_timeout_ms: 500
                    validate_branch_names: true
                registry:
                    type: http
                    url: http://registry.internal/stacks
                    region: eu-west-1
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "branchgate");

        let logging = config.common.logging.expect("logging config");
        assert_eq!(logging.level, "debug");
        assert_eq!(
            logging.sentry_dsn.as_deref(),
            Some("https://public@sentry.example.com/1")
        );

        let edge_router = config.edge_router;
        assert_eq!(edge_router.listener.port, 3000);
        assert_eq!(
            edge_router.viewer.policy,
            ViewerPolicy::Redirect {
                location: "https://fixed.example.com/".parse().unwrap()
            }
        );
        assert_eq!(edge_router.origin.lookup_timeout(), Duration::from_millis(500));
        assert!(edge_router.origin.validate_branch_names);
        assert!(matches!(
            edge_router.registry,
            RegistryConfig::Http { region: Some(ref region), .. } if region == "eu-west-1"
        ));
    }

    #[test]
    fn minimal_config() {
        let yaml = r#"
            edge_router:
                listener:
                    host: 127.0.0.1
                    port: 3000
                admin_listener:
                    host: 127.0.0.1
                    port: 3001
                registry:
                    type: static
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.common, CommonConfig::default());
        assert_eq!(config.edge_router.viewer.policy, ViewerPolicy::TagHeader);
        assert_eq!(
            config.edge_router.origin.lookup_timeout(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let yaml = r#"
            edge_router:
                listener:
                    host: 127.0.0.1
                    port: 0
                admin_listener:
                    host: 127.0.0.1
                    port: 3001
                registry:
                    type: static
            "#;
        let tmp = write_tmp_file(yaml);
        let err = Config::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ValidationError::InvalidPort)));

        let tmp = write_tmp_file("edge_router: [");
        let err = Config::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));

        let err = Config::from_file(Path::new("/nonexistent/branchgate.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
