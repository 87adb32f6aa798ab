use crate::config::RegistryConfig;
use crate::http_registry::HttpRegistry;
use crate::metrics_defs::{REGISTRY_LOOKUP, REGISTRY_LOOKUP_DURATION};
use crate::static_registry::StaticRegistry;
use crate::types::Lookup;
use async_trait::async_trait;
use http::StatusCode;
use shared::{counter, histogram};
use std::time::{Duration, Instant};

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("registry returned unexpected status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("registry lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Resolves an environment name to its deployment record.
///
/// Implementations are constructed once per process and shared between concurrent
/// invocations, so they must be safe for concurrent read-only use.
#[async_trait]
pub trait DeploymentRegistry: Send + Sync {
    async fn lookup(&self, name: &str) -> Lookup;

    /// Backs the admin `/ready` probe. Registries are not health checked, so a constructed
    /// registry is always ready; an unreachable backend only shows up as failed lookups.
    fn is_ready(&self) -> bool {
        true
    }
}

/// The registry selected by configuration.
#[derive(Clone)]
pub struct Registry(RegistryInner);

impl Registry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        match config {
            RegistryConfig::Http { url, region } => {
                Ok(Registry(RegistryInner::Http(HttpRegistry::new(url, region)?)))
            }
            RegistryConfig::Static { environments } => Ok(Registry(RegistryInner::Static(
                StaticRegistry::new(environments),
            ))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.0 {
            RegistryInner::Http(_) => "http",
            RegistryInner::Static(_) => "static",
        }
    }
}

#[async_trait]
impl DeploymentRegistry for Registry {
    async fn lookup(&self, name: &str) -> Lookup {
        let start = Instant::now();
        let lookup = match &self.0 {
            RegistryInner::Http(client) => client.lookup(name).await,
            RegistryInner::Static(registry) => registry.lookup(name),
        };

        histogram!(REGISTRY_LOOKUP_DURATION, "registry" => self.kind())
            .record(start.elapsed().as_secs_f64());
        counter!(REGISTRY_LOOKUP, "registry" => self.kind(), "outcome" => lookup.outcome())
            .increment(1);

        lookup
    }
}

#[derive(Clone)]
enum RegistryInner {
    Http(HttpRegistry),
    Static(StaticRegistry),
}
