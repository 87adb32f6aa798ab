use registry::config::RegistryConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 3000;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Registry lookup timeout cannot be 0")]
    ZeroLookupTimeout,

    #[error("Redirect location must be an http(s) URL: {0}")]
    InvalidRedirectLocation(Url),

    #[error("Invalid registry configuration: {0}")]
    Registry(#[from] registry::config::ValidationError),
}

/// Edge router configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for hook invocations
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    /// Where branch environments are looked up during the origin-request phase
    pub registry: RegistryConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.viewer.validate()?;
        self.origin.validate()?;
        self.registry.validate()?;
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// What the viewer-request hook does once it finds a branch identifier.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerPolicy {
    /// Record the identifier in the branch header and let the request continue.
    #[default]
    TagHeader,
    /// Send the viewer to one fixed location, whatever the identifier is.
    Redirect { location: Url },
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ViewerConfig {
    #[serde(default)]
    pub policy: ViewerPolicy,
    /// Ignore identifiers that do not follow the branch naming convention
    #[serde(default)]
    pub validate_branch_names: bool,
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let ViewerPolicy::Redirect { location } = &self.policy
            && !matches!(location.scheme(), "http" | "https")
        {
            return Err(ValidationError::InvalidRedirectLocation(location.clone()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OriginConfig {
    /// Upper bound for a single registry lookup, in milliseconds
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Ignore identifiers that do not follow the branch naming convention
    #[serde(default)]
    pub validate_branch_names: bool,
}

fn default_lookup_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

impl Default for OriginConfig {
    fn default() -> Self {
        OriginConfig {
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            validate_branch_names: false,
        }
    }
}

impl OriginConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lookup_timeout_ms == 0 {
            return Err(ValidationError::ZeroLookupTimeout);
        }
        Ok(())
    }
}
