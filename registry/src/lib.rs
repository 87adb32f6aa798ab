//! Deployment registry lookups.
//!
//! A deployment registry maps an environment name (a feature branch) to the outputs of the
//! stack provisioned for it. The only output the edge routers care about is `FunctionUrl`.

pub mod client;
pub mod config;
pub mod http_registry;
pub mod metrics_defs;
pub mod static_registry;
pub mod types;

#[cfg(test)]
mod testutils;

pub use client::{DeploymentRegistry, Registry, RegistryError};
pub use types::{DeploymentRecord, FUNCTION_URL_OUTPUT, Lookup};
