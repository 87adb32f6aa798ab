//! Feature branch routing for CDN request hooks.
//!
//! Two hooks cooperate to send a request to a feature branch deployment:
//!
//! ```text
//! client -> ViewerRequestRouter -> (cache) -> OriginRequestRouter -> origin
//! ```
//!
//! The viewer-request hook runs before the cache lookup and picks the branch identifier out of
//! the query string or cookies. The origin-request hook runs on cache misses, resolves the
//! identifier against the deployment registry and points the request at the branch
//! environment. Both hooks fail open: whenever something is missing or goes wrong, the
//! request continues to the default origin unmodified.

pub mod branch;
pub mod config;
pub mod decision;
pub mod errors;
pub mod event;
pub mod hook_service;
pub mod metrics_defs;
pub mod origin;
pub mod viewer;

use errors::EdgeRouterError;
use hook_service::HookService;
use registry::{DeploymentRegistry, Registry};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

pub use decision::RoutingDecision;
pub use origin::OriginRequestRouter;
pub use viewer::ViewerRequestRouter;

/// Serves the hooks and the admin endpoints until one of the listeners fails.
pub async fn run(config: config::Config) -> Result<(), EdgeRouterError> {
    let registry = Registry::new(config.registry.clone())?;
    tracing::info!(registry = registry.kind(), "Deployment registry configured");

    let hook_service = HookService::from_config(&config, Arc::new(registry.clone()));
    let hook_task = run_http_service(&config.listener.host, config.listener.port, hook_service);

    let admin_service = AdminService::new(move || registry.is_ready());
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(hook_task, admin_task)?;
    Ok(())
}
