use crate::branch::{self, BranchIdentifier, Source};
use crate::config::OriginConfig;
use crate::decision::RoutingDecision;
use crate::event::CloudFrontRequest;
use crate::metrics_defs::ORIGIN_REQUEST_DECISION;
use registry::{DeploymentRecord, DeploymentRegistry, Lookup, RegistryError};
use shared::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

const HOST_HEADER: &str = "host";

/// Why a branch request is forwarded to the default origin.
#[derive(Debug)]
enum Fallback {
    LookupMiss,
    LookupFailure(RegistryError),
    LookupAborted(String),
    MissingFunctionUrl,
    MalformedUrl(String),
    NoCustomOrigin,
}

impl Fallback {
    fn reason(&self) -> &'static str {
        match self {
            Fallback::LookupMiss => "lookup_miss",
            Fallback::LookupFailure(_) => "lookup_failure",
            Fallback::LookupAborted(_) => "lookup_aborted",
            Fallback::MissingFunctionUrl => "missing_function_url",
            Fallback::MalformedUrl(_) => "malformed_url",
            Fallback::NoCustomOrigin => "no_custom_origin",
        }
    }
}

/// Runs on cache misses, right before the request goes to the origin.
///
/// A request naming a branch (query string first, then the branch header) is pointed at
/// that branch environment's endpoint, as recorded in the deployment registry. Every other
/// outcome forwards the request exactly as it arrived. The registry is queried once per
/// request; nothing is cached between requests.
pub struct OriginRequestRouter {
    registry: Arc<dyn DeploymentRegistry>,
    lookup_timeout: Duration,
    validate_branch_names: bool,
}

impl OriginRequestRouter {
    pub fn new(registry: Arc<dyn DeploymentRegistry>, config: OriginConfig) -> Self {
        OriginRequestRouter {
            registry,
            lookup_timeout: config.lookup_timeout(),
            validate_branch_names: config.validate_branch_names,
        }
    }

    pub async fn handle(&self, mut request: CloudFrontRequest) -> RoutingDecision {
        let Some((branch, source)) = self.find_branch(&request) else {
            counter!(ORIGIN_REQUEST_DECISION, "decision" => "unchanged", "reason" => "no_branch")
                .increment(1);
            return RoutingDecision::Unchanged(request);
        };

        tracing::debug!(
            branch = %branch,
            source = source.as_str(),
            uri = %request.uri,
            "Feature branch request detected"
        );

        let host = match self.resolve_host(&branch).await {
            Ok(host) => host,
            Err(fallback) => return fall_back(request, &branch, fallback),
        };

        // Both fields are rewritten together or not at all
        match request.custom_origin_mut() {
            Some(origin) => origin.domain_name = host.clone(),
            None => return fall_back(request, &branch, Fallback::NoCustomOrigin),
        }
        request.set_header(HOST_HEADER, HOST_HEADER, &host);

        tracing::debug!(branch = %branch, host = %host, "Routing to feature branch origin");
        counter!(ORIGIN_REQUEST_DECISION, "decision" => "rewritten", "reason" => "resolved")
            .increment(1);

        RoutingDecision::Rewritten {
            request,
            branch,
            host,
        }
    }

    fn find_branch(&self, request: &CloudFrontRequest) -> Option<(BranchIdentifier, Source)> {
        let (branch, source) = branch::from_query_string(&request.querystring)
            .map(|b| (b, Source::QueryString))
            .or_else(|| branch::from_header(request).map(|b| (b, Source::Header)))?;

        if self.validate_branch_names && !branch.is_valid_name() {
            tracing::warn!(
                branch = %branch,
                source = source.as_str(),
                "Ignoring feature branch with invalid name"
            );
            return None;
        }

        Some((branch, source))
    }

    async fn resolve_host(&self, branch: &BranchIdentifier) -> Result<String, Fallback> {
        let record = self.lookup(branch).await?;
        let function_url = record
            .function_url()
            .ok_or(Fallback::MissingFunctionUrl)?;

        endpoint_host(function_url).ok_or_else(|| Fallback::MalformedUrl(function_url.to_string()))
    }

    // The lookup runs on its own task so a registry that panics or hangs still ends in a
    // forwarded request.
    async fn lookup(&self, branch: &BranchIdentifier) -> Result<DeploymentRecord, Fallback> {
        let registry = Arc::clone(&self.registry);
        let name = branch.to_string();
        let mut task = tokio::spawn(async move { registry.lookup(&name).await });

        let lookup = match timeout(self.lookup_timeout, &mut task).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(Fallback::LookupAborted(e.to_string())),
            Err(_) => {
                task.abort();
                Lookup::Failed(RegistryError::Timeout(self.lookup_timeout))
            }
        };

        match lookup {
            Lookup::Found(record) => Ok(record),
            Lookup::NotFound => Err(Fallback::LookupMiss),
            Lookup::Failed(e) => Err(Fallback::LookupFailure(e)),
        }
    }
}

/// Host (and non-default port) of an endpoint URL, the way a `Host` header carries it.
pub fn endpoint_host(endpoint: &str) -> Option<String> {
    let url = Url::parse(endpoint).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;

    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn fall_back(
    request: CloudFrontRequest,
    branch: &BranchIdentifier,
    fallback: Fallback,
) -> RoutingDecision {
    match &fallback {
        Fallback::LookupMiss => {
            tracing::info!(branch = %branch, "No environment found for feature branch");
        }
        Fallback::LookupFailure(e) => {
            tracing::warn!(branch = %branch, error = %e, "Feature branch lookup failed");
        }
        Fallback::LookupAborted(e) => {
            tracing::error!(branch = %branch, error = %e, "Feature branch lookup aborted");
        }
        Fallback::MissingFunctionUrl => {
            tracing::warn!(branch = %branch, "No function url found for feature branch");
        }
        Fallback::MalformedUrl(url) => {
            tracing::warn!(branch = %branch, url = %url, "Feature branch function url is unusable");
        }
        Fallback::NoCustomOrigin => {
            tracing::warn!(branch = %branch, "Request has no custom origin to rewrite");
        }
    }

    counter!(
        ORIGIN_REQUEST_DECISION,
        "decision" => "unchanged",
        "reason" => fallback.reason()
    )
    .increment(1);

    RoutingDecision::Unchanged(request)
}
