use crate::config::Config;
use crate::errors::EdgeRouterError;
use crate::event::{CloudFrontEvent, HookResult};
use crate::metrics_defs::HOOK_DURATION;
use crate::origin::OriginRequestRouter;
use crate::viewer::ViewerRequestRouter;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use registry::DeploymentRegistry;
use shared::histogram;
use shared::http::{make_boxed_error_response, make_json_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// The two points at which the CDN invokes a request hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    ViewerRequest,
    OriginRequest,
}

impl Hook {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/viewer-request" => Some(Hook::ViewerRequest),
            "/origin-request" => Some(Hook::OriginRequest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::ViewerRequest => "viewer_request",
            Hook::OriginRequest => "origin_request",
        }
    }
}

struct Routers {
    viewer: ViewerRequestRouter,
    origin: OriginRequestRouter,
}

/// Serves both hooks over HTTP. Each request body is one CDN event; each response body is
/// the hook's result.
#[derive(Clone)]
pub struct HookService {
    routers: Arc<Routers>,
}

impl HookService {
    pub fn new(viewer: ViewerRequestRouter, origin: OriginRequestRouter) -> Self {
        HookService {
            routers: Arc::new(Routers { viewer, origin }),
        }
    }

    pub fn from_config(config: &Config, registry: Arc<dyn DeploymentRegistry>) -> Self {
        HookService::new(
            ViewerRequestRouter::new(config.viewer.clone()),
            OriginRequestRouter::new(registry, config.origin.clone()),
        )
    }

    /// Runs one hook over one event.
    pub async fn invoke(
        &self,
        hook: Hook,
        event: CloudFrontEvent,
    ) -> Result<HookResult, EdgeRouterError> {
        let request = event.into_request()?;
        let decision = match hook {
            Hook::ViewerRequest => self.routers.viewer.handle(request),
            Hook::OriginRequest => self.routers.origin.handle(request).await,
        };
        Ok(decision.into_result())
    }

    async fn respond(
        &self,
        method: &Method,
        path: &str,
        body: Bytes,
    ) -> Response<BoxBody<Bytes, EdgeRouterError>> {
        let Some(hook) = Hook::from_path(path) else {
            return make_boxed_error_response(StatusCode::NOT_FOUND);
        };
        if *method != Method::POST {
            return make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
        }

        let start = Instant::now();
        let result = match CloudFrontEvent::from_slice(&body) {
            Ok(event) => self.invoke(hook, event).await,
            Err(e) => Err(e),
        };

        let (status, response) = match result {
            Ok(result) => ("ok", make_json_response(&result)),
            Err(e) => {
                tracing::warn!(hook = hook.as_str(), error = %e, "Rejected hook event");
                ("rejected", make_boxed_error_response(StatusCode::BAD_REQUEST))
            }
        };

        histogram!(HOOK_DURATION, "hook" => hook.as_str(), "status" => status)
            .record(start.elapsed().as_secs_f64());
        response
    }
}

impl Service<Request<Incoming>> for HookService {
    type Response = Response<BoxBody<Bytes, EdgeRouterError>>;
    type Error = EdgeRouterError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok(service.respond(&parts.method, parts.uri.path(), body).await)
        })
    }
}
