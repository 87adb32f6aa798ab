use crate::branch::{self, BranchIdentifier, FEATURE_BRANCH_HEADER, Source};
use crate::config::{ViewerConfig, ViewerPolicy};
use crate::decision::RoutingDecision;
use crate::event::{CloudFrontRequest, CloudFrontResponse};
use crate::metrics_defs::VIEWER_REQUEST_DECISION;
use http::StatusCode;
use shared::counter;
use url::Url;

const REDIRECT_CACHE_CONTROL: &str = "max-age=3600";

/// Runs on every request before the cache lookup.
///
/// Finds a branch identifier in the query string, falling back to the cookies, and applies
/// the configured policy. Requests without an identifier pass through untouched.
pub struct ViewerRequestRouter {
    policy: ViewerPolicy,
    validate_branch_names: bool,
}

impl ViewerRequestRouter {
    pub fn new(config: ViewerConfig) -> Self {
        ViewerRequestRouter {
            policy: config.policy,
            validate_branch_names: config.validate_branch_names,
        }
    }

    pub fn handle(&self, mut request: CloudFrontRequest) -> RoutingDecision {
        let Some((branch, source)) = self.find_branch(&request) else {
            counter!(VIEWER_REQUEST_DECISION, "decision" => "unchanged", "source" => "none")
                .increment(1);
            return RoutingDecision::Unchanged(request);
        };

        tracing::debug!(
            branch = %branch,
            source = source.as_str(),
            uri = %request.uri,
            "Feature branch request detected"
        );

        let decision = match &self.policy {
            ViewerPolicy::TagHeader => {
                request.set_header(FEATURE_BRANCH_HEADER, FEATURE_BRANCH_HEADER, branch.as_str());
                RoutingDecision::Tagged { request, branch }
            }
            ViewerPolicy::Redirect { location } => RoutingDecision::Redirect {
                response: redirect_response(location),
                branch,
            },
        };

        counter!(
            VIEWER_REQUEST_DECISION,
            "decision" => decision.kind(),
            "source" => source.as_str()
        )
        .increment(1);
        decision
    }

    fn find_branch(&self, request: &CloudFrontRequest) -> Option<(BranchIdentifier, Source)> {
        let (branch, source) = branch::from_query_string(&request.querystring)
            .map(|b| (b, Source::QueryString))
            .or_else(|| branch::from_cookies(request).map(|b| (b, Source::Cookie)))?;

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
}

pub fn redirect_response(location: &Url) -> CloudFrontResponse {
    CloudFrontResponse::new(StatusCode::MOVED_PERMANENTLY)
        .with_header("location", "Location", location.as_str())
        .with_header("cache-control", "Cache-Control", REDIRECT_CACHE_CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HeaderEntry;
    use crate::event::tests::{ORIGIN_REQUEST_EVENT, request_from};

    const FIXED_LOCATION: &str = "https://lw5hzidhqwap375kz5ch4w73ta0xzmhk.lambda-url.eu-west-1.on.aws/";

    fn tagging_router() -> ViewerRequestRouter {
        ViewerRequestRouter::new(ViewerConfig::default())
    }

    fn redirecting_router() -> ViewerRequestRouter {
        ViewerRequestRouter::new(ViewerConfig {
            policy: ViewerPolicy::Redirect {
                location: Url::parse(FIXED_LOCATION).unwrap(),
            },
            validate_branch_names: false,
        })
    }

    fn request(querystring: &str, cookie: Option<&str>) -> CloudFrontRequest {
        let mut request = CloudFrontRequest {
            uri: "/index.html".into(),
            querystring: querystring.into(),
            ..Default::default()
        };
        request.set_header("host", "Host", "d111111abcdef8.cloudfront.net");
        if let Some(cookie) = cookie {
            request.set_header("cookie", "Cookie", cookie);
        }
        request
    }

    #[test]
    fn test_no_marker_is_identity() {
        for router in [tagging_router(), redirecting_router()] {
            for input in [
                request("", None),
                request("foo=bar&baz=1", None),
                request("foo=bar", Some("session=abc; theme=dark")),
                request("featbr=", None),
            ] {
                let decision = router.handle(input.clone());
                assert_eq!(decision, RoutingDecision::Unchanged(input));
            }
        }
    }

    #[test]
    fn test_tags_query_branch() {
        let decision = tagging_router().handle(request("foo=bar&featbr=pr-123", None));

        let RoutingDecision::Tagged { request, branch } = decision else {
            panic!("expected tagged request");
        };
        assert_eq!(branch.as_str(), "pr-123");
        assert_eq!(
            request.headers[FEATURE_BRANCH_HEADER],
            vec![HeaderEntry::new(FEATURE_BRANCH_HEADER, "pr-123")]
        );
        // Everything else is left alone
        assert_eq!(request.querystring, "foo=bar&featbr=pr-123");
        assert_eq!(
            request.first_header_value("host"),
            Some("d111111abcdef8.cloudfront.net")
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let decision = tagging_router().handle(request("foo=bar", Some("a=1; featbr=X; b=2")));
        assert_eq!(decision.branch().map(BranchIdentifier::as_str), Some("X"));

        // The query string wins over the cookie
        let decision =
            tagging_router().handle(request("featbr=from-query", Some("featbr=from-cookie")));
        assert_eq!(
            decision.branch().map(BranchIdentifier::as_str),
            Some("from-query")
        );
    }

    #[test]
    fn test_redirect_ignores_branch_value() {
        for querystring in ["featbr=pr-42", "featbr=does-not-exist"] {
            let decision = redirecting_router().handle(request(querystring, None));
            assert_eq!(decision.kind(), "redirect");

            let RoutingDecision::Redirect { response, .. } = decision else {
                panic!("expected redirect");
            };
            assert_eq!(response.status, "301");
            assert_eq!(response.status_description, "Moved Permanently");
            assert_eq!(
                response.headers["location"],
                vec![HeaderEntry::new("Location", FIXED_LOCATION)]
            );
            assert_eq!(
                response.headers["cache-control"],
                vec![HeaderEntry::new("Cache-Control", "max-age=3600")]
            );
        }
    }

    #[test]
    fn test_invalid_names_pass_through_when_validating() {
        let router = ViewerRequestRouter::new(ViewerConfig {
            policy: ViewerPolicy::TagHeader,
            validate_branch_names: true,
        });

        let input = request("featbr=not_a_branch", None);
        assert_eq!(router.handle(input.clone()), RoutingDecision::Unchanged(input));

        let decision = router.handle(request("featbr=pr-42", None));
        assert_eq!(decision.kind(), "tagged");
    }

    #[test]
    fn test_full_event() {
        let decision = tagging_router().handle(request_from(ORIGIN_REQUEST_EVENT));
        assert_eq!(decision.branch().map(BranchIdentifier::as_str), Some("pr-123"));
    }
}
