use crate::branch::BranchIdentifier;
use crate::event::{CloudFrontRequest, CloudFrontResponse, HookResult};

/// The effect a hook had on a request.
#[derive(Clone, Debug, PartialEq)]
pub enum RoutingDecision {
    /// Forward the request exactly as received.
    Unchanged(CloudFrontRequest),
    /// Forward the request carrying the branch marker header.
    Tagged {
        request: CloudFrontRequest,
        branch: BranchIdentifier,
    },
    /// Answer the viewer directly without contacting the origin.
    Redirect {
        response: CloudFrontResponse,
        branch: BranchIdentifier,
    },
    /// Forward the request to the branch environment's host.
    Rewritten {
        request: CloudFrontRequest,
        branch: BranchIdentifier,
        host: String,
    },
}

impl RoutingDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::Unchanged(_) => "unchanged",
            RoutingDecision::Tagged { .. } => "tagged",
            RoutingDecision::Redirect { .. } => "redirect",
            RoutingDecision::Rewritten { .. } => "rewritten",
        }
    }

    pub fn branch(&self) -> Option<&BranchIdentifier> {
        match self {
            RoutingDecision::Unchanged(_) => None,
            RoutingDecision::Tagged { branch, .. }
            | RoutingDecision::Redirect { branch, .. }
            | RoutingDecision::Rewritten { branch, .. } => Some(branch),
        }
    }

    pub fn into_result(self) -> HookResult {
        match self {
            RoutingDecision::Unchanged(request)
            | RoutingDecision::Tagged { request, .. }
            | RoutingDecision::Rewritten { request, .. } => HookResult::Request(request),
            RoutingDecision::Redirect { response, .. } => HookResult::Response(response),
        }
    }
}
