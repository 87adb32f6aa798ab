use shared::metrics_defs::{MetricDef, MetricType};

pub const VIEWER_REQUEST_DECISION: MetricDef = MetricDef {
    name: "viewer_request.decision",
    metric_type: MetricType::Counter,
    description: "Viewer-request hook invocations. Tagged with decision, source.",
};

pub const ORIGIN_REQUEST_DECISION: MetricDef = MetricDef {
    name: "origin_request.decision",
    metric_type: MetricType::Counter,
    description: "Origin-request hook invocations. Tagged with decision, reason.",
};

pub const HOOK_DURATION: MetricDef = MetricDef {
    name: "hook.duration",
    metric_type: MetricType::Histogram,
    description: "Hook invocation duration in seconds. Tagged with hook, status.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    VIEWER_REQUEST_DECISION,
    ORIGIN_REQUEST_DECISION,
    HOOK_DURATION,
];
