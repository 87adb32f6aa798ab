//! Metrics definitions for the deployment registry.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REGISTRY_LOOKUP: MetricDef = MetricDef {
    name: "registry.lookup",
    metric_type: MetricType::Counter,
    description: "Number of registry lookups. Tagged with registry, outcome.",
};

pub const REGISTRY_LOOKUP_DURATION: MetricDef = MetricDef {
    name: "registry.lookup.duration",
    metric_type: MetricType::Histogram,
    description: "Registry lookup duration in seconds. Tagged with registry.",
};

pub const ALL_METRICS: &[MetricDef] = &[REGISTRY_LOOKUP, REGISTRY_LOOKUP_DURATION];
