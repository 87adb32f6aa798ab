use crate::config::{CommonConfig, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use sentry::types::{Dsn, ParseDsnError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("invalid sentry DSN: {0}")]
    InvalidDsn(#[from] ParseDsnError),
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderInstalled,
}

/// Keeps the Sentry client alive; events are flushed when this is dropped.
pub struct Guard {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Installs the tracing subscriber, the Sentry client and the statsd recorder.
///
/// Logs go to stderr so `invoke` output on stdout stays machine readable.
pub fn init(common: &CommonConfig) -> Result<Guard, ObservabilityError> {
    let logging = common.logging.clone().unwrap_or_default();
    let sentry = init_sentry(&logging)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    if let Some(metrics) = &common.metrics {
        init_metrics(metrics)?;
    }

    Ok(Guard { _sentry: sentry })
}

fn init_sentry(logging: &LoggingConfig) -> Result<Option<sentry::ClientInitGuard>, ObservabilityError> {
    let Some(dsn) = &logging.sentry_dsn else {
        return Ok(None);
    };
    let dsn: Dsn = dsn.parse()?;

    Ok(Some(sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        ..Default::default()
    })))
}

fn init_metrics(config: &MetricsConfig) -> Result<(), ObservabilityError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))?;
    metrics::set_global_recorder(recorder).map_err(|_| ObservabilityError::RecorderInstalled)?;

    shared::metrics_defs::describe(registry::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe(edge_router::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Metrics reported to statsd"
    );
    Ok(())
}
