use std::io;

/// Errors raised by the hook service around the routers.
///
/// The routers themselves never fail; every routing problem ends in forwarding the request.
#[derive(thiserror::Error, Debug)]
pub enum EdgeRouterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("hyper error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
    #[error("event contains no records")]
    EmptyEvent,
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
}
