use cluster_mgmt_bootable::BootableError;
use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Service already started.
    #[error("management service already started")]
    AlreadyStarted,

    /// HTTP server error.
    #[error("http server error: {0}")]
    HttpServer(String),

    /// Hostname is not an address we can bind.
    #[error("invalid hostname: {0}")]
    InvalidHostname(String),

    /// Command router error.
    #[error("command router error: {0}")]
    Router(String),
}

impl BootableError for Error {}
