use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,

        /// Message from the `{message}` body, or the status reason.
        message: String,
    },

    /// The service URL cannot take extra path segments.
    #[error("management url {0} cannot take path segments")]
    CannotBeABase(String),

    /// Could not build the service URL.
    #[error("invalid management url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport or decoding failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
