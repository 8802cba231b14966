//! Error types for membership operations

use std::error::Error;
use std::fmt::{self, Debug};
use thiserror::Error as ThisError;

/// Errors raised while parsing a node address.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NodeIdError {
    /// The address is not a URL at all
    #[error("invalid node address '{0}': {1}")]
    Malformed(String, String),

    /// The address has no actor system name before the host
    #[error("invalid node address '{0}': missing system name")]
    MissingSystem(String),

    /// The address has no host
    #[error("invalid node address '{0}': missing host")]
    MissingHost(String),

    /// The address has no port
    #[error("invalid node address '{0}': missing port")]
    MissingPort(String),
}

/// Marker trait for `MembershipEngine` errors
pub trait MembershipEngineError: Debug + Error + Send + Sync + 'static {
    /// Returns the kind of this error
    fn kind(&self) -> MembershipEngineErrorKind;
}

/// The kind of membership engine error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MembershipEngineErrorKind {
    /// The addressed member is not part of the cluster
    MemberNotFound,

    /// The requested shard region has never been started on this node
    ShardRegionNotStarted,

    /// The engine is shutting down or otherwise cannot serve requests
    Unavailable,

    /// Other/unknown error
    Other,
}

impl fmt::Display for MembershipEngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
