//! Error types for the in-memory membership engine.

use cluster_mgmt_membership::{MembershipEngineError, MembershipEngineErrorKind, NodeId};
use thiserror::Error;

/// Error type for the in-memory membership engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The addressed node is not a member.
    #[error("member {0} not found")]
    MemberNotFound(NodeId),

    /// No shard region with this name was started.
    #[error("shard region {0} is not started")]
    ShardRegionNotStarted(String),

    /// The engine has been taken offline.
    #[error("membership engine is unavailable")]
    Unavailable,
}

impl MembershipEngineError for Error {
    fn kind(&self) -> MembershipEngineErrorKind {
        match self {
            Self::MemberNotFound(_) => MembershipEngineErrorKind::MemberNotFound,
            Self::ShardRegionNotStarted(_) => MembershipEngineErrorKind::ShardRegionNotStarted,
            Self::Unavailable => MembershipEngineErrorKind::Unavailable,
        }
    }
}
