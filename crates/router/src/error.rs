use cluster_mgmt_bootable::BootableError;
use thiserror::Error;

/// Errors from the router's lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// The router has already been started.
    #[error("the command router has already been started")]
    AlreadyStarted,
}

impl BootableError for Error {}

/// Outcome of a single routed command.
pub type CommandResult<T> = Result<T, CommandFailure>;

/// Why a routed command failed.
///
/// Every failure is local to one command. The display form is the reason
/// string handed back to callers.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CommandFailure {
    /// The addressed node is not in the current membership.
    #[error("member not found")]
    MemberNotFound,

    /// No shard region with this name has been started.
    #[error("shard region {0} must be started first")]
    ShardRegionNotStarted(String),

    /// The shard region did not answer within the engine timeout.
    #[error("shard region {0} not responding, may have been terminated")]
    ShardRegionNotResponding(String),

    /// The caller's wait budget elapsed.
    #[error("request timed out")]
    Timeout,

    /// The router is not processing commands.
    #[error("command router is not running")]
    Unavailable,

    /// The engine failed in some other way.
    #[error("{0}")]
    Unexpected(String),
}

impl CommandFailure {
    /// Human readable reason.
    #[must_use]
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Whether the failure means the addressed thing does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MemberNotFound
                | Self::ShardRegionNotStarted(_)
                | Self::ShardRegionNotResponding(_)
        )
    }
}
