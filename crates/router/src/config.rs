//! Router configuration.

use std::time::Duration;

use cluster_mgmt_membership::UnreachabilityCurator;

/// Default bound on a caller's total wait.
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single engine call inside the mailbox.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default number of commands that may queue before senders wait.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Configuration for a [`CommandRouter`](crate::CommandRouter).
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// How long a caller waits for a reply, queueing included.
    pub ask_timeout: Duration,

    /// How long the processor waits on any one engine call.
    pub engine_timeout: Duration,

    /// Mailbox capacity.
    pub mailbox_capacity: usize,

    /// Curator used for curated unreachable reads.
    pub curator: UnreachabilityCurator,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            ask_timeout: DEFAULT_ASK_TIMEOUT,
            engine_timeout: DEFAULT_ENGINE_TIMEOUT,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            curator: UnreachabilityCurator::default(),
        }
    }
}

impl RouterConfig {
    /// Set the ask timeout and keep each engine call at three fifths of it, so
    /// an engine timeout is reported before the caller gives up.
    #[must_use]
    pub fn with_ask_timeout(self, ask_timeout: Duration) -> Self {
        Self {
            ask_timeout,
            engine_timeout: ask_timeout * 3 / 5,
            ..self
        }
    }
}
