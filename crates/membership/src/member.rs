//! Cluster member projection.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Membership lifecycle status of a node, as reported by the engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MemberStatus {
    /// Join requested, not yet accepted by the leader.
    Joining,

    /// Accepted into the cluster while convergence was blocked.
    WeaklyUp,

    /// Full member.
    Up,

    /// Graceful leave in progress.
    Leaving,

    /// Leave handed off, about to be removed.
    Exiting,

    /// Marked down by an operator or a downing strategy.
    Down,

    /// No longer part of the cluster.
    Removed,
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Read-only projection of a single member's gossip state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMember {
    /// Address of the member.
    pub node: NodeId,

    /// Incarnation uid, distinguishes restarts on the same address.
    #[serde(default)]
    pub node_uid: String,

    /// Current status.
    pub status: MemberStatus,

    /// Roles the member was started with.
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl ClusterMember {
    /// Create a member projection.
    pub fn new(
        node: NodeId,
        node_uid: impl Into<String>,
        status: MemberStatus,
        roles: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            node,
            node_uid: node_uid.into(),
            status,
            roles: roles.into_iter().collect(),
        }
    }

    /// Whether the member is `Up`.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == MemberStatus::Up
    }
}
