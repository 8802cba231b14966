use cluster_mgmt_membership::{
    ClusterMember, MembershipSnapshot, NodeId, ShardRegionStats, UnreachableObservation,
};
use tokio::sync::oneshot;

use crate::CommandResult;

pub type Reply<T> = oneshot::Sender<CommandResult<T>>;

/// Messages accepted by the router's mailbox.
#[derive(Debug)]
pub enum Command {
    Join {
        address: NodeId,
        reply: Reply<String>,
    },
    Leave {
        address: NodeId,
        reply: Reply<String>,
    },
    Down {
        address: NodeId,
        reply: Reply<String>,
    },
    GetMembers {
        reply: Reply<MembershipSnapshot>,
    },
    GetMember {
        address: NodeId,
        reply: Reply<ClusterMember>,
    },
    GetShardInfo {
        region: String,
        reply: Reply<ShardRegionStats>,
    },
    GetUnreachable {
        curated: bool,
        reply: Reply<Vec<UnreachableObservation>>,
    },
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Down { .. } => "down",
            Self::GetMembers { .. } => "get-members",
            Self::GetMember { .. } => "get-member",
            Self::GetShardInfo { .. } => "get-shard-info",
            Self::GetUnreachable { .. } => "get-unreachable",
        }
    }
}
