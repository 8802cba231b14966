//! Contract the external cluster engine implements.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ClusterMember, MembershipEngineError, MembershipView, NodeId};

/// Entity count for a single shard hosted by a region.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardStats {
    /// Shard identifier.
    pub shard_id: String,

    /// Number of live entities in the shard.
    pub entity_count: u64,
}

/// Statistics for one shard region.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShardRegionStats {
    /// Per-shard entity counts.
    pub shards: Vec<ShardStats>,
}

/// Read and mutation surface of the external membership engine.
///
/// Gossip, failure detection and convergence all live behind this trait; the
/// management service only reads views and issues requests.
#[async_trait]
pub trait MembershipEngine
where
    Self: Send + Sync + Clone + 'static,
{
    /// The error type for this engine.
    type Error: MembershipEngineError;

    /// Read the engine's current membership view.
    async fn read_view(&self) -> Result<MembershipView, Self::Error>;

    /// Age ordering between two members. `Ordering::Less` means `a` is older.
    fn age_ordering(&self, a: &ClusterMember, b: &ClusterMember) -> Ordering;

    /// Ask the local node to join the cluster at `address`.
    async fn join(&self, address: &NodeId) -> Result<(), Self::Error>;

    /// Ask `address` to leave the cluster gracefully.
    async fn leave(&self, address: &NodeId) -> Result<(), Self::Error>;

    /// Mark `address` as down.
    async fn down(&self, address: &NodeId) -> Result<(), Self::Error>;

    /// Query the statistics of a locally started shard region.
    async fn shard_region_stats(&self, region: &str) -> Result<ShardRegionStats, Self::Error>;
}
