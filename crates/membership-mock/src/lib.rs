//! In-memory membership engine for tests and local development.
//!
//! Nothing here gossips or detects failures. The engine records whatever the
//! owner tells it (members, reachability, leader, shard regions) and applies
//! join/leave/down requests to that record directly.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cluster_mgmt_membership::{
    ClusterMember, MemberStatus, MembershipEngine, MembershipView, NodeId, ShardRegionStats,
    ShardStats, UnreachableObservation,
};
use parking_lot::RwLock;
use tracing::{debug, info};

#[derive(Clone, Debug)]
struct MemberRecord {
    member: ClusterMember,
    up_number: u64,
}

#[derive(Clone, Debug)]
enum ShardRegion {
    Responsive(ShardRegionStats),
    Unresponsive,
}

#[derive(Debug)]
struct EngineState {
    self_node: NodeId,
    members: Vec<MemberRecord>,
    unreachable: Vec<UnreachableObservation>,
    leader: Option<NodeId>,
    next_up_number: u64,
    shard_regions: HashMap<String, ShardRegion>,
    join_requests: Vec<NodeId>,
    available: bool,
    mutation_delay: Option<Duration>,
    panic_on_mutation: bool,
}

impl EngineState {
    fn record(&self, node: &NodeId) -> Option<&MemberRecord> {
        self.members.iter().find(|record| record.member.node == *node)
    }

    fn record_mut(&mut self, node: &NodeId) -> Option<&mut MemberRecord> {
        self.members
            .iter_mut()
            .find(|record| record.member.node == *node)
    }
}

/// Membership engine backed by a shared in-memory record.
///
/// Clones share the same state.
#[derive(Clone, Debug)]
pub struct MockMembershipEngine {
    state: Arc<RwLock<EngineState>>,
}

impl MockMembershipEngine {
    /// Create an engine for `self_node` with no members.
    #[must_use]
    pub fn new(self_node: NodeId) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState {
                self_node,
                members: Vec::new(),
                unreachable: Vec::new(),
                leader: None,
                next_up_number: 1,
                shard_regions: HashMap::new(),
                join_requests: Vec::new(),
                available: true,
                mutation_delay: None,
                panic_on_mutation: false,
            })),
        }
    }

    /// Add a member and return the engine, for building fixtures.
    #[must_use]
    pub fn with_member<I>(self, node: NodeId, status: MemberStatus, roles: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.add_member(node, status, roles);
        self
    }

    /// Add a member. Members added earlier are older.
    ///
    /// Re-adding an existing address replaces its status and roles but keeps its age.
    pub fn add_member<I>(&self, node: NodeId, status: MemberStatus, roles: I)
    where
        I: IntoIterator<Item = String>,
    {
        let roles: BTreeSet<String> = roles.into_iter().collect();
        let mut state = self.state.write();

        if let Some(record) = state.record_mut(&node) {
            record.member.status = status;
            record.member.roles = roles;
            return;
        }

        let up_number = state.next_up_number;
        state.next_up_number += 1;
        state.members.push(MemberRecord {
            member: ClusterMember {
                node,
                node_uid: format!("{up_number}"),
                status,
                roles,
            },
            up_number,
        });
    }

    /// Remove a member entirely, along with any reachability records about it.
    pub fn remove_member(&self, node: &NodeId) {
        let mut state = self.state.write();
        state.members.retain(|record| record.member.node != *node);
        state.unreachable.retain(|observation| observation.node != *node);
        if state.leader.as_ref() == Some(node) {
            state.leader = None;
        }
    }

    /// Set a member's status.
    ///
    /// # Errors
    ///
    /// Returns an error if `node` is not a member.
    pub fn set_status(&self, node: &NodeId, status: MemberStatus) -> Result<(), Error> {
        let mut state = self.state.write();
        let record = state
            .record_mut(node)
            .ok_or_else(|| Error::MemberNotFound(node.clone()))?;
        record.member.status = status;
        Ok(())
    }

    /// Record that `observers` see `node` as unreachable, replacing earlier observers.
    pub fn mark_unreachable<I>(&self, node: NodeId, observers: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let observation = UnreachableObservation::new(node, observers);
        let mut state = self.state.write();
        match state
            .unreachable
            .iter_mut()
            .find(|existing| existing.node == observation.node)
        {
            Some(existing) => *existing = observation,
            None => state.unreachable.push(observation),
        }
    }

    /// Forget every reachability record about `node`.
    pub fn mark_reachable(&self, node: &NodeId) {
        self.state
            .write()
            .unreachable
            .retain(|observation| observation.node != *node);
    }

    /// Set or clear the leader.
    pub fn set_leader(&self, leader: Option<NodeId>) {
        self.state.write().leader = leader;
    }

    /// Start a shard region that answers with `shards` (shard id, entity count).
    pub fn start_shard_region<I>(&self, name: impl Into<String>, shards: I)
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let stats = ShardRegionStats {
            shards: shards
                .into_iter()
                .map(|(shard_id, entity_count)| ShardStats {
                    shard_id,
                    entity_count,
                })
                .collect(),
        };
        self.state
            .write()
            .shard_regions
            .insert(name.into(), ShardRegion::Responsive(stats));
    }

    /// Start a shard region that never answers statistics queries.
    pub fn start_unresponsive_shard_region(&self, name: impl Into<String>) {
        self.state
            .write()
            .shard_regions
            .insert(name.into(), ShardRegion::Unresponsive);
    }

    /// Take the engine offline (or bring it back). Offline engines fail every call.
    pub fn set_available(&self, available: bool) {
        self.state.write().available = available;
    }

    /// Delay every join/leave/down by `delay` before it is applied.
    pub fn set_mutation_delay(&self, delay: Option<Duration>) {
        self.state.write().mutation_delay = delay;
    }

    /// Make every join/leave/down panic instead of applying.
    pub fn set_panic_on_mutation(&self, panic: bool) {
        self.state.write().panic_on_mutation = panic;
    }

    /// Addresses passed to [`MembershipEngine::join`], in call order.
    #[must_use]
    pub fn join_requests(&self) -> Vec<NodeId> {
        self.state.read().join_requests.clone()
    }

    /// Current projection of a single member.
    #[must_use]
    pub fn member(&self, node: &NodeId) -> Option<ClusterMember> {
        self.state.read().record(node).map(|record| record.member.clone())
    }

    fn ensure_available(&self) -> Result<(), Error> {
        if self.state.read().available {
            Ok(())
        } else {
            Err(Error::Unavailable)
        }
    }

    async fn before_mutation(&self) -> Result<(), Error> {
        self.ensure_available()?;

        let (delay, panic) = {
            let state = self.state.read();
            (state.mutation_delay, state.panic_on_mutation)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if panic {
            panic!("membership engine mutation panicked");
        }

        Ok(())
    }
}

#[async_trait]
impl MembershipEngine for MockMembershipEngine {
    type Error = Error;

    async fn read_view(&self) -> Result<MembershipView, Self::Error> {
        self.ensure_available()?;

        let state = self.state.read();
        Ok(MembershipView {
            self_node: state.self_node.clone(),
            members: state
                .members
                .iter()
                .map(|record| record.member.clone())
                .collect(),
            unreachable: state.unreachable.clone(),
            leader: state.leader.clone(),
        })
    }

    fn age_ordering(&self, a: &ClusterMember, b: &ClusterMember) -> Ordering {
        let state = self.state.read();
        match (state.record(&a.node), state.record(&b.node)) {
            (Some(a), Some(b)) => a.up_number.cmp(&b.up_number),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    async fn join(&self, address: &NodeId) -> Result<(), Self::Error> {
        self.before_mutation().await?;

        let self_node = {
            let mut state = self.state.write();
            state.join_requests.push(address.clone());
            state.self_node.clone()
        };

        info!("join requested towards {}", address);

        if self.member(&self_node).is_none() {
            self.add_member(self_node, MemberStatus::Joining, Vec::new());
        }

        Ok(())
    }

    async fn leave(&self, address: &NodeId) -> Result<(), Self::Error> {
        self.before_mutation().await?;

        debug!("leave requested for {}", address);
        self.set_status(address, MemberStatus::Leaving)
    }

    async fn down(&self, address: &NodeId) -> Result<(), Self::Error> {
        self.before_mutation().await?;

        debug!("down requested for {}", address);
        self.set_status(address, MemberStatus::Down)
    }

    async fn shard_region_stats(&self, region: &str) -> Result<ShardRegionStats, Self::Error> {
        self.ensure_available()?;

        let shard_region = self.state.read().shard_regions.get(region).cloned();

        match shard_region {
            Some(ShardRegion::Responsive(stats)) => Ok(stats),
            Some(ShardRegion::Unresponsive) => std::future::pending().await,
            None => Err(Error::ShardRegionNotStarted(region.to_string())),
        }
    }
}
