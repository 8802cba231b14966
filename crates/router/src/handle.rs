//! Cloneable front door to a running router.

use std::time::Duration;

use cluster_mgmt_membership::{
    ClusterMember, MembershipSnapshot, NodeId, ShardRegionStats, UnreachableObservation,
};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::command::{Command, Reply};
use crate::{CommandFailure, CommandResult};

/// Sends commands to a [`CommandRouter`](crate::CommandRouter) and waits for replies.
///
/// Every call is bounded by the router's ask timeout, queueing included.
#[derive(Clone, Debug)]
pub struct RouterHandle {
    sender: mpsc::Sender<Command>,
    ask_timeout: Duration,
}

impl RouterHandle {
    pub(crate) const fn new(sender: mpsc::Sender<Command>, ask_timeout: Duration) -> Self {
        Self {
            sender,
            ask_timeout,
        }
    }

    /// Ask the engine to join the cluster at `address`.
    ///
    /// # Errors
    ///
    /// Fails if the engine rejects the request or the wait budget elapses.
    pub async fn join(&self, address: NodeId) -> CommandResult<String> {
        self.ask(|reply| Command::Join { address, reply }).await
    }

    /// Ask `address` to leave the cluster.
    ///
    /// # Errors
    ///
    /// Fails with [`CommandFailure::MemberNotFound`] if `address` is not a member.
    pub async fn leave(&self, address: NodeId) -> CommandResult<String> {
        self.ask(|reply| Command::Leave { address, reply }).await
    }

    /// Mark `address` as down.
    ///
    /// # Errors
    ///
    /// Fails with [`CommandFailure::MemberNotFound`] if `address` is not a member.
    pub async fn down(&self, address: NodeId) -> CommandResult<String> {
        self.ask(|reply| Command::Down { address, reply }).await
    }

    /// Read the current membership snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the engine cannot be read.
    pub async fn get_members(&self) -> CommandResult<MembershipSnapshot> {
        self.ask(|reply| Command::GetMembers { reply }).await
    }

    /// Read a single member.
    ///
    /// # Errors
    ///
    /// Fails with [`CommandFailure::MemberNotFound`] if `address` is not a member.
    pub async fn get_member(&self, address: NodeId) -> CommandResult<ClusterMember> {
        self.ask(|reply| Command::GetMember { address, reply }).await
    }

    /// Read per-shard statistics for a shard region.
    ///
    /// # Errors
    ///
    /// Fails if the region was never started or does not answer in time. A
    /// region that outlasts the ask timeout is reported as not responding.
    pub async fn get_shard_info(
        &self,
        region: impl Into<String>,
    ) -> CommandResult<ShardRegionStats> {
        let region = region.into();
        let name = region.clone();
        let command = |reply| Command::GetShardInfo { region, reply };

        match self.ask(command).await {
            Err(CommandFailure::Timeout) => Err(CommandFailure::ShardRegionNotResponding(name)),
            result => result,
        }
    }

    /// Read unreachable observations, optionally curated.
    ///
    /// # Errors
    ///
    /// Fails if the engine cannot be read.
    pub async fn get_unreachable(
        &self,
        curated: bool,
    ) -> CommandResult<Vec<UnreachableObservation>> {
        self.ask(|reply| Command::GetUnreachable { curated, reply })
            .await
    }

    async fn ask<T, F>(&self, build: F) -> CommandResult<T>
    where
        F: FnOnce(Reply<T>) -> Command,
    {
        let (reply, response) = oneshot::channel();
        let command = build(reply);
        let name = command.name();

        let exchange = async {
            self.sender
                .send(command)
                .await
                .map_err(|_| CommandFailure::Unavailable)?;

            response.await.map_err(|_| CommandFailure::Unavailable)?
        };

        tokio::time::timeout(self.ask_timeout, exchange)
            .await
            .unwrap_or_else(|_| {
                warn!("{} timed out after {:?}", name, self.ask_timeout);
                Err(CommandFailure::Timeout)
            })
    }
}
