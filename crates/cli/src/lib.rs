//! Client for the cluster management HTTP surface.
//!
//! The `cluster-mgmt` binary is a thin wrapper over [`execute`]; the client
//! and the table rendering are usable on their own.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod error;
pub mod render;

pub use client::ManagementClient;
pub use error::{Error, Result};

use clap::Subcommand;
use cluster_mgmt_membership::NodeId;

/// Commands understood by the `cluster-mgmt` binary.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Ask the node to join the cluster at the given address
    Join {
        /// Address of a node in the cluster to join
        node_url: String,
    },

    /// Ask a member to leave the cluster
    Leave {
        /// Address of the member
        node_url: String,
    },

    /// Mark a member as down
    Down {
        /// Address of the member
        node_url: String,
    },

    /// List member addresses
    Members,

    /// Show the status of a single member
    MemberStatus {
        /// Address of the member
        node_url: String,
    },

    /// Show every member with its status and the leader
    ClusterStatus {
        /// Only treat nodes as unreachable when enough reachable members agree
        #[arg(long)]
        curate: bool,
    },

    /// Show entity counts per shard of a shard region
    Shards {
        /// Name of the shard region
        region: String,
    },

    /// List unreachable nodes
    Unreachable {
        /// Only list nodes enough reachable members agree are unreachable
        #[arg(long)]
        curate: bool,
    },
}

/// Run `command` against the management endpoint and return what to print.
///
/// # Errors
///
/// Returns an error on transport failure or a non-success response.
pub async fn execute(client: &ManagementClient, command: &Command) -> Result<String> {
    match command {
        Command::Join { node_url } => client.join(node_url).await.map(with_newline),
        Command::Leave { node_url } => client.leave(node_url).await.map(with_newline),
        Command::Down { node_url } => client.down(node_url).await.map(with_newline),
        Command::Members => Ok(render::members_table(&client.members().await?)),
        Command::MemberStatus { node_url } => {
            Ok(render::member_table(&client.member(node_url).await?))
        }
        Command::ClusterStatus { curate } => {
            let snapshot = client.members().await?;
            let unreachable = unreachable_nodes(client, *curate).await?;
            Ok(render::cluster_status_table(&snapshot, &unreachable))
        }
        Command::Shards { region } => Ok(render::shards_table(&client.shards(region).await?)),
        Command::Unreachable { curate } => {
            let unreachable = unreachable_nodes(client, *curate).await?;
            Ok(render::unreachable_table(&unreachable))
        }
    }
}

async fn unreachable_nodes(client: &ManagementClient, curate: bool) -> Result<Vec<NodeId>> {
    Ok(client
        .unreachable(curate)
        .await?
        .into_iter()
        .map(|observation| observation.node)
        .collect())
}

fn with_newline(message: String) -> String {
    format!("{message}\n")
}
