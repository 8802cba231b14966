//! CLI binary to run an in-memory cluster node with the management surface attached.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

use std::time::Duration;

use clap::{Parser, ValueEnum};
use cluster_mgmt_bootable::Bootable;
use cluster_mgmt_gateway::{ManagementService, ManagementServiceOptions, ManagementSettings};
use cluster_mgmt_http_insecure::InsecureHttpServer;
use cluster_mgmt_membership::{
    AnyIndependentWitness, CappedMajority, MemberStatus, NodeId, NodeIdError,
    UnreachabilityCurator,
};
use cluster_mgmt_membership_mock::MockMembershipEngine;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Gateway configuration error
    #[error(transparent)]
    Gateway(#[from] cluster_mgmt_gateway::Error),

    /// Malformed node address
    #[error(transparent)]
    NodeId(#[from] NodeIdError),

    /// Malformed `--unreachable` entry
    #[error("invalid unreachable entry {0:?}, expected <node>=<observer>[,<observer>...]")]
    UnreachableEntry(String),

    /// The management service failed
    #[error("management service error: {0}")]
    Service(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Curation {
    CappedMajority,
    AnyIndependentWitness,
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Interface the management surface binds
    #[arg(long, default_value = "127.0.0.1", env = "CLUSTER_MGMT_HOSTNAME")]
    hostname: String,

    /// Port the management surface binds
    #[arg(long, default_value_t = 19999, env = "CLUSTER_MGMT_PORT")]
    port: u16,

    /// Path prefix for every management route
    #[arg(long, default_value = "/cluster", env = "CLUSTER_MGMT_PATH_PREFIX")]
    path_prefix: String,

    /// Seconds a request waits on the command router
    #[arg(long, default_value_t = 5, env = "CLUSTER_MGMT_ASK_TIMEOUT_SECS")]
    ask_timeout_secs: u64,

    /// Address of this node
    #[arg(
        long,
        default_value = "akka.tcp://cluster@127.0.0.1:2552",
        env = "CLUSTER_MGMT_SELF_NODE"
    )]
    self_node: String,

    /// Additional Up members, oldest first
    #[arg(long = "member", env = "CLUSTER_MGMT_MEMBERS", value_delimiter = ' ')]
    members: Vec<String>,

    /// Unreachable reports as <node>=<observer>[,<observer>...]
    #[arg(long = "unreachable")]
    unreachable: Vec<String>,

    /// Rule used for curated unreachable reads
    #[arg(
        long,
        value_enum,
        default_value_t = Curation::CappedMajority,
        env = "CLUSTER_MGMT_CURATION"
    )]
    curation: Curation,

    /// Witness cap for the capped-majority rule
    #[arg(long, default_value_t = 5, env = "CLUSTER_MGMT_WITNESS_CAP")]
    witness_cap: usize,
}

impl Args {
    fn curator(&self) -> UnreachabilityCurator {
        match self.curation {
            Curation::CappedMajority => {
                UnreachabilityCurator::new(CappedMajority::new(self.witness_cap))
            }
            Curation::AnyIndependentWitness => UnreachabilityCurator::new(AnyIndependentWitness),
        }
    }

    fn settings(&self) -> ManagementSettings {
        ManagementSettings {
            hostname: self.hostname.clone(),
            port: self.port,
            path_prefix: self.path_prefix.clone(),
            ask_timeout: Duration::from_secs(self.ask_timeout_secs),
        }
    }
}

fn parse_unreachable(entry: &str) -> Result<(NodeId, Vec<NodeId>), Error> {
    let (node, observers) = entry
        .split_once('=')
        .ok_or_else(|| Error::UnreachableEntry(entry.to_string()))?;

    let observers = observers
        .split(',')
        .map(str::trim)
        .filter(|observer| !observer.is_empty())
        .map(NodeId::parse)
        .collect::<Result<Vec<_>, _>>()?;

    if observers.is_empty() {
        return Err(Error::UnreachableEntry(entry.to_string()));
    }

    Ok((NodeId::parse(node)?, observers))
}

fn seed_engine(args: &Args) -> Result<MockMembershipEngine, Error> {
    let self_node = NodeId::parse(&args.self_node)?;
    let engine = MockMembershipEngine::new(self_node.clone());

    engine.add_member(self_node.clone(), MemberStatus::Up, Vec::new());
    for member in &args.members {
        engine.add_member(NodeId::parse(member)?, MemberStatus::Up, Vec::new());
    }
    engine.set_leader(Some(self_node));

    for entry in &args.unreachable {
        let (node, observers) = parse_unreachable(entry)?;
        engine.mark_unreachable(node, observers);
    }

    Ok(engine)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = sigint.recv() => info!("Received SIGINT"),
                }
            }
            _ => {
                warn!("failed to install signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
                info!("Received interrupt signal");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received interrupt signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let args = Args::parse();
    let settings = args.settings();
    let engine = seed_engine(&args)?;

    let service = ManagementService::new(ManagementServiceOptions {
        engine,
        http_server: InsecureHttpServer::new(settings.listen_addr()?),
        settings,
        curator: args.curator(),
    });

    service
        .start()
        .await
        .map_err(|e| Error::Service(e.to_string()))?;

    // Create shared shutdown token
    let shutdown_token = CancellationToken::new();

    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;

        info!("Shutting down");
        signal_shutdown_token.cancel();
    });

    tokio::select! {
        () = shutdown_token.cancelled() => {}
        () = service.wait() => warn!("management service stopped unexpectedly"),
    }

    service
        .shutdown()
        .await
        .map_err(|e| Error::Service(e.to_string()))
}
