//! Sequential command router between the management surface and the membership engine.
//!
//! All commands pass through a single mailbox and are executed one at a time,
//! so two mutations can never race against the engine. Each engine call is
//! bounded and panic-isolated; callers get a typed [`CommandResult`] back within
//! the ask timeout whatever the engine does.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod command;
mod config;
mod error;
mod handle;

pub use config::{
    DEFAULT_ASK_TIMEOUT, DEFAULT_ENGINE_TIMEOUT, DEFAULT_MAILBOX_CAPACITY, RouterConfig,
};
pub use error::{CommandFailure, CommandResult, Error};
pub use handle::RouterHandle;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use cluster_mgmt_bootable::Bootable;
use cluster_mgmt_membership::{
    ClusterMember, MembershipEngine, MembershipEngineError, MembershipEngineErrorKind,
    MembershipSnapshot, NodeId, ShardRegionStats, UnreachableObservation,
};
use command::{Command, Reply};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Owns the mailbox and the task that drains it.
pub struct CommandRouter<E>
where
    E: MembershipEngine,
{
    engine: E,
    config: RouterConfig,
    sender: mpsc::Sender<Command>,
    receiver: Mutex<Option<mpsc::Receiver<Command>>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<E> CommandRouter<E>
where
    E: MembershipEngine,
{
    /// Create a router in front of `engine`. Nothing runs until it is started.
    #[must_use]
    pub fn new(engine: E, config: RouterConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.mailbox_capacity.max(1));

        Self {
            engine,
            config,
            sender,
            receiver: Mutex::new(Some(receiver)),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// A handle for sending commands.
    ///
    /// Handles may be taken before the router starts; their commands queue until it does.
    #[must_use]
    pub fn handle(&self) -> RouterHandle {
        RouterHandle::new(self.sender.clone(), self.config.ask_timeout)
    }

    /// The configuration this router was built with.
    #[must_use]
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    async fn process_commands(
        processor: Processor<E>,
        mut receiver: mpsc::Receiver<Command>,
        shutdown_token: CancellationToken,
    ) {
        info!("command router started");

        loop {
            let command = tokio::select! {
                biased;
                () = shutdown_token.cancelled() => break,
                command = receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                () = shutdown_token.cancelled() => break,
                () = processor.process(command) => {}
            }
        }

        info!("command router stopped");
    }
}

#[async_trait]
impl<E> Bootable for CommandRouter<E>
where
    E: MembershipEngine,
{
    fn name(&self) -> &str {
        "command-router"
    }

    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(receiver) = self.receiver.lock().take() else {
            return Err(Box::new(Error::AlreadyStarted));
        };

        let processor = Processor {
            engine: self.engine.clone(),
            config: self.config.clone(),
        };
        let shutdown_token = self.shutdown_token.clone();

        self.task_tracker.spawn(Self::process_commands(
            processor,
            receiver,
            shutdown_token,
        ));
        self.task_tracker.close();

        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("command router shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("command router shutdown");

        Ok(())
    }

    async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}

/// Why a guarded engine call did not produce a value.
enum EngineFailure<Er> {
    Engine(Er),
    TimedOut,
    Panicked(String),
}

impl<Er> EngineFailure<Er>
where
    Er: MembershipEngineError,
{
    fn into_failure(self) -> CommandFailure {
        match self {
            Self::Engine(error) => match error.kind() {
                MembershipEngineErrorKind::MemberNotFound => CommandFailure::MemberNotFound,
                _ => CommandFailure::Unexpected(error.to_string()),
            },
            Self::TimedOut => CommandFailure::Timeout,
            Self::Panicked(message) => CommandFailure::Unexpected(message),
        }
    }
}

async fn call_engine<T, Er, F>(limit: Duration, call: F) -> Result<T, EngineFailure<Er>>
where
    F: Future<Output = Result<T, Er>>,
{
    match tokio::time::timeout(limit, AssertUnwindSafe(call).catch_unwind()).await {
        Err(_) => Err(EngineFailure::TimedOut),
        Ok(Err(panic)) => Err(EngineFailure::Panicked(panic_message(panic.as_ref()))),
        Ok(Ok(result)) => result.map_err(EngineFailure::Engine),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "membership engine panicked".to_string())
}

fn respond<T>(name: &str, reply: Reply<T>, result: CommandResult<T>) {
    if let Err(failure) = &result {
        warn!("{} failed: {}", name, failure);
    }

    if reply.send(result).is_err() {
        debug!("caller stopped waiting before {} completed", name);
    }
}

/// Executes commands against the engine. Lives inside the mailbox task.
struct Processor<E> {
    engine: E,
    config: RouterConfig,
}

impl<E> Processor<E>
where
    E: MembershipEngine,
{
    async fn process(&self, command: Command) {
        let name = command.name();
        debug!("processing {}", name);

        match command {
            Command::Join { address, reply } => {
                respond(name, reply, self.join(address).await);
            }
            Command::Leave { address, reply } => {
                respond(name, reply, self.leave(address).await);
            }
            Command::Down { address, reply } => {
                respond(name, reply, self.down(address).await);
            }
            Command::GetMembers { reply } => {
                respond(name, reply, self.snapshot().await);
            }
            Command::GetMember { address, reply } => {
                respond(name, reply, self.member(&address).await);
            }
            Command::GetShardInfo { region, reply } => {
                respond(name, reply, self.shard_info(region).await);
            }
            Command::GetUnreachable { curated, reply } => {
                respond(name, reply, self.unreachable(curated).await);
            }
        }
    }

    async fn snapshot(&self) -> CommandResult<MembershipSnapshot> {
        let view = call_engine(self.config.engine_timeout, self.engine.read_view())
            .await
            .map_err(EngineFailure::into_failure)?;

        Ok(MembershipSnapshot::from_view(view, |a, b| {
            self.engine.age_ordering(a, b)
        }))
    }

    async fn member(&self, address: &NodeId) -> CommandResult<ClusterMember> {
        self.snapshot()
            .await?
            .member(address)
            .cloned()
            .ok_or(CommandFailure::MemberNotFound)
    }

    async fn require_member(&self, address: &NodeId) -> CommandResult<()> {
        if self.snapshot().await?.contains(address) {
            Ok(())
        } else {
            Err(CommandFailure::MemberNotFound)
        }
    }

    async fn join(&self, address: NodeId) -> CommandResult<String> {
        call_engine(self.config.engine_timeout, self.engine.join(&address))
            .await
            .map_err(EngineFailure::into_failure)?;

        Ok(format!("joining {address}"))
    }

    async fn leave(&self, address: NodeId) -> CommandResult<String> {
        self.require_member(&address).await?;

        call_engine(self.config.engine_timeout, self.engine.leave(&address))
            .await
            .map_err(EngineFailure::into_failure)?;

        Ok(format!("leaving {address}"))
    }

    async fn down(&self, address: NodeId) -> CommandResult<String> {
        self.require_member(&address).await?;

        call_engine(self.config.engine_timeout, self.engine.down(&address))
            .await
            .map_err(EngineFailure::into_failure)?;

        Ok(format!("downing {address}"))
    }

    async fn shard_info(&self, region: String) -> CommandResult<ShardRegionStats> {
        let result = call_engine(
            self.config.engine_timeout,
            self.engine.shard_region_stats(&region),
        )
        .await;

        result.map_err(|failure| match failure {
            EngineFailure::TimedOut => CommandFailure::ShardRegionNotResponding(region),
            EngineFailure::Engine(error)
                if error.kind() == MembershipEngineErrorKind::ShardRegionNotStarted =>
            {
                CommandFailure::ShardRegionNotStarted(region)
            }
            other => other.into_failure(),
        })
    }

    async fn unreachable(&self, curated: bool) -> CommandResult<Vec<UnreachableObservation>> {
        let snapshot = self.snapshot().await?;

        if curated {
            Ok(self.config.curator.curate_observations(&snapshot))
        } else {
            Ok(snapshot.unreachable)
        }
    }
}
