//! HTTP transport seam for the management surface.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use cluster_mgmt_bootable::BootableError;
use tokio::task::JoinHandle;

/// Marker trait for `HttpServer` errors
pub trait HttpServerError: BootableError + Debug + Error + Send + Sync {}

/// Serves a single axum router until shut down.
#[async_trait]
pub trait HttpServer: Send + Sync + 'static {
    /// Error type for this server.
    type Error: HttpServerError;

    /// Bind and start serving `router`. A server can only be started once.
    async fn start(&self, router: Router) -> Result<JoinHandle<()>, Self::Error>;

    /// Stop serving and wait for the serve task to exit.
    async fn shutdown(&self);

    /// Wait for the serve task to exit.
    async fn wait(&self);

    /// Address actually bound, once started.
    fn local_addr(&self) -> Option<SocketAddr>;
}
