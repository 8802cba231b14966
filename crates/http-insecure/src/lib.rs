//! Plain HTTP server for the management surface.
//!
//! No TLS and no authentication. Bind it to a loopback or otherwise trusted
//! interface.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;

pub use error::Error;

use std::future::IntoFuture;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use cluster_mgmt_http::HttpServer;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Simple non-secure HTTP server.
pub struct InsecureHttpServer {
    listen_addr: SocketAddr,
    bound_addr: RwLock<Option<SocketAddr>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl InsecureHttpServer {
    /// Creates a new instance of `InsecureHttpServer`.
    ///
    /// Port 0 picks an ephemeral port; see [`HttpServer::local_addr`].
    #[must_use]
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            bound_addr: RwLock::new(None),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }
}

#[async_trait]
impl HttpServer for InsecureHttpServer {
    type Error = Error;

    async fn start(&self, router: Router) -> Result<JoinHandle<()>, Self::Error> {
        let shutdown_token = self.shutdown_token.clone();

        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(Error::Bind)?;
        let bound_addr = listener.local_addr().map_err(Error::Bind)?;
        *self.bound_addr.write() = Some(bound_addr);

        info!("http server listening on {}", bound_addr);

        let handle = self.task_tracker.spawn(async move {
            tokio::select! {
                result = axum::serve(listener, router.into_make_service()).into_future() => {
                    if let Err(e) = result {
                        error!("http server exited: {:?}", e);
                    }
                }
                () = shutdown_token.cancelled() => {}
            };
        });

        self.task_tracker.close();

        Ok(handle)
    }

    async fn shutdown(&self) {
        info!("http server shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("http server shutdown");
    }

    async fn wait(&self) {
        self.task_tracker.wait().await;
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::routing::get;

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn test_serves_router_on_ephemeral_port() {
        let server = InsecureHttpServer::new(loopback());
        let router = Router::new().route("/ping", get(|| async { "pong" }));

        server.start(router).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let body = reqwest::get(format!("http://{addr}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let server = InsecureHttpServer::new(loopback());

        server.start(Router::new()).await.unwrap();

        assert!(matches!(
            server.start(Router::new()).await,
            Err(Error::AlreadyStarted)
        ));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_local_addr_unset_before_start() {
        let server = InsecureHttpServer::new(loopback());

        assert!(server.local_addr().is_none());
    }
}
