//! HTTP management surface for cluster membership.
//!
//! Routes, all under a configurable prefix (`/cluster` by default):
//!
//! | Method | Path | Input |
//! |---|---|---|
//! | GET | `/members` | optional `address` query |
//! | POST | `/members` | form `address` |
//! | DELETE | `/members` | form `address` |
//! | PUT | `/members` | form `address`, `operation` (`down` or `leave`) |
//! | GET | `/shards/{name}` | |
//! | GET | `/unreachable` | optional `curate` query |
//!
//! Failures answer with a `{message}` body: 400 for bad input, 404 when the
//! member or shard region does not exist, 500 otherwise.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

pub mod api;
mod error;
mod handlers;
mod settings;

pub use error::{Error, Result};
pub use settings::{DEFAULT_HOSTNAME, DEFAULT_PATH_PREFIX, DEFAULT_PORT, ManagementSettings};

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use cluster_mgmt_bootable::Bootable;
use cluster_mgmt_http::HttpServer;
use cluster_mgmt_membership::{MembershipEngine, UnreachabilityCurator};
use cluster_mgmt_router::{CommandRouter, RouterConfig, RouterHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::api::MessageResponse;
use crate::handlers::{
    get_members_handler, join_handler, leave_handler, shard_info_handler,
    unreachable_handler, update_member_handler,
};
use crate::settings::normalize_prefix;

/// Build the management routes, mounted under `path_prefix`.
pub fn management_router(router: RouterHandle, path_prefix: &str) -> Router {
    let routes = Router::new()
        .route(
            "/members",
            get(get_members_handler)
                .post(join_handler)
                .delete(leave_handler)
                .put(update_member_handler),
        )
        .route("/shards/{name}", get(shard_info_handler))
        .route("/unreachable", get(unreachable_handler))
        .with_state(router);

    let prefix = normalize_prefix(path_prefix);
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&prefix, routes)
    };

    app.fallback(|| async {
        (
            StatusCode::NOT_FOUND,
            axum::Json(MessageResponse::new("not found")),
        )
    })
}

/// Whether `bound` is what `configured` asked for. Port 0 accepts any port.
fn addr_matches(configured: SocketAddr, bound: Option<SocketAddr>) -> bool {
    bound.is_some_and(|bound| {
        bound.ip() == configured.ip()
            && (configured.port() == 0 || bound.port() == configured.port())
    })
}

/// Options for creating a new management service.
pub struct ManagementServiceOptions<E, HS>
where
    E: MembershipEngine,
    HS: HttpServer,
{
    /// Engine to manage.
    pub engine: E,

    /// Server the routes are served from, normally bound to
    /// [`ManagementSettings::listen_addr`].
    pub http_server: HS,

    /// Prefix and timeouts.
    pub settings: ManagementSettings,

    /// Curator for `GET /unreachable?curate=true`.
    pub curator: UnreachabilityCurator,
}

/// The management surface: a command router plus the HTTP server in front of it.
pub struct ManagementService<E, HS>
where
    E: MembershipEngine,
    HS: HttpServer,
{
    settings: ManagementSettings,
    router: Arc<CommandRouter<E>>,
    http_server: Arc<HS>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<E, HS> ManagementService<E, HS>
where
    E: MembershipEngine,
    HS: HttpServer,
{
    /// Create a new management service. Nothing is bound until it is started.
    pub fn new(
        ManagementServiceOptions {
            engine,
            http_server,
            settings,
            curator,
        }: ManagementServiceOptions<E, HS>,
    ) -> Self {
        let config = RouterConfig {
            curator,
            ..RouterConfig::default()
        }
        .with_ask_timeout(settings.ask_timeout);

        Self {
            settings,
            router: Arc::new(CommandRouter::new(engine, config)),
            http_server: Arc::new(http_server),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Handle onto the service's command router.
    #[must_use]
    pub fn router_handle(&self) -> RouterHandle {
        self.router.handle()
    }

    /// Address the HTTP server bound, once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http_server.local_addr()
    }
}

#[async_trait]
impl<E, HS> Bootable for ManagementService<E, HS>
where
    E: MembershipEngine,
    HS: HttpServer,
{
    fn name(&self) -> &str {
        "management service"
    }

    /// Start the router, then the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the service was already started or either part fails to start.
    async fn start(&self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.task_tracker.is_closed() {
            return Err(Box::new(Error::AlreadyStarted));
        }

        self.router
            .start()
            .await
            .map_err(|e| Error::Router(e.to_string()))?;

        let app = management_router(self.router.handle(), &self.settings.path_prefix);

        if let Err(e) = self.http_server.start(app).await {
            if let Err(shutdown_error) = self.router.shutdown().await {
                error!("failed to shut down command router: {}", shutdown_error);
            }
            return Err(Box::new(Error::HttpServer(e.to_string())));
        }

        let bound_addr = self.http_server.local_addr();
        match self.settings.listen_addr() {
            Ok(configured) if !addr_matches(configured, bound_addr) => {
                warn!(
                    "http server bound {:?} but settings ask for {}",
                    bound_addr, configured
                );
            }
            Ok(_) => {}
            Err(e) => warn!("{}", e),
        }

        info!(
            "management service started on {:?} under {}",
            bound_addr,
            self.settings.normalized_prefix()
        );

        let router = self.router.clone();
        let http_server = self.http_server.clone();
        let shutdown_token = self.shutdown_token.clone();
        self.task_tracker.spawn(async move {
            tokio::select! {
                () = shutdown_token.cancelled() => {
                    info!("shutdown command received");
                    http_server.shutdown().await;
                }
                () = http_server.wait() => {
                    error!("http server stopped unexpectedly");
                }
            }

            if let Err(e) = router.shutdown().await {
                error!("failed to shut down command router: {}", e);
            }
        });

        self.task_tracker.close();

        Ok(())
    }

    /// Stop the HTTP server, then the router.
    async fn shutdown(&self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("management service shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("management service shutdown");

        Ok(())
    }

    async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_matches() {
        let any_port: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let fixed: SocketAddr = "127.0.0.1:19999".parse().unwrap();

        assert!(addr_matches(any_port, Some("127.0.0.1:41234".parse().unwrap())));
        assert!(addr_matches(fixed, Some(fixed)));
        assert!(!addr_matches(fixed, Some("127.0.0.1:41234".parse().unwrap())));
        assert!(!addr_matches(any_port, Some("0.0.0.0:41234".parse().unwrap())));
        assert!(!addr_matches(any_port, None));
    }
}
