//! JSON bodies served by the management surface.
//!
//! `GET /members` answers with a
//! [`MembershipSnapshot`](cluster_mgmt_membership::MembershipSnapshot) or a single
//! [`ClusterMember`](cluster_mgmt_membership::ClusterMember), and `GET /shards/{name}`
//! with [`ShardRegionStats`](cluster_mgmt_membership::ShardRegionStats). The types
//! here cover the remaining shapes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cluster_mgmt_membership::UnreachableObservation;
use cluster_mgmt_router::CommandFailure;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `{message}` body used for mutations and every error.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Create a message body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `GET /unreachable`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UnreachableResponse {
    /// Accused nodes and their observers, in engine order.
    pub unreachable: Vec<UnreachableObservation>,
}

/// Error response carrying a status and a `{message}` body.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<CommandFailure> for ApiError {
    fn from(failure: CommandFailure) -> Self {
        let status = if failure.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            warn!("management request failed: {}", failure);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self {
            status,
            message: failure.reason(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse::new(self.message))).into_response()
    }
}
