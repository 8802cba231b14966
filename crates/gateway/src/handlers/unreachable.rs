use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use cluster_mgmt_router::RouterHandle;
use serde::Deserialize;

use crate::api::{ApiError, UnreachableResponse};

#[derive(Debug, Deserialize)]
pub(crate) struct UnreachableParams {
    curate: Option<bool>,
}

/// `GET /unreachable[?curate=]`: raw or curated unreachable observations.
pub(crate) async fn unreachable_handler(
    State(router): State<RouterHandle>,
    params: Result<Query<UnreachableParams>, QueryRejection>,
) -> Result<Json<UnreachableResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let unreachable = router
        .get_unreachable(params.curate.unwrap_or(false))
        .await?;

    Ok(Json(UnreachableResponse { unreachable }))
}
