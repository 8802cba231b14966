use axum::Json;
use axum::extract::{Path, State};
use cluster_mgmt_membership::ShardRegionStats;
use cluster_mgmt_router::RouterHandle;

use crate::api::ApiError;

/// `GET /shards/{name}`: per-shard entity counts of a shard region.
pub(crate) async fn shard_info_handler(
    State(router): State<RouterHandle>,
    Path(name): Path<String>,
) -> Result<Json<ShardRegionStats>, ApiError> {
    Ok(Json(router.get_shard_info(name).await?))
}
