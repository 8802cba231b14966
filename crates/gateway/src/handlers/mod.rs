mod members;
mod shards;
mod unreachable;

pub(crate) use members::{
    get_members_handler, join_handler, leave_handler, update_member_handler,
};
pub(crate) use shards::shard_info_handler;
pub(crate) use unreachable::unreachable_handler;

use cluster_mgmt_membership::NodeId;

use crate::api::ApiError;

fn parse_address(address: Option<String>) -> Result<NodeId, ApiError> {
    let address = address
        .filter(|address| !address.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("address is required"))?;

    NodeId::parse(&address).map_err(|e| ApiError::bad_request(e.to_string()))
}
