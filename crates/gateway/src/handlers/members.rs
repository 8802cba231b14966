//! Handlers for `/members`.

use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Response};
use cluster_mgmt_router::RouterHandle;
use serde::Deserialize;

use super::parse_address;
use crate::api::{ApiError, MessageResponse};

#[derive(Debug, Deserialize)]
pub(crate) struct AddressParams {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateParams {
    address: Option<String>,
    operation: Option<String>,
}

enum Operation {
    Down,
    Leave,
}

impl Operation {
    fn parse(operation: Option<&str>) -> Result<Self, ApiError> {
        let operation = operation.map(str::trim).unwrap_or_default();

        if operation.eq_ignore_ascii_case("down") {
            Ok(Self::Down)
        } else if operation.eq_ignore_ascii_case("leave") {
            Ok(Self::Leave)
        } else if operation.is_empty() {
            Err(ApiError::bad_request("operation is required"))
        } else {
            Err(ApiError::bad_request(format!(
                "operation not supported: {operation}"
            )))
        }
    }
}

fn form_params<T>(params: Result<Form<T>, FormRejection>) -> Result<T, ApiError> {
    params
        .map(|Form(params)| params)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// `GET /members[?address=]`: the whole membership or a single member.
pub(crate) async fn get_members_handler(
    State(router): State<RouterHandle>,
    params: Result<Query<AddressParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    match params.address {
        Some(address) => {
            let address = parse_address(Some(address))?;
            let member = router.get_member(address).await?;
            Ok(Json(member).into_response())
        }
        None => {
            let snapshot = router.get_members().await?;
            Ok(Json(snapshot).into_response())
        }
    }
}

/// `POST /members`: join the cluster at `address`.
pub(crate) async fn join_handler(
    State(router): State<RouterHandle>,
    params: Result<Form<AddressParams>, FormRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let address = parse_address(form_params(params)?.address)?;
    let message = router.join(address).await?;

    Ok(Json(MessageResponse::new(message)))
}

/// `DELETE /members`: ask `address` to leave.
pub(crate) async fn leave_handler(
    State(router): State<RouterHandle>,
    params: Result<Form<AddressParams>, FormRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let address = parse_address(form_params(params)?.address)?;
    let message = router.leave(address).await?;

    Ok(Json(MessageResponse::new(message)))
}

/// `PUT /members`: apply `operation` (down or leave) to `address`.
pub(crate) async fn update_member_handler(
    State(router): State<RouterHandle>,
    params: Result<Form<UpdateParams>, FormRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let params = form_params(params)?;
    let operation = Operation::parse(params.operation.as_deref())?;
    let address = parse_address(params.address)?;

    let message = match operation {
        Operation::Down => router.down(address).await?,
        Operation::Leave => router.leave(address).await?,
    };

    Ok(Json(MessageResponse::new(message)))
}
