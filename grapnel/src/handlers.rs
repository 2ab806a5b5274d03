//! Request handlers for the three backend surfaces: dynamic calls, per-host schema
//! listings, and per-method schema detail.
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use grapnel_core::invoke::{CallRequest, ProxyRequest};
use grapnel_core::schema::{self, MethodSchema, ServiceSchema};
use grapnel_core::connect;
use serde_json::{Value, json};
use tracing::{debug, info};

pub async fn grpc_index() -> Json<Value> {
    Json(json!({ "message": "Default endpoint for grpc" }))
}

pub async fn metadata_index() -> Json<Value> {
    Json(json!({ "message": "Default endpoint for reflection metadata" }))
}

/// POST `/grpc/call`: execute one unary gRPC call described by the envelope.
pub async fn call(
    headers: HeaderMap,
    payload: Result<Json<CallRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(envelope) = payload
        .map_err(|rejection| ApiError::bad_request(format!("Invalid request: {rejection}")))?;

    info!(host = %envelope.host, method = %envelope.method, "gRPC call requested");

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let request = ProxyRequest::GrpcUnary(envelope);
    request.validate()?;
    let response = request.execute(authorization).await?;

    Ok(Json(response))
}

/// GET `/metadata/{host}`: the full service schema of one host, cached for the TTL.
pub async fn list_metadata(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Result<Json<Vec<ServiceSchema>>, ApiError> {
    if let Some(cached) = state.cache.lookup(&host) {
        debug!(%host, "returning cached reflection data");
        return Ok(Json(cached));
    }

    let channel = connect::connect(&host).await?;
    let listing = schema::list_schema(channel).await?;

    state.cache.store(&host, listing.clone());
    Ok(Json(listing))
}

/// GET `/metadata/{host}/{service}/{method}`: detail of one method, including the
/// flattened input schema a UI builds its form from.
pub async fn method_metadata(
    Path((host, service, method)): Path<(String, String, String)>,
) -> Result<Json<MethodSchema>, ApiError> {
    debug!(%host, %service, %method, "method schema requested");

    let channel = connect::connect(&host).await?;
    let detail = schema::method_schema(channel, &service, &method).await?;

    Ok(Json(detail))
}
