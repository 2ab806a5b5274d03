use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

/// Builds the full route table of the backend.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/grpc/", get(handlers::grpc_index))
        .route("/grpc/call", post(handlers::call))
        .route("/metadata/", get(handlers::metadata_index))
        .route("/metadata/{host}", get(handlers::list_metadata))
        .route(
            "/metadata/{host}/{service}/{method}",
            get(handlers::method_metadata),
        )
        .with_state(state)
}
