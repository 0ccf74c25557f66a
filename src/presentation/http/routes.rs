use super::{
    handlers::{decode, health},
    middleware::{logging::logging_middleware, request_id::request_id_middleware},
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // QR relay
        .route("/decode_qrcode/", post(decode::decode_qrcode))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
