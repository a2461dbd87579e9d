use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::{
    handlers::{handle_missing_token, handle_preflight, handle_stream},
    state::AppState,
};
use crate::Error;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/stream/{token}",
            get(handle_stream).options(handle_preflight),
        )
        .route("/stream", get(handle_missing_token))
        .route("/stream/", get(handle_missing_token))
        .route("/health", get(health_check))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Turn a handler panic into the generic 500 without leaking the message.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    Error::Internal(format!("handler panicked: {detail}")).into_response()
}
