use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub const LIVENESS_MESSAGE: &str = "Hi darling, from the import service!";

pub fn create_app() -> Router {
    Router::new()
        .route("/", get(liveness_handler))
        .layer(TraceLayer::new_for_http())
}

async fn liveness_handler() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({ "message": LIVENESS_MESSAGE })))
}
