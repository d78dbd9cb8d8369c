pub mod api;
pub mod auth;
pub mod broadcast;
pub mod chat;
pub mod config;
pub mod connections;
pub mod content;
pub mod engine;
pub mod error;
pub mod feed;
pub mod ids;
pub mod presence;
pub mod protocol;
pub mod seed;
pub mod telemetry;
pub mod ws;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;

use crate::engine::Engine;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// The full HTTP surface: the event socket plus the JSON endpoints.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws))
        .merge(api::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::Error::msg(message.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, error = %self.error, "request failed");
        (self.status, self.error.to_string()).into_response()
    }
}
