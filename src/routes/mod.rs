//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Three endpoints: session creation over REST, the realtime websocket
//! channel, and a liveness check. CORS is wide open — canvas clients are
//! served from arbitrary origins and the server carries no credentials.

pub mod sessions;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/create-session", post(sessions::create_session))
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
