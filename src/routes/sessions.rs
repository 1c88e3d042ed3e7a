//! Session creation route.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::services::session;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// `POST /create-session` — register a fresh session and hand back its ID.
///
/// The session starts empty and unoccupied; clients join it over the
/// websocket endpoint afterwards.
pub async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session_id = session::create_session(&state).await;
    Json(CreateSessionResponse { session_id })
}
