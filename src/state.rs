//! Shared application state.
//!
//! DESIGN
//! ======
//! Every handler receives `AppState` through Axum's `State` extractor. It
//! holds the map of live sessions. Each session owns an append-only
//! operation log and the outbound channels of its connected clients; both
//! sit behind one `RwLock` so the lock order defines the per-session
//! commit order (see `services::session`).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::{Operation, ServerEvent};

// =============================================================================
// SESSION STATE
// =============================================================================

/// Per-session live state. Sessions are memory-only and live for the
/// process lifetime: the log stays put when the last client disconnects,
/// so late joiners still replay the full history.
pub struct SessionState {
    /// Committed operations in append order.
    pub ops: Vec<Operation>,
    /// Connected clients: `client_id` -> sender for outgoing events.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerEvent>>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self { ops: Vec::new(), clients: HashMap::new() }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Process-wide shared state handed to every handler. Cloning is cheap and
/// required by Axum; the session map itself is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionState>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Create a fresh, empty `AppState`.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new()
    }

    /// Seed an empty session into the app state and return its ID.
    pub async fn seed_session(state: &AppState) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id, SessionState::new());
        session_id
    }

    /// Seed a session with a pre-committed log and return the session ID.
    pub async fn seed_session_with_ops(state: &AppState, ops: Vec<Operation>) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut session = SessionState::new();
        session.ops = ops;
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id, session);
        session_id
    }

    /// A small freehand stroke for tests.
    #[must_use]
    pub fn pencil_op() -> Operation {
        Operation::Pencil { d: "M 0 0 L 10 10".into(), stroke: "#FF0000".into(), stroke_width: 2.0 }
    }

    /// A rectangle for tests, distinguishable from `pencil_op`.
    #[must_use]
    pub fn rectangle_op() -> Operation {
        Operation::Rectangle {
            x: 5.0,
            y: 5.0,
            width: 20.0,
            height: 20.0,
            rx: 10.0,
            ry: 10.0,
            stroke: "#00FF00".into(),
            stroke_width: 3.0,
        }
    }
}
