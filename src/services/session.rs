//! Session service — lifecycle, membership, and operation fan-out.
//!
//! DESIGN
//! ======
//! Sessions are created over REST before any client connects, then driven
//! entirely through the websocket protocol. All state is in memory: the
//! log survives the last disconnect and is gone on process exit.
//!
//! ORDERING
//! ========
//! Every mutation takes the write guard on the session map, and fan-out to
//! member queues happens inside that same critical section. Member queues
//! are FIFO, so the order clients observe operations is exactly the order
//! the log committed them. Join registers the member and snapshots the log
//! under the same guard: operations committed afterwards arrive through the
//! queue, never through the snapshot as well, and never get lost between
//! the two.

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::protocol::{Operation, ServerEvent};
use crate::state::{AppState, SessionState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(Uuid),
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create a new session with an empty log and no members.
///
/// Existence is checked implicitly from here on: every operation that takes
/// a session ID reports `NotFound` instead of exposing a separate lookup,
/// and the protocol boundary decides what to surface.
pub async fn create_session(state: &AppState) -> Uuid {
    let session_id = Uuid::new_v4();
    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id, SessionState::new());
    info!(%session_id, "session created");
    session_id
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Join a session. Registers the client's sender and returns the log as of
/// the join, in commit order. Joining again replaces the sender.
///
/// # Errors
///
/// Returns `NotFound` if the session was never created; nothing is
/// registered in that case.
pub async fn join_session(
    state: &AppState,
    session_id: Uuid,
    client_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
) -> Result<Vec<Operation>, SessionError> {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return Err(SessionError::NotFound(session_id));
    };

    session.clients.insert(client_id, tx);
    let ops = session.ops.clone();

    info!(%session_id, %client_id, clients = session.clients.len(), "client joined session");
    Ok(ops)
}

/// Leave a session. Removes the client from the routing table only; the
/// log stays available to future joiners.
pub async fn leave_session(state: &AppState, session_id: Uuid, client_id: Uuid) {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return;
    };

    session.clients.remove(&client_id);
    info!(%session_id, %client_id, remaining = session.clients.len(), "client left session");
}

// =============================================================================
// LOG OPERATIONS
// =============================================================================

/// Append one operation to the session log and queue it for every member
/// except the sender (who already applied it locally).
///
/// # Errors
///
/// Returns `NotFound` for a session that was never created; the log is
/// untouched.
pub async fn append_operation(
    state: &AppState,
    session_id: Uuid,
    sender: Uuid,
    operation: Operation,
) -> Result<(), SessionError> {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return Err(SessionError::NotFound(session_id));
    };

    let event = ServerEvent::Draw { operation: operation.clone() };
    session.ops.push(operation);
    fan_out(session, &event, Some(sender));

    debug!(%session_id, %sender, ops = session.ops.len(), "operation appended");
    Ok(())
}

/// Empty the session log and queue a clear for every member except the
/// sender.
///
/// # Errors
///
/// Returns `NotFound` for a session that was never created.
pub async fn clear_operations(state: &AppState, session_id: Uuid, sender: Uuid) -> Result<(), SessionError> {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return Err(SessionError::NotFound(session_id));
    };

    session.ops.clear();
    fan_out(session, &ServerEvent::Clear, Some(sender));

    info!(%session_id, %sender, "session cleared");
    Ok(())
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Queue an event for every member, optionally excluding one.
///
/// Delivery is best-effort: a member whose queue is full misses the event
/// instead of stalling the session. Callers hold the session write guard,
/// so queue order equals commit order for everyone.
fn fan_out(session: &SessionState, event: &ServerEvent, exclude: Option<Uuid>) {
    for (client_id, tx) in &session.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        if tx.try_send(event.clone()).is_err() {
            debug!(%client_id, "fan-out skipped a full or closed client queue");
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
