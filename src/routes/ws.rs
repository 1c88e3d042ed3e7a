//! WebSocket handler — the session synchronization protocol.
//!
//! DESIGN
//! ======
//! Each upgraded socket gets a fresh client ID and a `select!` loop over
//! two sources:
//! - Incoming client messages → parse + dispatch by event tag
//! - Events fanned out by session peers → forward to client
//!
//! `process_inbound_text` owns the protocol logic: it mutates state through
//! the session service and returns the events owed to the sender (the join
//! snapshot, error reports). Peer delivery happens inside the service, under
//! the same guard that commits the mutation. Keeping socket I/O out of the
//! dispatch path lets tests drive the protocol without a live connection.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → fresh `client_id`, per-connection event channel
//! 2. Client sends `join-session` → unicast `load-canvas` snapshot
//!    (a re-join leaves the old session and drops its queued events first)
//! 3. `draw`/`clear` → commit + fan-out to the session's other members
//! 4. Close → membership cleanup; the session log stays put

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{ClientMessage, ServerEvent};
use crate::services;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for events fanned out by session peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(256);

    info!(%client_id, "ws: client connected");

    // The session this client has joined, if any.
    let mut current_session: Option<Uuid> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        dispatch_message(
                            &state,
                            &mut socket,
                            &mut current_session,
                            client_id,
                            &client_tx,
                            &mut client_rx,
                            &text,
                        )
                        .await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(session_id) = current_session {
        services::session::leave_session(&state, session_id, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// MESSAGE DISPATCH
// =============================================================================

/// Parse an incoming message, dispatch it, and write the sender's events.
async fn dispatch_message(
    state: &AppState,
    socket: &mut WebSocket,
    current_session: &mut Option<Uuid>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    client_rx: &mut mpsc::Receiver<ServerEvent>,
    text: &str,
) {
    let sender_events =
        process_inbound_text(state, current_session, client_id, client_tx, client_rx, text).await;
    for event in sender_events {
        let _ = send_event(socket, &event).await;
    }
}

/// Process one inbound text message and return the events for the sender.
///
/// A message that fails to parse is answered with an `error` event and
/// changes nothing; the connection stays usable.
async fn process_inbound_text(
    state: &AppState,
    current_session: &mut Option<Uuid>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    client_rx: &mut mpsc::Receiver<ServerEvent>,
    text: &str,
) -> Vec<ServerEvent> {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound message");
            return vec![ServerEvent::Error { message: format!("invalid message: {e}") }];
        }
    };

    match msg {
        ClientMessage::JoinSession { session_id } => {
            handle_join(state, current_session, client_id, client_tx, client_rx, session_id).await
        }
        ClientMessage::Draw { session_id, operation } => {
            // A reference to a session that was never created is dropped;
            // stale clients must not take the connection down.
            if let Err(e) =
                services::session::append_operation(state, session_id, client_id, operation).await
            {
                debug!(%client_id, error = %e, "ws: draw dropped");
            }
            vec![]
        }
        ClientMessage::Clear { session_id } => {
            if let Err(e) = services::session::clear_operations(state, session_id, client_id).await {
                debug!(%client_id, error = %e, "ws: clear dropped");
            }
            vec![]
        }
    }
}

/// Join a session: register membership and reply with the full history.
///
/// A connection tracks one session, so joining leaves the previous one
/// first and discards anything that session already queued — a stale event
/// must never trail the fresh snapshot onto the new canvas. An unknown
/// session ID gets an empty canvas and no membership.
async fn handle_join(
    state: &AppState,
    current_session: &mut Option<Uuid>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    client_rx: &mut mpsc::Receiver<ServerEvent>,
    session_id: Uuid,
) -> Vec<ServerEvent> {
    if let Some(old_session) = current_session.take() {
        services::session::leave_session(state, old_session, client_id).await;
    }

    // Fan-out runs under the same lock that just removed the membership, so
    // nothing lands on the queue past this point; whatever is left came from
    // the departed session and is superseded by the snapshot below.
    while client_rx.try_recv().is_ok() {}

    match services::session::join_session(state, session_id, client_id, client_tx.clone()).await {
        Ok(operations) => {
            *current_session = Some(session_id);
            vec![ServerEvent::LoadCanvas { operations }]
        }
        Err(e) => {
            warn!(%client_id, error = %e, "ws: join for unknown session");
            vec![ServerEvent::LoadCanvas { operations: Vec::new() }]
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
