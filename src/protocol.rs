//! Wire protocol — operations and message envelopes for `InkSync`.
//!
//! ARCHITECTURE
//! ============
//! Every websocket exchange is a JSON text frame tagged by `event`. Clients
//! send [`ClientMessage`] values, the server dispatches on the tag, and
//! everything flowing back is a [`ServerEvent`]. Drawing payloads are
//! self-contained [`Operation`] values tagged by `tool` — the server never
//! interprets coordinates or path data, it only stores and relays them.
//!
//! DESIGN
//! ======
//! - Field names are `camelCase` on the wire (`sessionId`, `strokeWidth`),
//!   matching what canvas clients produce.
//! - Unknown extra fields are ignored; a missing field or unknown tag is a
//!   malformed message and is rejected at the protocol boundary.
//! - `Operation` is immutable once committed: session logs only append it
//!   or drop it wholesale on clear.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// OPERATIONS
// =============================================================================

/// One completed drawing action with its visual attributes.
///
/// Partial strokes never cross the wire: clients send an operation only
/// once the gesture is finished, so replaying a log always reproduces the
/// canvas exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Freehand path. `d` is an SVG-style path string (`M x y` then `L x y`
    /// segments) treated as opaque text.
    Pencil { d: String, stroke: String, stroke_width: f64 },
    /// Same payload as pencil; clients render it in the background color.
    Eraser { d: String, stroke: String, stroke_width: f64 },
    /// Outlined rectangle with corner radii fixed by the client.
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
        stroke: String,
        stroke_width: f64,
    },
    /// Ellipse described by its bounding box; `rx`/`ry` are the radii the
    /// client derived from it.
    Circle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
        stroke: String,
        stroke_width: f64,
    },
    /// Text label anchored at `x`/`y`.
    Text { x: f64, y: f64, text: String, color: String },
}

// =============================================================================
// CLIENT MESSAGES
// =============================================================================

/// Inbound messages, tagged by `event`.
///
/// `draw` and `clear` address the session named in the payload; the server
/// does not require the sender to be a member of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter a session and request its history. Implicitly leaves the
    /// session joined before, if any.
    JoinSession { session_id: Uuid },
    /// Append one operation and relay it to the session's other members.
    Draw { session_id: Uuid, operation: Operation },
    /// Drop the session's whole log and tell the other members.
    Clear { session_id: Uuid },
}

// =============================================================================
// SERVER EVENTS
// =============================================================================

/// Outbound events, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full history replacement, unicast to a client right after join.
    /// Operations are in commit order.
    LoadCanvas { operations: Vec<Operation> },
    /// One operation committed by another member.
    Draw { operation: Operation },
    /// The session log was emptied by another member.
    Clear,
    /// The last inbound message was rejected. The connection stays open.
    Error { message: String },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pencil_wire_shape_is_camel_case() {
        let op = Operation::Pencil {
            d: "M 0 0 L 10 10".into(),
            stroke: "#FF0000".into(),
            stroke_width: 2.0,
        };

        let value = serde_json::to_value(&op).expect("serialize");
        assert_eq!(
            value,
            json!({
                "tool": "pencil",
                "d": "M 0 0 L 10 10",
                "stroke": "#FF0000",
                "strokeWidth": 2.0
            })
        );

        let restored: Operation = serde_json::from_value(value).expect("deserialize");
        assert_eq!(restored, op);
    }

    #[test]
    fn eraser_shares_the_pencil_payload() {
        let json = r##"{"tool":"eraser","d":"M 4 4 L 8 8","stroke":"#FFFFFF","strokeWidth":24}"##;
        let op: Operation = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            op,
            Operation::Eraser { d: "M 4 4 L 8 8".into(), stroke: "#FFFFFF".into(), stroke_width: 24.0 }
        );
    }

    #[test]
    fn rectangle_and_circle_round_trip() {
        let rect = Operation::Rectangle {
            x: 5.0,
            y: 5.0,
            width: 20.0,
            height: 20.0,
            rx: 10.0,
            ry: 10.0,
            stroke: "#00FF00".into(),
            stroke_width: 3.0,
        };
        let circle = Operation::Circle {
            x: 40.0,
            y: 40.0,
            width: 30.0,
            height: 18.0,
            rx: 15.0,
            ry: 9.0,
            stroke: "#0000FF".into(),
            stroke_width: 1.0,
        };

        for op in [rect, circle] {
            let json = serde_json::to_string(&op).expect("serialize");
            assert!(json.contains("strokeWidth"), "wire field must be camelCase: {json}");
            let restored: Operation = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(restored, op);
        }
    }

    #[test]
    fn text_operation_round_trip() {
        let op = Operation::Text { x: 12.5, y: 30.0, text: "hello".into(), color: "#000000".into() };
        let value = serde_json::to_value(&op).expect("serialize");
        assert_eq!(
            value,
            json!({"tool": "text", "x": 12.5, "y": 30.0, "text": "hello", "color": "#000000"})
        );
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let json = r#"{"tool":"spraycan","x":1.0,"y":2.0}"#;
        assert!(serde_json::from_str::<Operation>(json).is_err());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let json = r##"{"tool":"pencil","d":"M 0 0","stroke":"#111111","strokeWidth":2.0,"opacity":0.5}"##;
        let op: Operation = serde_json::from_str(json).expect("extra fields should not reject");
        assert!(matches!(op, Operation::Pencil { .. }));
    }

    #[test]
    fn client_message_tags_are_kebab_case() {
        let session_id = Uuid::new_v4();

        let join = json!({"event": "join-session", "sessionId": session_id}).to_string();
        let msg: ClientMessage = serde_json::from_str(&join).expect("deserialize join");
        assert_eq!(msg, ClientMessage::JoinSession { session_id });

        let draw = json!({
            "event": "draw",
            "sessionId": session_id,
            "operation": {"tool": "pencil", "d": "M 1 1 L 2 2", "stroke": "#222222", "strokeWidth": 4.0}
        })
        .to_string();
        let msg: ClientMessage = serde_json::from_str(&draw).expect("deserialize draw");
        let ClientMessage::Draw { session_id: sid, operation } = msg else {
            panic!("expected draw message");
        };
        assert_eq!(sid, session_id);
        assert!(matches!(operation, Operation::Pencil { .. }));

        let clear = json!({"event": "clear", "sessionId": session_id}).to_string();
        let msg: ClientMessage = serde_json::from_str(&clear).expect("deserialize clear");
        assert_eq!(msg, ClientMessage::Clear { session_id });
    }

    #[test]
    fn missing_session_id_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"join-session"}"#).is_err());
    }

    #[test]
    fn unknown_event_tag_is_rejected() {
        let json = r#"{"event":"warp-session","sessionId":"00000000-0000-0000-0000-000000000000"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn server_clear_serializes_as_bare_tag() {
        let value = serde_json::to_value(&ServerEvent::Clear).expect("serialize");
        assert_eq!(value, json!({"event": "clear"}));
    }

    #[test]
    fn load_canvas_preserves_operation_order() {
        let first = Operation::Pencil { d: "M 0 0 L 1 1".into(), stroke: "#333333".into(), stroke_width: 2.0 };
        let second = Operation::Text { x: 9.0, y: 9.0, text: "b".into(), color: "#444444".into() };

        let event = ServerEvent::LoadCanvas { operations: vec![first.clone(), second.clone()] };
        let json = serde_json::to_string(&event).expect("serialize");
        let restored: ServerEvent = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored, ServerEvent::LoadCanvas { operations: vec![first, second] });
    }
}
