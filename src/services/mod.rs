//! Service layer — the session engine behind the route handlers.
//!
//! ARCHITECTURE
//! ============
//! The session service owns log mutation and fan-out; route handlers only
//! translate between the wire protocol and service calls.

pub mod session;
