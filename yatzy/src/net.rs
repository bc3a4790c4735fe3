//! Wire types and the transport boundary.
//!
//! The core never touches sockets. Payloads are plain serde types framed in
//! a `{ code, data }` envelope, and delivery goes through the [`Transport`]
//! trait implemented by whichever shell hosts the tables.

/// Message types for client-server communication protocol.
pub mod messages;

/// Delivery and analytics collaborators invoked by table actors.
pub mod transport;

pub use transport::{EventRecord, Transport};
