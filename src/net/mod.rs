//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listener.rs  BoundSocket::bind     socket(2) + bind(2)
//!           →  BoundSocket::listen   listen(2), non-blocking, register with runtime
//!           →  ListenEndpoint::accept_one   one client, listening handle released
//! connection.rs ClientConnection::drain     read → sink until end-of-stream
//!
//! State (state.rs):
//!     Created → Bound → Listening → Accepted → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - Exactly one connection per endpoint; no accept loop
//! - Reads are readiness-driven, never a spin on a non-blocking socket
//! - One read buffer per connection, reused for every read

pub mod buffer;
pub mod connection;
pub mod listener;
pub mod state;

pub use buffer::ReadBuffer;
pub use connection::{ClientConnection, ConnectionId, DrainSummary};
pub use listener::{BoundSocket, ListenEndpoint};
pub use state::{AcceptorState, InvalidTransition, StateTracker};
