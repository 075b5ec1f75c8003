//! Single-connection TCP acceptor library.
//!
//! Binds a listening endpoint, accepts exactly one client, and forwards the
//! client's bytes to a sink until the client closes.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use lifecycle::Shutdown;
pub use net::{AcceptorState, DrainSummary};
pub use server::Acceptor;
