//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscribed receiver wakes
//!     → Acceptor abandons accept or drain with ServerError::Cancelled
//! ```
//!
//! # Design Decisions
//! - Cancellation is a broadcast, so any phase can observe it
//! - A dropped coordinator never cancels; only an explicit trigger does

pub mod shutdown;
pub mod signals;

pub use shutdown::{cancelled, Shutdown};
