//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events on stderr)
//!
//! stdout is reserved for the bytes received from the client.
//! ```
//!
//! # Design Decisions
//! - Structured logging via the tracing crate
//! - Connection ID and peer address travel on the connection span
//! - Log level from config, overridden by RUST_LOG

pub mod logging;

pub use logging::init_logging;
