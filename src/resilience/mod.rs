//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Bind:
//!     → retries.rs (retry AddrInUse with backoff, when enabled)
//!     → backoff.rs (exponential delay + jitter)
//!
//! Accept / read:
//!     → timeouts.rs (optional deadline around each wait)
//! ```
//!
//! # Design Decisions
//! - Deadlines are optional; without one a wait lasts until readiness or shutdown
//! - Only bind is ever retried, and only for AddrInUse
//! - Jittered backoff keeps restarted instances from colliding

pub mod backoff;
pub mod retries;
pub mod timeouts;
