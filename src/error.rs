//! Error taxonomy for the acceptor.
//!
//! Every variant is fatal at the point it occurs. Nothing is recovered
//! except `AddrInUse` bind failures when bind retries are enabled.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while binding, accepting or draining.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created.
    #[error("could not create socket: {0}")]
    SocketCreate(#[source] std::io::Error),

    /// Binding to the address failed (in use, insufficient privileges).
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `listen(2)` failed on the bound socket.
    #[error("could not listen with backlog {backlog}: {source}")]
    Listen {
        backlog: u32,
        #[source]
        source: std::io::Error,
    },

    /// Switching a handle to non-blocking mode or registering it with the runtime failed.
    #[error("could not make socket non-blocking: {0}")]
    NonBlockingConfig(#[source] std::io::Error),

    /// Accepting the client failed.
    #[error("could not accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// No client connected before the accept deadline.
    #[error("no client connected within {0:?}")]
    AcceptTimeout(Duration),

    /// Reading from the client failed.
    #[error("read from {peer} failed: {source}")]
    Read {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The client sent nothing before the idle deadline.
    #[error("{peer} sent nothing for {timeout:?}")]
    ReadTimeout { peer: SocketAddr, timeout: Duration },

    /// Forwarding bytes to the output sink failed.
    #[error("could not write to output: {0}")]
    Sink(#[source] std::io::Error),

    /// Shutdown was requested before the connection closed.
    #[error("shutdown requested")]
    Cancelled,
}

impl ServerError {
    /// Whether this error came from a shutdown request rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServerError::Cancelled)
    }

    /// Whether the bind failed because the address is already taken.
    pub fn is_addr_in_use(&self) -> bool {
        matches!(
            self,
            ServerError::Bind { source, .. } if source.kind() == std::io::ErrorKind::AddrInUse
        )
    }
}

/// Result type for acceptor operations.
pub type ServerResult<T> = Result<T, ServerError>;
