//! Listening endpoint: socket creation, bind, listen, single accept.
//!
//! # Responsibilities
//! - Create an IPv4 stream socket
//! - Bind it to the configured address and port
//! - Listen with the configured backlog
//! - Hand the listening handle to the runtime in non-blocking mode
//! - Accept exactly one connection, then release the listening handle
//!
//! Each step is its own type (`BoundSocket` → `ListenEndpoint` →
//! `ClientConnection`), so the steps cannot be reordered or repeated.

use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ListenerConfig;
use crate::error::{ServerError, ServerResult};
use crate::lifecycle::cancelled;
use crate::net::connection::ClientConnection;
use crate::resilience::timeouts::with_deadline;

/// A socket bound to its address but not yet listening.
#[derive(Debug)]
pub struct BoundSocket {
    socket: Socket,
    addr: SocketAddr,
}

impl BoundSocket {
    /// Create an IPv4 TCP socket and bind it to the configured address.
    pub fn bind(config: &ListenerConfig) -> ServerResult<Self> {
        let addr = SocketAddr::V4(SocketAddrV4::new(config.bind_address, config.port));

        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(ServerError::SocketCreate)?;

        // Lets a restart rebind while the previous connection sits in TIME_WAIT.
        // A second live listener on the same port is still refused.
        socket
            .set_reuse_address(true)
            .map_err(ServerError::SocketCreate)?;

        socket
            .bind(&addr.into())
            .map_err(|source| ServerError::Bind { addr, source })?;

        // Port 0 resolves to the ephemeral port the kernel picked
        let addr = socket
            .local_addr()
            .ok()
            .and_then(|a| a.as_socket())
            .unwrap_or(addr);

        tracing::debug!(address = %addr, "Socket bound");
        Ok(Self { socket, addr })
    }

    /// Start listening and register the handle with the runtime.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn listen(self, backlog: u32) -> ServerResult<ListenEndpoint> {
        let raw_backlog = i32::try_from(backlog).unwrap_or(i32::MAX);
        self.socket
            .listen(raw_backlog)
            .map_err(|source| ServerError::Listen { backlog, source })?;

        self.socket
            .set_nonblocking(true)
            .map_err(ServerError::NonBlockingConfig)?;

        let std_listener: std::net::TcpListener = self.socket.into();
        let inner = TcpListener::from_std(std_listener).map_err(ServerError::NonBlockingConfig)?;

        tracing::info!(address = %self.addr, backlog, "Listening");
        Ok(ListenEndpoint {
            inner,
            addr: self.addr,
            backlog,
        })
    }
}

/// A bound, passive socket ready to accept its one connection.
#[derive(Debug)]
pub struct ListenEndpoint {
    inner: TcpListener,
    addr: SocketAddr,
    backlog: u32,
}

impl ListenEndpoint {
    /// Create, bind and listen in one step.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &ListenerConfig) -> ServerResult<Self> {
        BoundSocket::bind(config)?.listen(config.backlog)
    }

    /// Address the endpoint is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Configured backlog depth.
    pub fn backlog(&self) -> u32 {
        self.backlog
    }

    /// Wait for one client and return its connection.
    ///
    /// Consumes the endpoint: the listening handle is closed as soon as the
    /// client is accepted, so later peers are refused by the OS.
    pub async fn accept_one(
        self,
        deadline: Option<Duration>,
        buffer_capacity: usize,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ServerResult<ClientConnection> {
        let accepted = tokio::select! {
            biased;
            _ = cancelled(shutdown) => return Err(ServerError::Cancelled),
            accepted = with_deadline(deadline, self.inner.accept()) => accepted,
        };

        let (stream, peer_addr) = match accepted {
            Some(result) => result.map_err(ServerError::Accept)?,
            None => return Err(ServerError::AcceptTimeout(deadline.unwrap_or_default())),
        };

        Ok(ClientConnection::new(stream, peer_addr, buffer_capacity))
    }
}
