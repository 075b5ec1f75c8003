//! Accepted client connection and the drain loop.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Own the accepted stream and its read buffer
//! - Forward every received chunk to the sink until end-of-stream
//!
//! Reads wait for readiness through the runtime instead of polling the
//! socket in a loop, so an idle peer costs nothing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::error::{ServerError, ServerResult};
use crate::lifecycle::cancelled;
use crate::net::buffer::ReadBuffer;
use crate::resilience::timeouts::with_deadline;

/// Global atomic counter for connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate the next unique connection ID.
    pub(crate) fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What a finished drain observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub connection_id: ConnectionId,
    pub peer_addr: SocketAddr,
    /// Total bytes forwarded to the sink.
    pub bytes: u64,
    /// Number of non-empty reads.
    pub chunks: u64,
}

/// An accepted, non-blocking client connection.
///
/// Owned by the acceptor for its whole life. [`ClientConnection::drain`]
/// consumes it, so the stream cannot be touched after it is closed.
#[derive(Debug)]
pub struct ClientConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    stream: TcpStream,
    buffer: ReadBuffer,
}

impl ClientConnection {
    pub(crate) fn new(stream: TcpStream, peer_addr: SocketAddr, buffer_capacity: usize) -> Self {
        let id = ConnectionId::next();
        tracing::info!(connection_id = %id, peer_addr = %peer_addr, "Connection accepted");
        Self {
            id,
            peer_addr,
            stream,
            buffer: ReadBuffer::with_capacity(buffer_capacity),
        }
    }

    /// Identifier used on this connection's log span.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Address of the accepted client.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Read until the peer closes, forwarding each chunk to `sink` in order.
    ///
    /// Each read fills at most `capacity - 1` bytes and the sink is flushed
    /// after every chunk. `idle_timeout` bounds the wait for each read.
    pub async fn drain<W>(
        self,
        sink: &mut W,
        idle_timeout: Option<Duration>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ServerResult<DrainSummary>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let span = tracing::info_span!(
            "connection",
            connection_id = %self.id,
            peer_addr = %self.peer_addr
        );
        self.drain_inner(sink, idle_timeout, shutdown)
            .instrument(span)
            .await
    }

    async fn drain_inner<W>(
        self,
        sink: &mut W,
        idle_timeout: Option<Duration>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ServerResult<DrainSummary>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let ClientConnection {
            id,
            peer_addr,
            mut stream,
            mut buffer,
        } = self;

        let mut summary = DrainSummary {
            connection_id: id,
            peer_addr,
            bytes: 0,
            chunks: 0,
        };

        loop {
            let read = tokio::select! {
                biased;
                _ = cancelled(shutdown) => {
                    tracing::info!(bytes = summary.bytes, "Drain interrupted by shutdown");
                    return Err(ServerError::Cancelled);
                }
                read = with_deadline(idle_timeout, stream.read(buffer.prepare())) => read,
            };

            let n = match read {
                Some(Ok(0)) => break,
                Some(Ok(n)) => n,
                // The next read waits for readiness again
                Some(Err(e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Some(Err(source)) => {
                    return Err(ServerError::Read {
                        peer: peer_addr,
                        source,
                    })
                }
                None => {
                    return Err(ServerError::ReadTimeout {
                        peer: peer_addr,
                        timeout: idle_timeout.unwrap_or_default(),
                    })
                }
            };

            let chunk = buffer.filled(n);
            sink.write_all(chunk).await.map_err(ServerError::Sink)?;
            sink.flush().await.map_err(ServerError::Sink)?;

            summary.bytes += n as u64;
            summary.chunks += 1;
            tracing::trace!(chunk_bytes = n, total_bytes = summary.bytes, "Chunk forwarded");
        }

        tracing::info!(
            bytes = summary.bytes,
            chunks = summary.chunks,
            "Peer closed connection"
        );
        Ok(summary)
    }
}
