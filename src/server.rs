//! Single-connection acceptor.
//!
//! # Responsibilities
//! - Bind the listening endpoint (with optional bind retry)
//! - Accept exactly one client, within the optional accept deadline
//! - Drain the client into the output sink
//! - Publish every state transition for observers
//! - Abandon any phase when shutdown is triggered

use tokio::io::AsyncWrite;
use tokio::sync::{broadcast, watch};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::net::{AcceptorState, BoundSocket, ClientConnection, DrainSummary, ListenEndpoint, StateTracker};
use crate::resilience::retries::retry_bind;

/// Accepts one connection and forwards its bytes to a sink.
pub struct Acceptor {
    config: ServerConfig,
    state: StateTracker,
    shutdown: broadcast::Receiver<()>,
}

impl Acceptor {
    /// Create an acceptor with the given configuration.
    ///
    /// `shutdown` cancels whichever phase is running when it fires.
    pub fn new(config: ServerConfig, shutdown: broadcast::Receiver<()>) -> Self {
        Self {
            config,
            state: StateTracker::new(),
            shutdown,
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<AcceptorState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> AcceptorState {
        self.state.current()
    }

    /// Run the whole pass: bind, accept one client, drain it into `sink`.
    pub async fn run<W>(&mut self, sink: &mut W) -> ServerResult<DrainSummary>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let endpoint = self.bind().await?;
        let connection = self.accept_one(endpoint).await?;
        self.drain(connection, sink).await
    }

    /// Create, bind and listen.
    ///
    /// Shutdown interrupts the wait between bind retries.
    pub async fn bind(&mut self) -> ServerResult<ListenEndpoint> {
        let listener = &self.config.listener;

        let bound = retry_bind(&self.config.retries, &mut self.shutdown, || {
            BoundSocket::bind(listener)
        })
        .await;
        let bound = self.check(bound)?;
        self.transition(AcceptorState::Bound);

        let endpoint = self.check(bound.listen(listener.backlog))?;
        self.transition(AcceptorState::Listening);
        Ok(endpoint)
    }

    /// Wait for the single client.
    pub async fn accept_one(&mut self, endpoint: ListenEndpoint) -> ServerResult<ClientConnection> {
        let connection = &self.config.connection;
        let accepted = endpoint
            .accept_one(
                connection.accept_timeout(),
                connection.buffer_capacity,
                &mut self.shutdown,
            )
            .await;

        let client = self.check(accepted)?;
        self.transition(AcceptorState::Accepted);
        Ok(client)
    }

    /// Forward the client's bytes to `sink` until it closes.
    pub async fn drain<W>(
        &mut self,
        connection: ClientConnection,
        sink: &mut W,
    ) -> ServerResult<DrainSummary>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.transition(AcceptorState::Draining);

        let idle_timeout = self.config.connection.idle_timeout();
        let drained = connection.drain(sink, idle_timeout, &mut self.shutdown).await;

        let summary = self.check(drained)?;
        self.transition(AcceptorState::Closed);
        Ok(summary)
    }

    /// Record a terminal state for a failed step.
    fn check<T>(&self, result: ServerResult<T>) -> ServerResult<T> {
        if let Err(e) = &result {
            if e.is_cancelled() {
                self.transition(AcceptorState::Cancelled);
            } else {
                self.transition(AcceptorState::Failed);
            }
        }
        result
    }

    fn transition(&self, next: AcceptorState) {
        if let Err(e) = self.state.advance(next) {
            tracing::warn!(error = %e, "Ignoring state transition");
        }
    }
}
