//! Acceptor state machine.
//!
//! ```text
//! Created → Bound → Listening → Accepted → Draining → Closed
//!    └────────┴─────────┴──────────┴──────────┴──→ Failed | Cancelled
//! ```
//!
//! Transitions only move forward. `Closed`, `Failed` and `Cancelled` are terminal.

use thiserror::Error;
use tokio::sync::watch;

/// Where the acceptor is in its single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptorState {
    /// Nothing has been done yet.
    Created,
    /// The socket exists and is bound to its address.
    Bound,
    /// `listen(2)` succeeded; waiting for a client.
    Listening,
    /// One client has been accepted; the listening handle is released.
    Accepted,
    /// Reading from the client and forwarding to the sink.
    Draining,
    /// The client closed its side; the connection is released.
    Closed,
    /// A fatal error stopped the acceptor.
    Failed,
    /// Shutdown was requested before the connection closed.
    Cancelled,
}

impl AcceptorState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AcceptorState::Closed | AcceptorState::Failed | AcceptorState::Cancelled
        )
    }

    fn successor(self) -> Option<AcceptorState> {
        match self {
            AcceptorState::Created => Some(AcceptorState::Bound),
            AcceptorState::Bound => Some(AcceptorState::Listening),
            AcceptorState::Listening => Some(AcceptorState::Accepted),
            AcceptorState::Accepted => Some(AcceptorState::Draining),
            AcceptorState::Draining => Some(AcceptorState::Closed),
            _ => None,
        }
    }

    /// Whether `next` is a legal transition from this state.
    pub fn can_advance_to(self, next: AcceptorState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            AcceptorState::Failed | AcceptorState::Cancelled => true,
            _ => self.successor() == Some(next),
        }
    }
}

impl std::fmt::Display for AcceptorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AcceptorState::Created => "created",
            AcceptorState::Bound => "bound",
            AcceptorState::Listening => "listening",
            AcceptorState::Accepted => "accepted",
            AcceptorState::Draining => "draining",
            AcceptorState::Closed => "closed",
            AcceptorState::Failed => "failed",
            AcceptorState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Rejected out-of-order transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: AcceptorState,
    pub to: AcceptorState,
}

/// Publishes the acceptor's state over a watch channel.
#[derive(Debug)]
pub struct StateTracker {
    tx: watch::Sender<AcceptorState>,
}

impl StateTracker {
    /// Start in [`AcceptorState::Created`].
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AcceptorState::Created);
        Self { tx }
    }

    /// Current state.
    pub fn current(&self) -> AcceptorState {
        *self.tx.borrow()
    }

    /// Receiver that observes every later transition.
    pub fn subscribe(&self) -> watch::Receiver<AcceptorState> {
        self.tx.subscribe()
    }

    /// Move to `next` if the transition is legal.
    pub fn advance(&self, next: AcceptorState) -> Result<(), InvalidTransition> {
        let from = self.current();
        if !from.can_advance_to(next) {
            return Err(InvalidTransition { from, to: next });
        }
        self.tx.send_replace(next);
        tracing::debug!(from = %from, to = %next, "Acceptor state changed");
        Ok(())
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
