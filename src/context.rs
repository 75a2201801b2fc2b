//! Per-call context handed to selection.
//!
//! Carries the optional pinned node id together with the caller's
//! cancellation signal and deadline. Both are checked once, at entry of
//! [`Cluster::next`](crate::cluster::Cluster::next).

use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::cluster::CancelReason;

/// Source of cancellation for any number of [`CallContext`]s.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Create a context bound to this canceller.
    pub fn context(&self) -> CallContext {
        CallContext {
            cancel: Some(self.tx.subscribe()),
            ..CallContext::default()
        }
    }

    /// Cancel every context created from this canceller.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}

/// Context of a single outgoing call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    node_id: Option<u32>,
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Route the call to the node with the given id when it is known.
    pub fn with_node_id(mut self, node_id: u32) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn node_id(&self) -> Option<u32> {
        self.node_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is no longer valid, if it isn't.
    pub fn err(&self) -> Option<CancelReason> {
        if let Some(rx) = &self.cancel {
            if *rx.borrow() {
                return Some(CancelReason::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }
}
