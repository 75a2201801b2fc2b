//! Selection errors.

use thiserror::Error;

/// Why a [`CallContext`](crate::context::CallContext) stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Errors returned by endpoint selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// No directory has been published yet.
    #[error("cluster is not initialized")]
    UninitializedDirectory,

    /// Both the preferred and the fallback sets are empty.
    #[error("no endpoints available")]
    NoEndpointsAvailable,

    /// The call context was already invalid on entry.
    #[error("selection aborted: {0}")]
    CancelledOrExpired(CancelReason),
}
