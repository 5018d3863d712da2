//! Cooperative cancellation for decode calls
//!
//! A [`CancellationToken`] is shared between the caller and the decoder. The
//! decoder checks it at element boundaries and byte intervals; it never blocks on
//! it. Child tokens observe their parent, so cancelling the caller's token stops a
//! fan-out scope while cancelling the scope leaves the caller's token untouched.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Why a token was cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// Plain cancellation requested by the caller
    Cancelled,
    /// Aborted with a caller supplied reason
    Aborted(String),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context canceled"),
            CancelReason::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    reason: Mutex<Option<CancelReason>>,
    parent: Option<CancellationToken>,
}

/// A cloneable, thread-safe cancellation flag
///
/// # Example
///
/// ```
/// use lib3mf_stream::{CancelReason, CancellationToken};
///
/// let token = CancellationToken::new();
/// let scope = token.child_token();
/// token.cancel();
/// assert!(scope.is_cancelled());
/// assert_eq!(scope.reason(), Some(CancelReason::Cancelled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that is cancelled when either it or `self` is cancelled
    pub fn child_token(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                ..Inner::default()
            }),
        }
    }

    /// Cancel with [`CancelReason::Cancelled`]
    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Cancelled);
    }

    /// Cancel with the given reason; the first reason set wins
    pub fn cancel_with(&self, reason: CancelReason) {
        let mut slot = self.inner.reason.lock();
        if slot.is_none() {
            *slot = Some(reason);
        }
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once this token or any ancestor is cancelled
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }

    /// The reason of the nearest cancelled token, starting from this one
    pub fn reason(&self) -> Option<CancelReason> {
        if self.inner.cancelled.load(Ordering::Acquire)
            && let Some(reason) = self.inner.reason.lock().clone()
        {
            return Some(reason);
        }
        self.inner.parent.as_ref().and_then(CancellationToken::reason)
    }
}
