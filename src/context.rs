//! Cooperative cancellation and deadlines for dispatch calls.
//!
//! Every dispatch takes a [`CallContext`]. The dispatcher stops waiting as
//! soon as the context fires and surfaces the cancellation cause; it cannot
//! interrupt an already in-flight socket read other than by abandoning it.

use std::fmt;
use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Why a [`CallContext`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller invoked [`CancelHandle::cancel`].
    Canceled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "context canceled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Fires the paired [`CallContext`].
///
/// Cancellation is sticky: once fired, every clone of the context observes
/// it. Dropping the handle without calling [`cancel`](Self::cancel) leaves
/// the context permanently un-cancelable (deadlines still apply).
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels the paired context.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cancellation/deadline carrier for a dispatch call.
///
/// ## Examples
///
/// ```rust
/// use std::time::Duration;
/// use chat_api::CallContext;
///
/// // Never cancels; use when no caller-side deadline exists.
/// let ctx = CallContext::background();
/// assert!(ctx.error().is_none());
///
/// // Cancels after two seconds, or earlier via the handle.
/// let (ctx, handle) = CallContext::with_timeout(Duration::from_secs(2));
/// handle.cancel();
/// assert!(ctx.error().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    canceled: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that never cancels and has no deadline.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self {
            canceled: rx,
            deadline: None,
        }
    }

    /// A context with no deadline, canceled through the returned handle.
    pub fn cancelable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                canceled: rx,
                deadline: None,
            },
            CancelHandle { tx },
        )
    }

    /// A context that fires once `timeout` has elapsed, or earlier through
    /// the returned handle.
    pub fn with_timeout(timeout: Duration) -> (Self, CancelHandle) {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that fires at `deadline`, or earlier through the returned
    /// handle.
    pub fn with_deadline(deadline: Instant) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                canceled: rx,
                deadline: Some(deadline),
            },
            CancelHandle { tx },
        )
    }

    /// Resolves once the context fires, with the cause.
    ///
    /// Pends forever on a context that can no longer fire.
    pub async fn done(&self) -> CancelReason {
        let mut canceled = self.canceled.clone();
        let cancel_signal = async move {
            loop {
                if *canceled.borrow_and_update() {
                    return;
                }
                if canceled.changed().await.is_err() {
                    // Handle dropped without firing; only a deadline can end
                    // this context now.
                    pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = cancel_signal => CancelReason::Canceled,
                    () = sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                cancel_signal.await;
                CancelReason::Canceled
            }
        }
    }

    /// Non-blocking check: the cause if the context has already fired.
    pub fn error(&self) -> Option<CancelReason> {
        if *self.canceled.borrow() {
            return Some(CancelReason::Canceled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(CancelReason::DeadlineExceeded);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn background_never_fires() {
        let ctx = CallContext::background();
        assert!(ctx.error().is_none());

        tokio::select! {
            reason = ctx.done() => panic!("background context fired: {reason}"),
            () = sleep(Duration::from_millis(20)) => {}
        }
    }

    #[tokio::test]
    async fn cancel_handle_fires_done() {
        let (ctx, handle) = CallContext::cancelable();
        handle.cancel();

        assert_eq!(ctx.done().await, CancelReason::Canceled);
        assert_eq!(ctx.error(), Some(CancelReason::Canceled));
    }

    #[tokio::test]
    async fn cancellation_is_visible_to_clones() {
        let (ctx, handle) = CallContext::cancelable();
        let clone = ctx.clone();
        handle.cancel();
        assert_eq!(clone.done().await, CancelReason::Canceled);
    }

    #[tokio::test]
    async fn deadline_expiry_reports_deadline_exceeded() {
        let (ctx, _handle) = CallContext::with_timeout(Duration::from_millis(10));
        assert_eq!(ctx.done().await, CancelReason::DeadlineExceeded);
        assert_eq!(ctx.error(), Some(CancelReason::DeadlineExceeded));
    }

    #[tokio::test]
    async fn explicit_cancel_beats_later_deadline() {
        let (ctx, handle) = CallContext::with_timeout(Duration::from_secs(30));
        handle.cancel();
        assert_eq!(ctx.done().await, CancelReason::Canceled);
    }

    #[tokio::test]
    async fn dropped_handle_cannot_cancel() {
        let (ctx, handle) = CallContext::cancelable();
        drop(handle);
        assert!(ctx.error().is_none());

        tokio::select! {
            reason = ctx.done() => panic!("orphaned context fired: {reason}"),
            () = sleep(Duration::from_millis(20)) => {}
        }
    }
}
