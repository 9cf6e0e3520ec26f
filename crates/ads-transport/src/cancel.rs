//! Cooperative cancellation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Why a request was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user interrupted the command
    Interrupted,
    /// The overall command deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => f.write_str("interrupted"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// A cloneable cancellation signal.
///
/// Every clone observes the same state. The first reason recorded wins;
/// later calls to [`CancelToken::cancel`] are ignored.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<Option<CancelReason>>>,
    receiver: watch::Receiver<Option<CancelReason>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self, reason: CancelReason) {
        self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        *self.receiver.borrow()
    }

    /// Resolves once the token is cancelled, returning the reason.
    pub async fn cancelled(&self) -> CancelReason {
        let mut receiver = self.receiver.clone();
        loop {
            let current = *receiver.borrow_and_update();
            if let Some(reason) = current {
                return reason;
            }
            if receiver.changed().await.is_err() {
                // sender is held by self, so this is unreachable while we are alive
                std::future::pending::<()>().await;
            }
        }
    }

    /// Cancel with [`CancelReason::DeadlineExceeded`] once `timeout` elapses.
    ///
    /// Must be called inside a tokio runtime.
    pub fn cancel_after(&self, timeout: Duration) -> tokio::task::JoinHandle<()> {
        let token = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token.cancel(CancelReason::DeadlineExceeded);
        })
    }
}
