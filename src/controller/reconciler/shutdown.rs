//! # Shutdown Signal
//!
//! Cancellation handed to every pass. Each collaborator call races the
//! signal, so a pass aborts at the next call boundary and leaves state as of
//! the last successful write.

use super::ReconcileError;
use std::future::Future;
use tokio::sync::watch;

/// Receiving side, cheap to clone into every pass
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

/// Sending side, held by whoever decides to stop the controller
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signal every pass (current and future) to stop
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl ShutdownSignal {
    /// Linked trigger and signal
    pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
        let (sender, receiver) = watch::channel(false);
        (ShutdownTrigger { sender }, ShutdownSignal { receiver })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown has been triggered
    pub async fn wait(&self) {
        let mut receiver = self.receiver.clone();
        let closed = receiver.wait_for(|stop| *stop).await.is_err();
        if closed {
            // trigger dropped without firing
            std::future::pending::<()>().await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::never()
    }
}

/// Run `fut` unless shutdown fires first
pub(crate) async fn cancellable<F: Future>(
    shutdown: &ShutdownSignal,
    fut: F,
) -> Result<F::Output, ReconcileError> {
    tokio::select! {
        biased;
        () = shutdown.wait() => Err(ReconcileError::Cancelled),
        output = fut => Ok(output),
    }
}
